use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// credit scorer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub min_score: i32,
    pub max_score: i32,
    /// balance at or below this maps to the floor score
    pub lower_bound_balance: Decimal,
    /// balance at or above this maps to the ceiling score
    pub upper_bound_balance: Decimal,
    pub balance_step: Decimal,
    pub score_step: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 300,
            max_score: 900,
            lower_bound_balance: dec!(100000),
            upper_bound_balance: dec!(1000000),
            balance_step: dec!(15000),
            score_step: 10,
        }
    }
}

/// EMI schedule parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiConfig {
    /// first-month interest must exceed this, else the loan is rejected
    pub interest_floor: Money,
    /// EMI may not exceed this fraction of monthly income
    pub affordability_fraction: Decimal,
}

impl Default for EmiConfig {
    fn default() -> Self {
        Self {
            interest_floor: Money::from_major(50),
            affordability_fraction: dec!(0.20),
        }
    }
}

/// billing cycle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub cycle_days: u32,
    /// bill due date offset from the billing date
    pub due_offset_days: u32,
    /// slice of the principal balance billed each cycle
    pub principal_fraction: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cycle_days: 30,
            due_offset_days: 15,
            principal_fraction: dec!(0.03),
        }
    }
}

/// what to do with payment amount left over after all bills and principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OveragePolicy {
    /// keep the excess without refund or credit-forward
    Absorb,
    /// reject the whole payment instead of losing the excess
    Reject,
}

/// payment allocation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub overage_policy: OveragePolicy,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            overage_policy: OveragePolicy::Absorb,
        }
    }
}

/// loan origination gates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginationConfig {
    pub min_credit_score: i32,
    pub min_annual_income: Money,
    /// applications below this annual rate are rejected outright
    pub min_interest_rate: Rate,
}

impl Default for OriginationConfig {
    fn default() -> Self {
        Self {
            min_credit_score: 450,
            min_annual_income: Money::from_major(150_000),
            min_interest_rate: Rate::from_percentage(dec!(12)),
        }
    }
}

/// statement projection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementConfig {
    /// upper bound on projected future cycles
    pub max_projected_cycles: u32,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            max_projected_cycles: 24,
        }
    }
}

/// aggregate configuration for the whole engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub emi: EmiConfig,
    pub billing: BillingConfig,
    pub allocation: AllocationConfig,
    pub origination: OriginationConfig,
    pub statement: StatementConfig,
}
