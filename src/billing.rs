use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::decimal::{Money, Rate};
use crate::types::{Bill, BillStatus, LoanSnapshot};

/// one cycle's minimum-due breakdown for a given balance.
///
/// Pure formula shared by bill generation and statement projection:
/// interest is simple daily interest over the cycle, the principal slice
/// is a fixed fraction of the balance capped at the full remainder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleCharges {
    pub principal_component: Money,
    pub interest_component: Money,
    pub min_due: Money,
}

impl CycleCharges {
    pub fn compute(balance: Money, annual_rate: Rate, config: &BillingConfig) -> Self {
        let interest_component = Money::from_decimal(
            balance.as_decimal() * annual_rate.daily_fraction() * Decimal::from(config.cycle_days),
        );

        let principal_raw = balance.as_decimal() * config.principal_fraction;
        let principal_component = if principal_raw >= balance.as_decimal() {
            // last cycle pays off exactly what remains
            balance
        } else {
            Money::from_decimal(principal_raw)
        };

        let min_due = principal_component + interest_component;

        Self {
            principal_component,
            interest_component,
            min_due,
        }
    }
}

/// the date the next bill fires for a loan
pub fn next_billing_date(snapshot: &LoanSnapshot, config: &BillingConfig) -> NaiveDate {
    let anchor = snapshot
        .last_billing_date
        .unwrap_or(snapshot.disbursement_date);
    anchor + Duration::days(config.cycle_days as i64)
}

/// outcome of one billing attempt for one loan
#[derive(Debug, Clone, PartialEq)]
pub enum BillingOutcome {
    /// a new Pending bill for this cycle; the caller persists it
    Billed(Bill),
    /// today is not the loan's billing day
    NotDue,
    /// billing day, but the balance reached zero before the lock was taken
    Skipped,
}

/// generate this cycle's bill when `today` is exactly the expected next
/// billing date. Never fires early, never catches up missed days, and
/// never mutates the loan balance.
pub fn generate_bill_if_due(
    snapshot: &LoanSnapshot,
    today: NaiveDate,
    config: &BillingConfig,
) -> BillingOutcome {
    if today != next_billing_date(snapshot, config) {
        return BillingOutcome::NotDue;
    }

    if !snapshot.principal_balance.is_positive() {
        // race with a just-completed payoff
        return BillingOutcome::Skipped;
    }

    let charges = CycleCharges::compute(snapshot.principal_balance, snapshot.interest_rate, config);

    BillingOutcome::Billed(Bill {
        id: Uuid::new_v4(),
        loan_id: snapshot.loan_id,
        seq: snapshot.cycles_billed as u64 + 1,
        billing_date: today,
        due_date: today + Duration::days(config.due_offset_days as i64),
        principal_component: charges.principal_component,
        interest_component: charges.interest_component,
        min_due_amount: charges.min_due,
        amount_paid: Money::ZERO,
        status: BillStatus::Pending,
    })
}
