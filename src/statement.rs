use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::billing::CycleCharges;
use crate::config::{BillingConfig, StatementConfig};
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::types::{Bill, LoanSnapshot, LoanStatus};

/// billed cycle, reported verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastEntry {
    pub date: NaiveDate,
    pub principal: Money,
    pub interest: Money,
    pub amount_paid: Money,
}

/// projected future cycle; nothing is persisted for these
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEntry {
    pub date: NaiveDate,
    pub amount_due: Money,
}

/// account statement: billed history plus a forward simulation of the
/// billing formula over the remaining term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub loan_id: crate::types::LoanId,
    pub past: Vec<PastEntry>,
    pub upcoming: Vec<ProjectedEntry>,
}

impl Statement {
    /// `bills` must be ordered by billing date ascending
    pub fn build(
        snapshot: &LoanSnapshot,
        bills: &[Bill],
        billing: &BillingConfig,
        config: &StatementConfig,
    ) -> Result<Self> {
        if snapshot.status == LoanStatus::Closed {
            return Err(CreditError::LoanClosed { id: snapshot.loan_id });
        }

        let past = bills
            .iter()
            .map(|bill| PastEntry {
                date: bill.billing_date,
                principal: bill.principal_component,
                interest: bill.interest_component,
                amount_paid: bill.amount_paid,
            })
            .collect();

        let cycles_remaining = snapshot.term_months.saturating_sub(snapshot.cycles_billed);
        let cycles_to_simulate = cycles_remaining.min(config.max_projected_cycles);

        let mut upcoming = Vec::new();
        let mut balance = snapshot.principal_balance;
        let mut billing_date = snapshot
            .last_billing_date
            .unwrap_or(snapshot.disbursement_date);

        for _ in 0..cycles_to_simulate {
            if !balance.is_positive() {
                break;
            }

            billing_date = billing_date + Duration::days(billing.cycle_days as i64);
            let charges = CycleCharges::compute(balance, snapshot.interest_rate, billing);

            upcoming.push(ProjectedEntry {
                date: billing_date,
                amount_due: charges.min_due,
            });

            balance -= charges.principal_component;
        }

        Ok(Self {
            loan_id: snapshot.loan_id,
            past,
            upcoming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{generate_bill_if_due, next_billing_date, BillingOutcome};
    use crate::decimal::Rate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn snapshot(balance: i64, term: u32) -> LoanSnapshot {
        LoanSnapshot {
            loan_id: Uuid::new_v4(),
            status: LoanStatus::Active,
            principal_balance: Money::from_major(balance),
            interest_rate: Rate::from_percentage(dec!(12)),
            term_months: term,
            disbursement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            last_billing_date: None,
            cycles_billed: 0,
        }
    }

    #[test]
    fn test_projection_steps_thirty_days() {
        let snap = snapshot(10_000, 12);
        let statement = Statement::build(
            &snap,
            &[],
            &BillingConfig::default(),
            &StatementConfig::default(),
        )
        .unwrap();

        assert!(statement.past.is_empty());
        assert_eq!(statement.upcoming.len(), 12);
        assert_eq!(
            statement.upcoming[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert_eq!(
            statement.upcoming[1].date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        // first projected due mirrors the billing formula
        assert_eq!(
            statement.upcoming[0].amount_due,
            Money::from_str_exact("398.63").unwrap()
        );
        // balance declines in simulation, so dues shrink
        assert!(statement.upcoming[1].amount_due < statement.upcoming[0].amount_due);
    }

    #[test]
    fn test_projection_capped_at_twenty_four_cycles() {
        let snap = snapshot(500_000, 60);
        let statement = Statement::build(
            &snap,
            &[],
            &BillingConfig::default(),
            &StatementConfig::default(),
        )
        .unwrap();

        assert_eq!(statement.upcoming.len(), 24);
    }

    #[test]
    fn test_projection_matches_actual_billing() {
        let snap = snapshot(25_000, 12);
        let config = BillingConfig::default();

        let statement =
            Statement::build(&snap, &[], &config, &StatementConfig::default()).unwrap();

        // the first projected cycle must equal the bill the billing run
        // would create on that same date
        let billing_day = next_billing_date(&snap, &config);
        let bill = match generate_bill_if_due(&snap, billing_day, &config) {
            BillingOutcome::Billed(bill) => bill,
            other => panic!("expected a bill, got {other:?}"),
        };

        assert_eq!(statement.upcoming[0].date, bill.billing_date);
        assert_eq!(statement.upcoming[0].amount_due, bill.min_due_amount);
    }

    #[test]
    fn test_past_entries_reported_verbatim() {
        let mut snap = snapshot(9_700, 12);
        let billed_on = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        snap.last_billing_date = Some(billed_on);
        snap.cycles_billed = 1;

        let bill = Bill {
            id: Uuid::new_v4(),
            loan_id: snap.loan_id,
            seq: 1,
            billing_date: billed_on,
            due_date: billed_on + Duration::days(15),
            principal_component: Money::from_major(300),
            interest_component: Money::from_str_exact("98.63").unwrap(),
            min_due_amount: Money::from_str_exact("398.63").unwrap(),
            amount_paid: Money::from_major(100),
            status: crate::types::BillStatus::PartiallyPaid,
        };

        let statement = Statement::build(
            &snap,
            &[bill.clone()],
            &BillingConfig::default(),
            &StatementConfig::default(),
        )
        .unwrap();

        assert_eq!(statement.past.len(), 1);
        assert_eq!(statement.past[0].date, billed_on);
        assert_eq!(statement.past[0].amount_paid, Money::from_major(100));
        // projection resumes from the last billed date
        assert_eq!(
            statement.upcoming[0].date,
            billed_on + Duration::days(30)
        );
        // eleven cycles remain of the twelve-month term
        assert_eq!(statement.upcoming.len(), 11);
    }

    #[test]
    fn test_closed_loan_rejected() {
        let mut snap = snapshot(0, 12);
        snap.status = LoanStatus::Closed;

        let err = Statement::build(
            &snap,
            &[],
            &BillingConfig::default(),
            &StatementConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CreditError::LoanClosed { .. }));
    }
}
