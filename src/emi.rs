use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::config::EmiConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};

/// one scheduled installment in a repayment plan
#[derive(Debug, Clone, PartialEq)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub principal_component: Money,
    pub interest_component: Money,
}

/// equated-monthly-installment repayment plan
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentPlan {
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub disbursement_date: NaiveDate,
    pub emi_amount: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
}

impl InstallmentPlan {
    /// derive the full schedule, enforcing the interest floor and the
    /// affordability limit before any installment is produced
    pub fn generate(
        loan_amount: Money,
        annual_rate: Rate,
        term_months: u32,
        annual_income: Money,
        disbursement_date: NaiveDate,
        config: &EmiConfig,
    ) -> Result<Self> {
        if term_months == 0 {
            return Err(CreditError::InvalidTerm);
        }
        if !loan_amount.is_positive() {
            return Err(CreditError::InvalidLoanAmount { amount: loan_amount });
        }

        let monthly_rate = annual_rate.monthly_fraction();
        let first_month_interest = Money::from_decimal(loan_amount.as_decimal() * monthly_rate);
        if first_month_interest <= config.interest_floor {
            return Err(CreditError::InterestBelowFloor {
                interest: first_month_interest,
                floor: config.interest_floor,
            });
        }

        let emi_amount = emi_amount(loan_amount, monthly_rate, term_months);

        let monthly_income = annual_income.as_decimal() / Decimal::from(12);
        let max_allowed = Money::from_decimal(monthly_income * config.affordability_fraction);
        if emi_amount > max_allowed {
            return Err(CreditError::EmiExceedsAffordability {
                emi: emi_amount,
                max_allowed,
            });
        }

        let mut installments = Vec::with_capacity(term_months as usize);
        let mut balance = loan_amount;
        let mut total_interest = Money::ZERO;

        // every due date steps from the first one, so a month-end clamp
        // on the anchor carries through the whole schedule
        let first_due_date = disbursement_date + Months::new(1);

        for i in 1..=term_months {
            let due_date = first_due_date + Months::new(i - 1);
            let is_last = i == term_months;

            let interest_component = Money::from_decimal(balance.as_decimal() * monthly_rate);

            let (mut principal_component, mut amount_due) = if is_last {
                // final installment pays off the exact remainder
                (balance, balance + interest_component)
            } else {
                (emi_amount - interest_component, emi_amount)
            };

            if principal_component > balance {
                principal_component = balance;
                if !is_last {
                    amount_due = principal_component + interest_component;
                }
            }

            balance -= principal_component;
            if !is_last {
                balance = balance.max(Money::ZERO);
            }

            total_interest += interest_component;

            installments.push(Installment {
                number: i,
                due_date,
                amount_due,
                principal_component,
                interest_component,
            });
        }

        Ok(Self {
            loan_amount,
            interest_rate: annual_rate,
            term_months,
            disbursement_date,
            emi_amount,
            installments,
            total_interest,
        })
    }

    /// total principal across the schedule; equals the loan amount exactly
    pub fn total_principal(&self) -> Money {
        self.installments
            .iter()
            .map(|p| p.principal_component)
            .fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// EMI = P * r * (1 + r)^n / ((1 + r)^n - 1), half-up at 2 places
fn emi_amount(principal: Money, monthly_rate: Decimal, months: u32) -> Money {
    if monthly_rate.is_zero() {
        return Money::from_decimal(principal.as_decimal() / Decimal::from(months));
    }

    let mut compound = Decimal::ONE;
    let base = Decimal::ONE + monthly_rate;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * monthly_rate * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn disbursed() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn generate(
        amount: i64,
        rate_pct: Decimal,
        term: u32,
        income: i64,
    ) -> Result<InstallmentPlan> {
        InstallmentPlan::generate(
            Money::from_major(amount),
            Rate::from_percentage(rate_pct),
            term,
            Money::from_major(income),
            disbursed(),
            &EmiConfig::default(),
        )
    }

    #[test]
    fn test_standard_plan_amounts() {
        let plan = generate(100_000, dec!(12), 12, 600_000).unwrap();

        assert_eq!(plan.emi_amount, Money::from_str_exact("8884.88").unwrap());
        assert_eq!(plan.installments.len(), 12);

        let first = &plan.installments[0];
        assert_eq!(first.interest_component, Money::from_major(1000));
        assert_eq!(first.principal_component, Money::from_str_exact("7884.88").unwrap());
        assert_eq!(first.amount_due, plan.emi_amount);
        assert_eq!(first.due_date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());

        // every non-final installment charges the flat EMI
        for installment in &plan.installments[..11] {
            assert_eq!(installment.amount_due, plan.emi_amount);
        }
    }

    #[test]
    fn test_full_amortization() {
        let plan = generate(100_000, dec!(12), 12, 600_000).unwrap();

        // principal components sum to the loan amount exactly
        assert_eq!(plan.total_principal(), Money::from_major(100_000));

        // final installment clears the remainder, so a replay of the
        // schedule against the balance ends at exactly zero
        let mut balance = Money::from_major(100_000);
        for installment in &plan.installments {
            balance -= installment.principal_component;
        }
        assert_eq!(balance, Money::ZERO);
    }

    #[test]
    fn test_rejects_interest_below_floor() {
        // 1000 at 12% -> first month interest 10.00, floor is 50.00
        let err = generate(1000, dec!(12), 12, 600_000).unwrap_err();
        match err {
            CreditError::InterestBelowFloor { interest, floor } => {
                assert_eq!(interest, Money::from_major(10));
                assert_eq!(floor, Money::from_major(50));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_interest_exactly_at_floor() {
        // 5000 at 12% -> first month interest exactly 50.00, must exceed
        let err = generate(5000, dec!(12), 12, 600_000).unwrap_err();
        assert!(matches!(err, CreditError::InterestBelowFloor { .. }));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let err = generate(100_000, dec!(0), 12, 600_000).unwrap_err();
        assert!(matches!(err, CreditError::InterestBelowFloor { .. }));
    }

    #[test]
    fn test_rejects_unaffordable_emi() {
        // income 120000/yr -> monthly 10000 -> max EMI 2000
        // 55000 over 24 months at 12% computes an EMI near 2589
        let err = generate(55_000, dec!(12), 24, 120_000).unwrap_err();
        match err {
            CreditError::EmiExceedsAffordability { emi, max_allowed } => {
                assert_eq!(max_allowed, Money::from_major(2000));
                assert!(emi > max_allowed);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_zero_term_and_amount() {
        assert!(matches!(
            generate(100_000, dec!(12), 0, 600_000).unwrap_err(),
            CreditError::InvalidTerm
        ));
        assert!(matches!(
            generate(0, dec!(12), 12, 600_000).unwrap_err(),
            CreditError::InvalidLoanAmount { .. }
        ));
    }

    #[test]
    fn test_due_dates_anchor_on_first_due_date() {
        // 3-month term computes an EMI near 34002, so the income must
        // clear a 20% monthly affordability cap of that size
        let plan = InstallmentPlan::generate(
            Money::from_major(100_000),
            Rate::from_percentage(dec!(12)),
            3,
            Money::from_major(2_100_000),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            &EmiConfig::default(),
        )
        .unwrap();

        let dates: Vec<NaiveDate> = plan.installments.iter().map(|p| p.due_date).collect();
        assert_eq!(
            dates,
            vec![
                // Jan 31 clamps to Feb 29; later months step from that
                // anchor, not from the disbursement day
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 29).unwrap(),
            ]
        );
    }

    #[test]
    fn test_components_are_rounded_per_installment() {
        let plan = generate(77_777, dec!(13.5), 18, 900_000).unwrap();
        for installment in &plan.installments {
            assert_eq!(
                installment.principal_component + installment.interest_component,
                installment.amount_due
            );
            // stable under re-rounding
            assert_eq!(
                Money::from_decimal(installment.interest_component.as_decimal()),
                installment.interest_component
            );
        }
        assert_eq!(plan.total_principal(), Money::from_major(77_777));
    }
}
