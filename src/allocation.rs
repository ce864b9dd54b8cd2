use chrono::{DateTime, Utc};

use crate::config::{AllocationConfig, OveragePolicy};
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::types::{Bill, BillStatus, LoanId, LoanStatus, PaymentRecord};

/// loan-side inputs to allocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanBalances {
    pub loan_id: LoanId,
    pub status: LoanStatus,
    pub principal_balance: Money,
}

/// full result of allocating one payment.
///
/// Allocation is computed over snapshots and returns replacement state, so
/// the caller commits everything or nothing; a failure before the commit
/// leaves no partial state behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub updated_bills: Vec<Bill>,
    pub new_principal_balance: Money,
    pub new_status: LoanStatus,
    pub payment: PaymentRecord,
    pub applied_to_bills: Money,
    pub applied_to_principal: Money,
    /// amount beyond all dues and principal, kept per the overage policy
    pub excess: Money,
}

/// allocate a payment across outstanding bills (oldest due first) and then
/// against the principal balance.
///
/// `outstanding_bills` must be pre-filtered to outstanding statuses and
/// ordered by due date ascending, then creation order.
pub fn allocate_payment(
    loan: &LoanBalances,
    outstanding_bills: &[Bill],
    amount: Money,
    payment_date: DateTime<Utc>,
    config: &AllocationConfig,
) -> Result<Allocation> {
    if !amount.is_positive() {
        return Err(CreditError::InvalidPaymentAmount { amount });
    }
    if loan.status != LoanStatus::Active {
        return Err(CreditError::LoanNotActive { status: loan.status });
    }
    if outstanding_bills.is_empty() && !loan.principal_balance.is_positive() {
        return Err(CreditError::NothingOutstanding { id: loan.loan_id });
    }

    if config.overage_policy == OveragePolicy::Reject {
        let total_due = outstanding_bills
            .iter()
            .map(|b| b.remaining_due())
            .fold(Money::ZERO, |acc, x| acc + x)
            + loan.principal_balance;
        if amount > total_due {
            return Err(CreditError::ExcessPaymentRejected {
                amount,
                outstanding: total_due,
            });
        }
    }

    let mut remaining = amount;
    let mut applied_to_bills = Money::ZERO;
    let mut updated_bills = Vec::new();

    for bill in outstanding_bills {
        if !remaining.is_positive() {
            break;
        }

        let applied = remaining.min(bill.remaining_due());
        if applied.is_positive() {
            let mut updated = bill.clone();
            updated.amount_paid += applied;
            updated.status = if updated.amount_paid >= updated.min_due_amount {
                BillStatus::Paid
            } else {
                BillStatus::PartiallyPaid
            };
            remaining -= applied;
            applied_to_bills += applied;
            updated_bills.push(updated);
        }
    }

    let mut new_principal_balance = loan.principal_balance;
    let mut applied_to_principal = Money::ZERO;
    if remaining.is_positive() && new_principal_balance.is_positive() {
        applied_to_principal = remaining.min(new_principal_balance);
        new_principal_balance -= applied_to_principal;
        remaining -= applied_to_principal;
    }

    // whatever is left is absorbed, not refunded
    let excess = remaining;

    let any_bill_outstanding = outstanding_bills.iter().any(|bill| {
        updated_bills
            .iter()
            .find(|u| u.id == bill.id)
            .map(|u| u.is_outstanding())
            .unwrap_or(true)
    });

    let new_status = if !any_bill_outstanding && !new_principal_balance.is_positive() {
        LoanStatus::Closed
    } else {
        LoanStatus::Active
    };

    Ok(Allocation {
        updated_bills,
        new_principal_balance,
        new_status,
        payment: PaymentRecord {
            loan_id: loan.loan_id,
            amount,
            payment_date,
        },
        applied_to_bills,
        applied_to_principal,
        excess,
    })
}
