use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a person
pub type PersonId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a bill
pub type BillId = Uuid;

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// application recorded but not yet decided
    Pending,
    /// disbursed and repaying
    Active,
    /// balance cleared and no outstanding bills
    Closed,
    /// application failed a business rule
    Rejected,
}

/// billing-cycle obligation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillStatus {
    Pending,
    Paid,
    PartiallyPaid,
    Overdue,
}

/// registered borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// national identity number used as the transaction-ledger subject key
    pub government_id: String,
    pub name: String,
    pub email: String,
    pub annual_income: Money,
    /// in [300, 900] once the scoring worker has run
    pub credit_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// installment loan with a revolving minimum-due billing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub person_id: PersonId,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub disbursement_date: NaiveDate,
    /// non-increasing while Active; reduced only by payment allocation
    pub principal_balance: Money,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}

/// one billing-cycle obligation on a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub loan_id: LoanId,
    /// creation order, used as the tie-breaker for allocation ordering
    pub seq: u64,
    pub billing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub principal_component: Money,
    pub interest_component: Money,
    pub min_due_amount: Money,
    pub amount_paid: Money,
    pub status: BillStatus,
}

impl Bill {
    /// amount still owed on this bill
    pub fn remaining_due(&self) -> Money {
        (self.min_due_amount - self.amount_paid).max(Money::ZERO)
    }

    /// not yet fully settled
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self.status,
            BillStatus::Pending | BillStatus::PartiallyPaid | BillStatus::Overdue
        )
    }
}

/// append-only record of a received payment, independent of allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub loan_id: LoanId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
}

/// consistent view of a loan's billing state supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub loan_id: LoanId,
    pub status: LoanStatus,
    pub principal_balance: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub disbursement_date: NaiveDate,
    /// billing date of the most recent bill, if any
    pub last_billing_date: Option<NaiveDate>,
    /// number of cycles already billed
    pub cycles_billed: u32,
}

impl LoanSnapshot {
    pub fn of(loan: &Loan, bills: &[Bill]) -> Self {
        Self {
            loan_id: loan.id,
            status: loan.status,
            principal_balance: loan.principal_balance,
            interest_rate: loan.interest_rate,
            term_months: loan.term_months,
            disbursement_date: loan.disbursement_date,
            last_billing_date: bills.iter().map(|b| b.billing_date).max(),
            cycles_billed: bills.len() as u32,
        }
    }
}
