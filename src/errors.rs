use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, LoanStatus, PersonId};

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("term period must be greater than 0 months")]
    InvalidTerm,

    #[error("loan amount must be positive: {amount}")]
    InvalidLoanAmount { amount: Money },

    #[error("first month interest {interest} must exceed {floor}")]
    InterestBelowFloor { interest: Money, floor: Money },

    #[error("interest rate {rate} is below required minimum {minimum}")]
    InterestRateBelowMinimum { rate: Rate, minimum: Rate },

    #[error("calculated EMI {emi} crosses affordability limit {max_allowed}")]
    EmiExceedsAffordability { emi: Money, max_allowed: Money },

    #[error("person not found: {id}")]
    PersonNotFound { id: PersonId },

    #[error("loan not found: {id}")]
    LoanNotFound { id: LoanId },

    #[error("loan is not active: current status is {status:?}")]
    LoanNotActive { status: LoanStatus },

    #[error("loan is closed: {id}")]
    LoanClosed { id: LoanId },

    #[error("no outstanding bills or balance for loan {id}")]
    NothingOutstanding { id: LoanId },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("payment {amount} exceeds total outstanding {outstanding}")]
    ExcessPaymentRejected { amount: Money, outstanding: Money },

    #[error("credit score {score} is below required minimum {minimum}")]
    ScoreBelowMinimum { score: i32, minimum: i32 },

    #[error("credit score not yet computed for person {id}")]
    ScoreNotComputed { id: PersonId },

    #[error("annual income {income} is below required minimum {minimum}")]
    IncomeBelowMinimum { income: Money, minimum: Money },

    #[error("duplicate government id: {government_id}")]
    DuplicateGovernmentId { government_id: String },

    #[error("duplicate email: {email}")]
    DuplicateEmail { email: String },

    #[error("storage failure: {message}")]
    Storage { message: String },
}

pub type Result<T> = std::result::Result<T, CreditError>;
