pub mod allocation;
pub mod billing;
pub mod config;
pub mod decimal;
pub mod emi;
pub mod engine;
pub mod errors;
pub mod scoring;
pub mod statement;
pub mod store;
pub mod types;

// re-export key types
pub use allocation::{allocate_payment, Allocation, LoanBalances};
pub use billing::{generate_bill_if_due, next_billing_date, BillingOutcome, CycleCharges};
pub use config::{
    AllocationConfig, BillingConfig, EmiConfig, EngineConfig, OriginationConfig, OveragePolicy,
    ScoringConfig, StatementConfig,
};
pub use decimal::{Money, Rate};
pub use emi::{Installment, InstallmentPlan};
pub use engine::{BillingRunSummary, CreditEngine, LoanOffer};
pub use errors::{CreditError, Result};
pub use scoring::{
    compute_credit_score, CsvLedger, LedgerRow, ScoreJob, ScoreWorker, TransactionKind,
    TransactionLedger,
};
pub use statement::{PastEntry, ProjectedEntry, Statement};
pub use store::{CreditStore, LoanWorkingSet, MemoryStore};
pub use types::{
    Bill, BillId, BillStatus, Loan, LoanId, LoanSnapshot, LoanStatus, PaymentRecord, Person,
    PersonId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
