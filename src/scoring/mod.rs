pub mod worker;

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{error, warn};

use crate::config::ScoringConfig;

pub use worker::{ScoreJob, ScoreWorker};

/// signed direction of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl FromStr for TransactionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREDIT" => Ok(TransactionKind::Credit),
            "DEBIT" => Ok(TransactionKind::Debit),
            _ => Err(()),
        }
    }
}

/// raw ledger row; amount and kind stay unparsed so malformed rows can be
/// skipped instead of failing the whole computation
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub kind: String,
    pub amount: String,
}

/// source of historical transactions for a scoring subject
pub trait TransactionLedger: Send + Sync {
    fn rows_for(&self, subject: &str) -> io::Result<Vec<LedgerRow>>;
}

/// CSV-file ledger with columns AADHARID, Transaction_type, Amount
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TransactionLedger for CsvLedger {
    fn rows_for(&self, subject: &str) -> io::Result<Vec<LedgerRow>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let headers = reader.headers().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?.clone();
        let subject_col = headers.iter().position(|h| h == "AADHARID");
        let kind_col = headers.iter().position(|h| h == "Transaction_type");
        let amount_col = headers.iter().position(|h| h == "Amount");

        let (subject_col, kind_col, amount_col) = match (subject_col, kind_col, amount_col) {
            (Some(s), Some(k), Some(a)) => (s, k, a),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "ledger file is missing expected columns",
                ))
            }
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if record.get(subject_col) == Some(subject) {
                rows.push(LedgerRow {
                    kind: record.get(kind_col).unwrap_or("").to_string(),
                    amount: record.get(amount_col).unwrap_or("").to_string(),
                });
            }
        }

        Ok(rows)
    }
}

/// derive a credit score from the subject's transaction history.
///
/// Never fails: an unreadable ledger degrades to the floor score so score
/// absence cannot block onboarding. Malformed rows are skipped.
pub fn compute_credit_score(
    subject: &str,
    ledger: &dyn TransactionLedger,
    config: &ScoringConfig,
) -> i32 {
    let rows = match ledger.rows_for(subject) {
        Ok(rows) => rows,
        Err(e) => {
            error!(subject, error = %e, "ledger unreadable, defaulting to floor score");
            return config.min_score;
        }
    };

    let mut total_credit = Decimal::ZERO;
    let mut total_debit = Decimal::ZERO;

    for row in &rows {
        let kind = match row.kind.parse::<TransactionKind>() {
            Ok(kind) => kind,
            Err(()) => {
                warn!(subject, kind = %row.kind, "skipping row with unknown transaction type");
                continue;
            }
        };
        let amount = match Decimal::from_str(row.amount.trim()) {
            Ok(amount) => amount,
            Err(_) => {
                warn!(subject, amount = %row.amount, "skipping row with unparsable amount");
                continue;
            }
        };

        match kind {
            TransactionKind::Credit => total_credit += amount,
            TransactionKind::Debit => total_debit += amount,
        }
    }

    score_for_balance(total_credit - total_debit, config)
}

/// piecewise-linear step map from account balance to score
pub fn score_for_balance(balance: Decimal, config: &ScoringConfig) -> i32 {
    let score = if balance >= config.upper_bound_balance {
        config.max_score
    } else if balance <= config.lower_bound_balance {
        config.min_score
    } else {
        let steps = ((balance - config.lower_bound_balance) / config.balance_step)
            .floor()
            .to_i32()
            .unwrap_or(0);
        config.min_score + steps * config.score_step
    };

    score.clamp(config.min_score, config.max_score)
}
