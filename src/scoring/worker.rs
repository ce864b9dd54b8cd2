use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::config::ScoringConfig;
use crate::store::CreditStore;
use crate::types::PersonId;

use super::{compute_credit_score, TransactionLedger};

/// request to (re)compute one person's credit score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreJob {
    pub person_id: PersonId,
    /// ledger subject key (government id)
    pub subject: String,
}

/// background scoring worker.
///
/// Registration enqueues a job and returns immediately; the worker computes
/// the score and writes it back through the store. Callers observe the
/// score only after that write is visible, and nothing waits for it: a loan
/// application racing the worker sees an absent score and is rejected.
pub struct ScoreWorker {
    sender: Sender<ScoreJob>,
    handle: JoinHandle<()>,
}

impl ScoreWorker {
    pub fn spawn(
        ledger: Arc<dyn TransactionLedger>,
        store: Arc<dyn CreditStore>,
        config: ScoringConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || run(receiver, ledger, store, config));
        Self { sender, handle }
    }

    /// handle for enqueueing jobs
    pub fn sender(&self) -> Sender<ScoreJob> {
        self.sender.clone()
    }

    /// drop the queue and wait for in-flight jobs to finish
    pub fn shutdown(self) {
        let Self { sender, handle } = self;
        // closing the channel ends the worker loop
        drop(sender);
        let _ = handle.join();
    }
}

fn run(
    receiver: Receiver<ScoreJob>,
    ledger: Arc<dyn TransactionLedger>,
    store: Arc<dyn CreditStore>,
    config: ScoringConfig,
) {
    while let Ok(job) = receiver.recv() {
        let score = compute_credit_score(&job.subject, ledger.as_ref(), &config);
        match store.set_credit_score(job.person_id, score) {
            Ok(()) => {
                info!(person_id = %job.person_id, score, "credit score updated");
            }
            Err(e) => {
                error!(person_id = %job.person_id, error = %e, "failed to persist credit score");
            }
        }
    }
}
