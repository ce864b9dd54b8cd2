use std::sync::mpsc::Sender;
use std::sync::Arc;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::allocation::{allocate_payment, Allocation, LoanBalances};
use crate::billing::{generate_bill_if_due, BillingOutcome};
use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::emi::InstallmentPlan;
use crate::errors::{CreditError, Result};
use crate::scoring::{ScoreJob, ScoreWorker, TransactionLedger};
use crate::statement::Statement;
use crate::store::CreditStore;
use crate::types::{Loan, LoanId, LoanSnapshot, LoanStatus, PaymentRecord, Person, PersonId};

/// accepted loan application: the persisted loan plus its repayment plan
#[derive(Debug, Clone, PartialEq)]
pub struct LoanOffer {
    pub loan_id: LoanId,
    pub plan: InstallmentPlan,
}

/// operator-facing counts for one billing sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingRunSummary {
    pub examined: u32,
    pub billed: u32,
    pub skipped: u32,
    pub errored: u32,
}

/// service facade wiring the pure financial components to a store, a
/// transaction ledger and the background scoring worker
pub struct CreditEngine {
    store: Arc<dyn CreditStore>,
    config: EngineConfig,
    score_jobs: Sender<ScoreJob>,
    worker: ScoreWorker,
}

impl CreditEngine {
    pub fn new(
        store: Arc<dyn CreditStore>,
        ledger: Arc<dyn TransactionLedger>,
        config: EngineConfig,
    ) -> Self {
        let worker = ScoreWorker::spawn(ledger, store.clone(), config.scoring.clone());
        let score_jobs = worker.sender();
        Self {
            store,
            config,
            score_jobs,
            worker,
        }
    }

    pub fn store(&self) -> &Arc<dyn CreditStore> {
        &self.store
    }

    /// create a person and hand their ledger subject to the scoring worker.
    /// Registration never waits for the score; until the worker's write is
    /// visible, loan applications see an absent score.
    pub fn register_person(
        &self,
        government_id: String,
        name: String,
        email: String,
        annual_income: Money,
    ) -> Result<Person> {
        let person =
            self.store
                .create_person(government_id, name, email, annual_income)?;

        let job = ScoreJob {
            person_id: person.id,
            subject: person.government_id.clone(),
        };
        if self.score_jobs.send(job).is_err() {
            // registration still succeeds; the score stays absent
            warn!(person_id = %person.id, "scoring worker unavailable, job dropped");
        }

        info!(person_id = %person.id, "person registered");
        Ok(person)
    }

    /// originate a loan: credit and income gates, then the EMI plan, then
    /// an Active loan carrying the full amount as its balance
    pub fn apply_for_loan(
        &self,
        person_id: PersonId,
        loan_amount: Money,
        interest_rate: Rate,
        term_months: u32,
        disbursement_date: NaiveDate,
    ) -> Result<LoanOffer> {
        let person = self.store.person(person_id)?;

        let score = person
            .credit_score
            .ok_or(CreditError::ScoreNotComputed { id: person_id })?;
        if score < self.config.origination.min_credit_score {
            return Err(CreditError::ScoreBelowMinimum {
                score,
                minimum: self.config.origination.min_credit_score,
            });
        }
        if person.annual_income < self.config.origination.min_annual_income {
            return Err(CreditError::IncomeBelowMinimum {
                income: person.annual_income,
                minimum: self.config.origination.min_annual_income,
            });
        }
        if interest_rate < self.config.origination.min_interest_rate {
            return Err(CreditError::InterestRateBelowMinimum {
                rate: interest_rate,
                minimum: self.config.origination.min_interest_rate,
            });
        }

        let plan = InstallmentPlan::generate(
            loan_amount,
            interest_rate,
            term_months,
            person.annual_income,
            disbursement_date,
            &self.config.emi,
        )?;

        let loan = Loan {
            id: Uuid::new_v4(),
            person_id,
            loan_amount,
            interest_rate,
            term_months,
            disbursement_date,
            principal_balance: loan_amount,
            status: LoanStatus::Active,
        };
        self.store.insert_loan(loan.clone())?;

        info!(loan_id = %loan.id, person_id = %person_id, amount = %loan_amount, "loan originated");
        Ok(LoanOffer {
            loan_id: loan.id,
            plan,
        })
    }

    /// allocate a payment under the loan's exclusive lock; the working-set
    /// commit makes the bill, loan and ledger updates atomic
    pub fn make_payment(
        &self,
        loan_id: LoanId,
        amount: Money,
        time: &SafeTimeProvider,
    ) -> Result<Allocation> {
        let payment_date = time.now();
        let mut outcome = None;

        self.store.with_loan_locked(loan_id, &mut |ws| {
            let balances = LoanBalances {
                loan_id,
                status: ws.loan.status,
                principal_balance: ws.loan.principal_balance,
            };
            let outstanding = ws.outstanding_bills();

            let allocation = allocate_payment(
                &balances,
                &outstanding,
                amount,
                payment_date,
                &self.config.allocation,
            )?;

            for updated in &allocation.updated_bills {
                if let Some(bill) = ws.bills.iter_mut().find(|b| b.id == updated.id) {
                    *bill = updated.clone();
                }
            }
            ws.loan.principal_balance = allocation.new_principal_balance;
            ws.loan.status = allocation.new_status;
            ws.payments.push(allocation.payment.clone());

            outcome = Some(allocation);
            Ok(())
        })?;

        let allocation = outcome.ok_or_else(|| CreditError::Storage {
            message: "allocation result missing after commit".to_string(),
        })?;

        info!(
            %loan_id,
            amount = %amount,
            to_bills = %allocation.applied_to_bills,
            to_principal = %allocation.applied_to_principal,
            closed = allocation.new_status == LoanStatus::Closed,
            "payment allocated"
        );
        Ok(allocation)
    }

    /// daily billing sweep: one bill per eligible loan whose cycle falls
    /// due today. A failure on one loan is logged and isolated; the sweep
    /// continues with the rest.
    pub fn run_billing(&self, time: &SafeTimeProvider) -> BillingRunSummary {
        let today = time.now().date_naive();
        info!(%today, "starting billing run");

        let loan_ids = match self.store.billable_loans() {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "could not list billable loans");
                return BillingRunSummary::default();
            }
        };

        let mut summary = BillingRunSummary {
            examined: loan_ids.len() as u32,
            ..Default::default()
        };

        for loan_id in loan_ids {
            match self.bill_one_loan(loan_id, today) {
                Ok(BillingOutcome::Billed(bill)) => {
                    summary.billed += 1;
                    info!(
                        %loan_id,
                        bill_id = %bill.id,
                        min_due = %bill.min_due_amount,
                        due_date = %bill.due_date,
                        "bill created"
                    );
                }
                Ok(BillingOutcome::NotDue) => {}
                Ok(BillingOutcome::Skipped) => {
                    summary.skipped += 1;
                    warn!(%loan_id, "billing skipped, balance reached zero before lock");
                }
                Err(e) => {
                    summary.errored += 1;
                    error!(%loan_id, error = %e, "billing failed for loan, continuing");
                }
            }
        }

        info!(
            billed = summary.billed,
            skipped = summary.skipped,
            errored = summary.errored,
            "billing run finished"
        );
        summary
    }

    fn bill_one_loan(&self, loan_id: LoanId, today: NaiveDate) -> Result<BillingOutcome> {
        let mut outcome = BillingOutcome::NotDue;

        self.store.with_loan_locked(loan_id, &mut |ws| {
            let snapshot = LoanSnapshot::of(&ws.loan, &ws.bills);
            outcome = generate_bill_if_due(&snapshot, today, &self.config.billing);
            if let BillingOutcome::Billed(bill) = &outcome {
                ws.bills.push(bill.clone());
            }
            Ok(())
        })?;

        Ok(outcome)
    }

    /// past bills verbatim plus a read-only projection of upcoming dues
    pub fn statement(&self, loan_id: LoanId) -> Result<Statement> {
        let loan = self.store.loan(loan_id)?;
        let bills = self.store.bills_for(loan_id)?;
        let snapshot = LoanSnapshot::of(&loan, &bills);
        Statement::build(
            &snapshot,
            &bills,
            &self.config.billing,
            &self.config.statement,
        )
    }

    /// append-only payment ledger for a loan
    pub fn payments(&self, loan_id: LoanId) -> Result<Vec<PaymentRecord>> {
        self.store.payments_for(loan_id)
    }

    /// close the scoring queue and wait for in-flight jobs
    pub fn shutdown(self) {
        let Self {
            score_jobs, worker, ..
        } = self;
        drop(score_jobs);
        worker.shutdown();
    }
}
