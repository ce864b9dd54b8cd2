use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::types::{Bill, Loan, LoanId, PaymentRecord, Person, PersonId};

/// everything owned by one loan, mutated as a unit under its lock
#[derive(Debug, Clone, PartialEq)]
pub struct LoanWorkingSet {
    pub loan: Loan,
    pub bills: Vec<Bill>,
    pub payments: Vec<PaymentRecord>,
}

impl LoanWorkingSet {
    /// outstanding bills ordered by due date, then creation order
    pub fn outstanding_bills(&self) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self
            .bills
            .iter()
            .filter(|b| b.is_outstanding())
            .cloned()
            .collect();
        bills.sort_by_key(|b| (b.due_date, b.seq));
        bills
    }
}

/// storage capability the engine depends on.
///
/// `with_loan_locked` is the transactional boundary: the closure runs with
/// exclusive access to one loan's working set, mutations are committed when
/// it returns Ok and discarded entirely when it returns Err. Locks are
/// per-loan; no cross-loan ordering exists or is needed.
pub trait CreditStore: Send + Sync {
    fn create_person(
        &self,
        government_id: String,
        name: String,
        email: String,
        annual_income: Money,
    ) -> Result<Person>;

    fn person(&self, id: PersonId) -> Result<Person>;

    fn set_credit_score(&self, id: PersonId, score: i32) -> Result<()>;

    fn insert_loan(&self, loan: Loan) -> Result<()>;

    fn loan(&self, id: LoanId) -> Result<Loan>;

    /// bills ordered by billing date ascending
    fn bills_for(&self, loan_id: LoanId) -> Result<Vec<Bill>>;

    fn payments_for(&self, loan_id: LoanId) -> Result<Vec<PaymentRecord>>;

    /// ids of Active loans with a positive balance (billing sweep input)
    fn billable_loans(&self) -> Result<Vec<LoanId>>;

    /// exclusive read-modify-write on one loan; commit on Ok, discard on Err
    fn with_loan_locked(
        &self,
        id: LoanId,
        f: &mut dyn FnMut(&mut LoanWorkingSet) -> Result<()>,
    ) -> Result<()>;
}

/// in-memory store with per-loan locking
#[derive(Default)]
pub struct MemoryStore {
    persons: Mutex<HashMap<PersonId, Person>>,
    loans: Mutex<HashMap<LoanId, Arc<Mutex<LoanWorkingSet>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn loan_cell(&self, id: LoanId) -> Result<Arc<Mutex<LoanWorkingSet>>> {
        self.loans
            .lock()
            .map_err(poisoned)?
            .get(&id)
            .cloned()
            .ok_or(CreditError::LoanNotFound { id })
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CreditError {
    CreditError::Storage {
        message: "lock poisoned".to_string(),
    }
}

impl CreditStore for MemoryStore {
    fn create_person(
        &self,
        government_id: String,
        name: String,
        email: String,
        annual_income: Money,
    ) -> Result<Person> {
        let mut persons = self.persons.lock().map_err(poisoned)?;
        if persons.values().any(|p| p.government_id == government_id) {
            return Err(CreditError::DuplicateGovernmentId { government_id });
        }
        if persons.values().any(|p| p.email == email) {
            return Err(CreditError::DuplicateEmail { email });
        }

        let person = Person {
            id: Uuid::new_v4(),
            government_id,
            name,
            email,
            annual_income,
            credit_score: None,
            created_at: Utc::now(),
        };
        persons.insert(person.id, person.clone());
        Ok(person)
    }

    fn person(&self, id: PersonId) -> Result<Person> {
        self.persons
            .lock()
            .map_err(poisoned)?
            .get(&id)
            .cloned()
            .ok_or(CreditError::PersonNotFound { id })
    }

    fn set_credit_score(&self, id: PersonId, score: i32) -> Result<()> {
        let mut persons = self.persons.lock().map_err(poisoned)?;
        let person = persons
            .get_mut(&id)
            .ok_or(CreditError::PersonNotFound { id })?;
        person.credit_score = Some(score);
        Ok(())
    }

    fn insert_loan(&self, loan: Loan) -> Result<()> {
        let id = loan.id;
        let working_set = LoanWorkingSet {
            loan,
            bills: Vec::new(),
            payments: Vec::new(),
        };
        self.loans
            .lock()
            .map_err(poisoned)?
            .insert(id, Arc::new(Mutex::new(working_set)));
        Ok(())
    }

    fn loan(&self, id: LoanId) -> Result<Loan> {
        let cell = self.loan_cell(id)?;
        let guard = cell.lock().map_err(poisoned)?;
        Ok(guard.loan.clone())
    }

    fn bills_for(&self, loan_id: LoanId) -> Result<Vec<Bill>> {
        let cell = self.loan_cell(loan_id)?;
        let guard = cell.lock().map_err(poisoned)?;
        let mut bills = guard.bills.clone();
        bills.sort_by_key(|b| (b.billing_date, b.seq));
        Ok(bills)
    }

    fn payments_for(&self, loan_id: LoanId) -> Result<Vec<PaymentRecord>> {
        let cell = self.loan_cell(loan_id)?;
        let guard = cell.lock().map_err(poisoned)?;
        Ok(guard.payments.clone())
    }

    fn billable_loans(&self) -> Result<Vec<LoanId>> {
        let cells: Vec<Arc<Mutex<LoanWorkingSet>>> =
            self.loans.lock().map_err(poisoned)?.values().cloned().collect();

        let mut ids = Vec::new();
        for cell in cells {
            let guard = cell.lock().map_err(poisoned)?;
            if guard.loan.is_active() && guard.loan.principal_balance.is_positive() {
                ids.push(guard.loan.id);
            }
        }
        Ok(ids)
    }

    fn with_loan_locked(
        &self,
        id: LoanId,
        f: &mut dyn FnMut(&mut LoanWorkingSet) -> Result<()>,
    ) -> Result<()> {
        let cell = self.loan_cell(id)?;
        let mut guard = cell.lock().map_err(poisoned)?;

        // run against a copy so an Err leaves no partial state visible
        let mut working = guard.clone();
        f(&mut working)?;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::LoanStatus;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_loan(person_id: PersonId) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            person_id,
            loan_amount: Money::from_major(10_000),
            interest_rate: Rate::from_percentage(dec!(12)),
            term_months: 12,
            disbursement_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            principal_balance: Money::from_major(10_000),
            status: LoanStatus::Active,
        }
    }

    fn store_with_loan() -> (MemoryStore, Loan) {
        let store = MemoryStore::new();
        let person = store
            .create_person(
                "111122223333".to_string(),
                "A Borrower".to_string(),
                "a@example.com".to_string(),
                Money::from_major(600_000),
            )
            .unwrap();
        let loan = sample_loan(person.id);
        store.insert_loan(loan.clone()).unwrap();
        (store, loan)
    }

    #[test]
    fn test_duplicate_government_id_rejected() {
        let store = MemoryStore::new();
        store
            .create_person(
                "111122223333".to_string(),
                "A".to_string(),
                "a@example.com".to_string(),
                Money::from_major(200_000),
            )
            .unwrap();
        let err = store
            .create_person(
                "111122223333".to_string(),
                "B".to_string(),
                "b@example.com".to_string(),
                Money::from_major(200_000),
            )
            .unwrap_err();
        assert!(matches!(err, CreditError::DuplicateGovernmentId { .. }));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store
            .create_person(
                "111122223333".to_string(),
                "A".to_string(),
                "a@example.com".to_string(),
                Money::from_major(200_000),
            )
            .unwrap();
        let err = store
            .create_person(
                "444455556666".to_string(),
                "B".to_string(),
                "a@example.com".to_string(),
                Money::from_major(200_000),
            )
            .unwrap_err();
        assert!(matches!(err, CreditError::DuplicateEmail { .. }));
    }

    #[test]
    fn test_locked_mutation_commits_on_ok() {
        let (store, loan) = store_with_loan();

        store
            .with_loan_locked(loan.id, &mut |ws| {
                ws.loan.principal_balance = Money::from_major(9_000);
                Ok(())
            })
            .unwrap();

        assert_eq!(store.loan(loan.id).unwrap().principal_balance, Money::from_major(9_000));
    }

    #[test]
    fn test_locked_mutation_discarded_on_err() {
        let (store, loan) = store_with_loan();

        let result = store.with_loan_locked(loan.id, &mut |ws| {
            ws.loan.principal_balance = Money::ZERO;
            ws.loan.status = LoanStatus::Closed;
            Err(CreditError::Storage {
                message: "simulated write failure".to_string(),
            })
        });

        assert!(result.is_err());
        let unchanged = store.loan(loan.id).unwrap();
        assert_eq!(unchanged.principal_balance, Money::from_major(10_000));
        assert_eq!(unchanged.status, LoanStatus::Active);
    }

    #[test]
    fn test_billable_loans_filters_status_and_balance() {
        let (store, loan) = store_with_loan();
        assert_eq!(store.billable_loans().unwrap(), vec![loan.id]);

        store
            .with_loan_locked(loan.id, &mut |ws| {
                ws.loan.principal_balance = Money::ZERO;
                Ok(())
            })
            .unwrap();
        assert!(store.billable_loans().unwrap().is_empty());
    }

    #[test]
    fn test_outstanding_bills_ordering() {
        use crate::types::{Bill, BillStatus};

        let (store, loan) = store_with_loan();
        let make_bill = |seq: u64, due_day: u32, status: BillStatus| Bill {
            id: Uuid::new_v4(),
            loan_id: loan.id,
            seq,
            billing_date: NaiveDate::from_ymd_opt(2024, 1, due_day).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, due_day).unwrap(),
            principal_component: Money::from_major(100),
            interest_component: Money::from_major(10),
            min_due_amount: Money::from_major(110),
            amount_paid: Money::ZERO,
            status,
        };

        store
            .with_loan_locked(loan.id, &mut |ws| {
                ws.bills.push(make_bill(2, 20, BillStatus::Pending));
                ws.bills.push(make_bill(1, 10, BillStatus::Paid));
                ws.bills.push(make_bill(3, 5, BillStatus::Overdue));
                Ok(())
            })
            .unwrap();

        store
            .with_loan_locked(loan.id, &mut |ws| {
                let outstanding = ws.outstanding_bills();
                let seqs: Vec<u64> = outstanding.iter().map(|b| b.seq).collect();
                // paid bill excluded, earliest due date first
                assert_eq!(seqs, vec![3, 2]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_unknown_loan() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.loan(Uuid::new_v4()).unwrap_err(),
            CreditError::LoanNotFound { .. }
        ));
    }
}
