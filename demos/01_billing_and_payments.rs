/// billing cycles and payments under controlled time
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use credit_engine_rs::{
    CreditEngine, CreditStore, EngineConfig, LedgerRow, MemoryStore, Money, Rate,
    SafeTimeProvider, TimeSource, TransactionLedger,
};
use rust_decimal_macros::dec;

/// in-memory ledger standing in for the transactions file
struct DemoLedger;

impl TransactionLedger for DemoLedger {
    fn rows_for(&self, _subject: &str) -> std::io::Result<Vec<LedgerRow>> {
        Ok(vec![LedgerRow {
            kind: "CREDIT".to_string(),
            amount: "1000000".to_string(),
        }])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let store = Arc::new(MemoryStore::new());
    let engine = CreditEngine::new(store.clone(), Arc::new(DemoLedger), EngineConfig::default());

    let person = engine.register_person(
        "999988887777".to_string(),
        "Vikram Shah".to_string(),
        "vikram@example.com".to_string(),
        Money::from_major(900_000),
    )?;
    while store.person(person.id)?.credit_score.is_none() {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    let disbursed = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let offer = engine.apply_for_loan(
        person.id,
        Money::from_major(50_000),
        Rate::from_percentage(dec!(15)),
        24,
        disbursed,
    )?;
    println!("loan {} active with balance 50000.00\n", offer.loan_id);

    // drive the clock from disbursement through three billing cycles
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();

    for day in 1..=90 {
        control.advance(Duration::days(1));
        let summary = engine.run_billing(&time);
        if summary.billed > 0 {
            let bills = store.bills_for(offer.loan_id)?;
            let bill = bills.last().unwrap();
            println!(
                "day {day}: billed min due {} (principal {} + interest {}), due {}",
                bill.min_due_amount, bill.principal_component, bill.interest_component, bill.due_date
            );
        }

        // pay each bill a few days after it is issued
        if day % 30 == 5 && day > 30 {
            let bills = store.bills_for(offer.loan_id)?;
            if let Some(open) = bills.iter().find(|b| b.is_outstanding()) {
                let allocation = engine.make_payment(offer.loan_id, open.remaining_due(), &time)?;
                println!(
                    "day {day}: paid {}, balance now {}",
                    allocation.payment.amount, allocation.new_principal_balance
                );
            }
        }
    }

    let loan = store.loan(offer.loan_id)?;
    println!("\nfinal balance: {} ({:?})", loan.principal_balance, loan.status);
    println!("payments recorded: {}", engine.payments(offer.loan_id)?.len());

    engine.shutdown();
    Ok(())
}
