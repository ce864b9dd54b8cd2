/// statement projection serialized as JSON
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use credit_engine_rs::{
    CreditEngine, CreditStore, EngineConfig, LedgerRow, MemoryStore, Money, Rate,
    SafeTimeProvider, TimeSource, TransactionLedger,
};
use rust_decimal_macros::dec;

struct DemoLedger;

impl TransactionLedger for DemoLedger {
    fn rows_for(&self, _subject: &str) -> std::io::Result<Vec<LedgerRow>> {
        Ok(vec![LedgerRow {
            kind: "CREDIT".to_string(),
            amount: "700000".to_string(),
        }])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let engine = CreditEngine::new(store.clone(), Arc::new(DemoLedger), EngineConfig::default());

    let person = engine.register_person(
        "555566667777".to_string(),
        "Meera Iyer".to_string(),
        "meera@example.com".to_string(),
        Money::from_major(800_000),
    )?;
    while store.person(person.id)?.credit_score.is_none() {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    let offer = engine.apply_for_loan(
        person.id,
        Money::from_major(80_000),
        Rate::from_percentage(dec!(14)),
        36,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )?;

    // bill the first cycle so the statement has history
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 31, 6, 0, 0).unwrap(),
    ));
    engine.run_billing(&time);
    engine.make_payment(offer.loan_id, Money::from_major(1500), &time)?;

    let statement = engine.statement(offer.loan_id)?;
    println!("{}", serde_json::to_string_pretty(&statement)?);

    engine.shutdown();
    Ok(())
}
