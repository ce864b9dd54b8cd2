/// quick start - register a borrower, score them, originate a loan
use std::io::Write;
use std::sync::Arc;

use credit_engine_rs::{
    CreditEngine, CreditStore, CsvLedger, EngineConfig, MemoryStore, Money, Rate,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    // transaction ledger the scorer reads from
    let ledger_path = std::env::temp_dir().join("quick_start_transactions.csv");
    let mut file = std::fs::File::create(&ledger_path)?;
    writeln!(file, "AADHARID,Transaction_type,Amount")?;
    writeln!(file, "111122223333,CREDIT,800000")?;
    writeln!(file, "111122223333,DEBIT,50000")?;
    drop(file);

    let store = Arc::new(MemoryStore::new());
    let engine = CreditEngine::new(
        store.clone(),
        Arc::new(CsvLedger::new(&ledger_path)),
        EngineConfig::default(),
    );

    // register; the score arrives from the background worker
    let person = engine.register_person(
        "111122223333".to_string(),
        "Asha Rao".to_string(),
        "asha@example.com".to_string(),
        Money::from_major(600_000),
    )?;
    println!("registered person {}", person.id);

    while store.person(person.id)?.credit_score.is_none() {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    println!("credit score: {:?}", store.person(person.id)?.credit_score);

    // originate a 100,000 loan at 12% over 12 months
    let offer = engine.apply_for_loan(
        person.id,
        Money::from_major(100_000),
        Rate::from_percentage(dec!(12)),
        12,
        credit_engine_rs::chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    )?;

    println!("loan {} originated, EMI {}", offer.loan_id, offer.plan.emi_amount);
    for installment in &offer.plan.installments {
        println!(
            "  {} due {} (principal {}, interest {})",
            installment.due_date,
            installment.amount_due,
            installment.principal_component,
            installment.interest_component
        );
    }

    engine.shutdown();
    Ok(())
}
