//! aml-runner: headless screening demo/load runner.
//!
//! Usage:
//!   aml-runner --seed 12345 --count 5000 --db sars.db
//!   aml-runner --seed 12345 --sanctions lists.json

use aml_core::{
    config::AmlConfig,
    engine::{AmlEngine, ScreeningOutcome},
    notifier::LogNotifier,
    sanctions::SanctionLists,
    store::SqliteSarStore,
    types::{ContactInfo, Counterparty, Customer, PersonalInfo, Transaction, TransactionType},
};
use anyhow::Result;
use chrono::NaiveDate;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeSet;
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let count = parse_arg(&args, "--count", 1000u64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str());
    let sanctions_path = args
        .windows(2)
        .find(|w| w[0] == "--sanctions")
        .map(|w| w[1].as_str());

    println!("aml-runner");
    println!("  seed:   {seed}");
    println!("  count:  {count}");
    println!("  db:     {}", db.unwrap_or(":memory:"));
    println!();

    let lists = match sanctions_path {
        Some(path) => SanctionLists::load(path)?,
        None => demo_lists(),
    };

    let store = match db {
        Some(path) => SqliteSarStore::open(path)?,
        None => SqliteSarStore::in_memory()?,
    };

    let engine = AmlEngine::new(
        AmlConfig::default(),
        Arc::new(lists),
        Arc::new(store),
        Arc::new(LogNotifier),
    );

    let customers = demo_customers();
    let mut rng = Pcg64Mcg::seed_from_u64(seed);
    let mut failed = 0u64;

    for i in 0..count {
        let customer = &customers[next_below(&mut rng, customers.len() as u64) as usize];
        let mut txn = generate_transaction(i, customer, &mut rng);
        match engine.screen_transaction(&mut txn, customer) {
            ScreeningOutcome::Screened(result) => {
                if result.suspicious {
                    log::debug!(
                        "txn {} flagged: score={} flags={:?}",
                        result.transaction_id,
                        result.risk_score,
                        result.flags
                    );
                }
            }
            ScreeningOutcome::Skipped { .. } => {}
            ScreeningOutcome::Failed {
                transaction_id,
                error,
            } => {
                failed += 1;
                log::error!("screening failed for {transaction_id}: {error}");
            }
        }
    }

    print_summary(&engine, failed)?;
    Ok(())
}

fn print_summary(engine: &AmlEngine, failed: u64) -> Result<()> {
    let stats = engine.statistics();
    println!("=== RUN SUMMARY ===");
    println!("  screened:      {}", stats.total_transactions_screened);
    println!("  flagged:       {}", stats.flagged_transactions);
    println!("  sanction hits: {}", stats.sanction_hits);
    println!("  SARs filed:    {}", stats.sars_generated);
    println!("  failed:        {failed}");
    println!("  flag rate:     {:.2}%", stats.flag_rate * 100.0);

    let sars = engine.all_sars()?;
    if let Some(last) = sars.last() {
        println!();
        println!("=== LAST SAR ===");
        println!("  {}", last.sar_id);
        println!("  {}", last.description);
    }
    Ok(())
}

/// Built-in snapshot used when no --sanctions file is given.
fn demo_lists() -> SanctionLists {
    SanctionLists::new(
        [
            "SANCTIONED_PERSON_1".to_string(),
            "SANCTIONED_PERSON_2".to_string(),
        ],
        ["BLOCKED_ENTITY_LLC".to_string()],
        ["IR".to_string(), "KP".to_string(), "SY".to_string()],
    )
}

fn demo_customers() -> Vec<Customer> {
    let mk = |id: &str, first: &str, last: &str, nationality: &str| Customer {
        customer_id: id.into(),
        personal_info: PersonalInfo {
            first_name: first.into(),
            last_name: last.into(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or_default(),
            nationality: nationality.into(),
            address: "1 Demo Plaza".into(),
            contact: ContactInfo {
                email: format!("{}@example.com", id.to_lowercase()),
                phone: "555-0100".into(),
            },
        },
    };
    vec![
        mk("CUST-001", "Alice", "Moran", "US"),
        mk("CUST-002", "Bruno", "Keller", "DE"),
        mk("CUST-003", "Chiara", "Rossi", "IT"),
        mk("CUST-004", "Farid", "Nasseri", "IR"),
        mk("CUST-005", "Grace", "Liu", "SG"),
    ]
}

fn generate_transaction(i: u64, customer: &Customer, rng: &mut Pcg64Mcg) -> Transaction {
    let txn_type = match next_below(rng, 5) {
        0 => TransactionType::Deposit,
        1 => TransactionType::Withdrawal,
        2 => TransactionType::Transfer,
        3 => TransactionType::Payment,
        _ => TransactionType::Fee,
    };

    // Pareto-shaped amounts: mostly small, a heavy tail reaching the
    // reporting threshold.
    let u = (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
    let mut amount = 25.0 * u.max(1e-10).powf(-1.0 / 1.3);
    amount = (amount * 100.0).round() / 100.0;
    if amount > 50_000.0 {
        amount = 50_000.0;
    }

    // A sliver of traffic goes to a sanctioned counterparty.
    let counterparty = if next_below(rng, 200) == 0 {
        Some(Counterparty {
            name: "SANCTIONED_PERSON_1".into(),
        })
    } else if next_below(rng, 4) == 0 {
        Some(Counterparty {
            name: "Ordinary Trading Co".into(),
        })
    } else {
        None
    };

    Transaction {
        transaction_id: format!("TXN-{i:06}"),
        customer_id: customer.customer_id.clone(),
        amount,
        currency: "USD".into(),
        txn_type,
        description: format!("demo {} #{i}", txn_type.label()),
        counterparty,
        aml_flags: BTreeSet::new(),
        fraud_score: 0.0,
    }
}

fn next_below(rng: &mut Pcg64Mcg, n: u64) -> u64 {
    rng.next_u64() % n
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
