//! Fundtrace CLI
//!
//! A demo driver for the donation ledger: seeds a registry, runs the
//! money-in/money-out flows end to end and prints the resulting state,
//! plus journal inspection and config printing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal_macros::dec;

use fundtrace_core::{Amount, IdKind, TrackingId, UnitScore};
use fundtrace_engine::{
    DonationRecorder, DonationRequest, EngineConfig, HistoryFilter, LedgerQueries,
    StaticFraudScorer, StaticReasonVerifier, WithdrawalProcessor, WithdrawalRequest,
};
use fundtrace_registry::{Campaign, Donor, Organization, Registry};
use fundtrace_sync::{Journal, Outbox, Reconciler};

#[derive(Parser)]
#[command(name = "fundtrace")]
#[command(about = "Donation transparency ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted end-to-end flow against a fresh registry
    Demo {
        /// Journal file; in-memory when omitted
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Engine config file (JSON); defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the events recorded in a journal file
    Journal {
        /// Path to the journal file
        path: PathBuf,
    },
    /// Print the effective engine configuration
    Config {
        /// Config file to load before printing; defaults when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo { journal, config } => run_demo(journal, config).await,
        Commands::Journal { path } => print_journal(path),
        Commands::Config { file } => print_config(file),
    }
}

fn load_config(file: Option<PathBuf>) -> anyhow::Result<EngineConfig> {
    match file {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn print_config(file: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(file)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_journal(path: PathBuf) -> anyhow::Result<()> {
    let journal =
        Journal::new(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let events = journal.read_all().context("failed to read journal")?;
    println!("=== Journal: {} ({} events) ===", path.display(), events.len());
    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

async fn run_demo(journal: Option<PathBuf>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let registry = Arc::new(Registry::new());
    let journal = match journal {
        Some(path) => Journal::new(&path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => Journal::in_memory(),
    }
    .into_shared();
    let outbox = Arc::new(Outbox::new(registry.clone(), journal.clone()));

    // Seed: one organization, one donor, one campaign
    let org_id = TrackingId::generate(IdKind::Organization);
    registry
        .register_organization(Organization::new(
            org_id.clone(),
            "Global Relief Foundation",
            true,
        ))
        .await?;

    let donor_id = TrackingId::generate(IdKind::Donor);
    registry
        .register_donor(Donor::new(donor_id.clone(), "Alice"))
        .await?;

    let campaign = Campaign::create(
        org_id.clone(),
        "Emergency Flood Relief",
        Amount::new(dec!(100000))?,
        vec![
            ("Medical Supplies".to_string(), Amount::new(dec!(40000))?),
            ("Food & Water".to_string(), Amount::new(dec!(35000))?),
            ("Shelter".to_string(), Amount::new(dec!(25000))?),
        ],
    )?;
    let campaign_id = registry.insert_campaign(campaign).await?;
    println!("Seeded campaign {}", campaign_id);

    let recorder = DonationRecorder::new(
        registry.clone(),
        outbox.clone(),
        Arc::new(StaticFraudScorer::with_risk(UnitScore::new(dec!(0.05)))),
        config.clone(),
    );
    let processor = WithdrawalProcessor::new(
        registry.clone(),
        outbox.clone(),
        Arc::new(StaticReasonVerifier::with_score(UnitScore::new(dec!(0.92)))),
        config,
    );
    let queries = LedgerQueries::new(registry.clone());

    // Money in
    for (category, value) in [
        ("Medical Supplies", dec!(12000)),
        ("Food & Water", dec!(8000)),
        ("Shelter", dec!(5000)),
    ] {
        let receipt = recorder
            .record(DonationRequest {
                campaign_id: campaign_id.clone(),
                donor_id: donor_id.clone(),
                category: category.to_string(),
                amount: Amount::new(value)?,
                transaction_id: None,
            })
            .await?;
        println!(
            "Donation {} to '{}': {} (score {})",
            receipt.transaction_id, category, value, receipt.verification_score
        );
    }

    // Money out
    let receipt = processor
        .process(WithdrawalRequest {
            campaign_id: campaign_id.clone(),
            org_id: org_id.clone(),
            category: "Medical Supplies".to_string(),
            amount: Amount::new(dec!(9000))?,
            reason: "Emergency medical kits and field dressings".to_string(),
            transaction_id: None,
        })
        .await?;
    println!(
        "Withdrawal {}: compliant={} score={}",
        receipt.transaction_id, receipt.compliant, receipt.verification_score
    );

    // Over-budget attempt, refused before commit
    let refused = processor
        .process(WithdrawalRequest {
            campaign_id: campaign_id.clone(),
            org_id: org_id.clone(),
            category: "Shelter".to_string(),
            amount: Amount::new(dec!(30000))?,
            reason: "Prefabricated shelter units".to_string(),
            transaction_id: None,
        })
        .await;
    if let Err(err) = refused {
        tracing::warn!(error = %err, "over-budget withdrawal refused");
        println!("Refused as expected: {}", err);
    }

    // Read side
    for category in ["Medical Supplies", "Food & Water", "Shelter"] {
        let summary = queries.compliance(&campaign_id, category).await?;
        println!(
            "{}: allocated={} spent={} remaining={} utilization={}% compliant={}",
            category,
            summary.allocated_amount,
            summary.spent_amount,
            summary.remaining_amount,
            summary.utilization_rate,
            summary.is_compliant
        );
    }

    let history = queries.history(&campaign_id, HistoryFilter::All).await?;
    println!(
        "History: {} donations, {} withdrawals",
        history.donations.len(),
        history.withdrawals.len()
    );

    // Sweep; clean when every propagation landed
    let report = Reconciler::new(registry.clone(), journal.clone())
        .run()
        .await?;
    println!(
        "Reconcile: {} campaigns, {} organizations, {} repaired",
        report.campaigns_checked,
        report.organizations_checked,
        report.repaired.len()
    );

    let org = registry.organization(&org_id).await?;
    let org = org.lock().await;
    println!(
        "Organization '{}': raised={} withdrawn={} trust={}",
        org.name, org.total_raised, org.total_withdrawn, org.overall_trust_score
    );

    let events = journal.lock().await.read_all()?;
    println!("Journal holds {} events", events.len());
    Ok(())
}
