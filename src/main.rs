//! Kokkai Ingest — Binary Entrypoint
//! Loads configuration, wires router + collectors, runs one ingestion batch
//! read from a JSON request file, and prints the batch summary.
//!
//! Usage: `kokkai-ingest <requests.json>` where the file holds an array of
//! ingestion requests, e.g. `[{"meeting_date": "2025-03-14"}]`.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kokkai_ingest::{build_coordinator, IngestConfig, IngestionRequest};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kokkai_ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .context("usage: kokkai-ingest <requests.json>")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading request batch from {path}"))?;
    let requests: Vec<IngestionRequest> =
        serde_json::from_str(&raw).context("parsing request batch JSON")?;

    let cfg = IngestConfig::load_default().context("loading ingest config")?;
    let coordinator = build_coordinator(&cfg)?;

    let outcome = coordinator.ingest_batch(requests, None).await;
    let summary = outcome.summary();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!(
        "routing stats: {}",
        serde_json::to_string(&coordinator.router().stats().snapshot())?
    );

    if !outcome.failures.is_empty() {
        // Non-zero exit so operators notice; failed requests are listed in
        // the summary for targeted resubmission.
        std::process::exit(1);
    }
    Ok(())
}
