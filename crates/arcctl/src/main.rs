//! `arcctl` converts research-dataset descriptions from upstream sources
//! into ARCs and uploads them to the ingest API.
//!
//! Logs go to stderr; stdout carries exactly one JSON-LD run report. The
//! process exits 0 after a normal run even when individual records failed,
//! and non-zero only on configuration or infrastructure errors.

mod harvest;
mod sql_to_arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "arcctl", version, about)]
struct Arcctl {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
#[command(rename_all = "kebab-case")]
enum Command {
    /// Stream investigations out of the upstream database, build one ARC
    /// per investigation and upload each.
    SqlToArc(sql_to_arc::SqlToArcArgs),
    /// Harvest INSPIRE records from a CSW catalogue and upload them as ARCs.
    Harvest(harvest::HarvestArgs),
}

#[tokio::main]
async fn main() {
    let cli = Arcctl::parse();

    // An interrupt cancels the run: the producer stops, builds are dropped
    // and in-flight uploads aborted; the report is still emitted.
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    match cli.command {
        Command::SqlToArc(args) => sql_to_arc::run(args, cancel).await,
        Command::Harvest(args) => harvest::run(args, cancel).await,
    }
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received, cancelling the run");
        cancel.cancel();
    }
}
