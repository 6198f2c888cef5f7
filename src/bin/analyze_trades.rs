use anyhow::Context;
use clap::Parser;
use signalbot::persistence::TradeLedger;
use std::path::PathBuf;

/// Realized profit report for a trade ledger
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Ledger file written by the bot
    #[arg(default_value = "trades.csv")]
    ledger: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("signalbot=warn")
        .init();

    let args = Args::parse();

    if !args.ledger.exists() {
        anyhow::bail!("Ledger {} does not exist", args.ledger.display());
    }

    let ledger = TradeLedger::open(&args.ledger)
        .with_context(|| format!("Failed to open {}", args.ledger.display()))?;
    let summary = ledger.reconcile().context("Failed to read ledger")?;

    println!("\n═══════════════════════════════════════════════════════");
    println!("                  TRADE ANALYSIS");
    println!("═══════════════════════════════════════════════════════\n");

    if summary.round_trips.is_empty() {
        println!("No completed trades yet.");
    }

    for trip in &summary.round_trips {
        println!(
            "Bought at {} → Sold at {} | Profit: ${:.2}  ({} → {})",
            trip.buy.price,
            trip.sell.price,
            trip.profit,
            trip.buy.timestamp.format("%Y-%m-%d %H:%M"),
            trip.sell.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    if let Some(open) = &summary.open_position {
        println!(
            "\nOpen position: bought {} at {} on {} (not included in profit)",
            open.amount,
            open.price,
            open.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\nTOTAL PROFIT: ${:.2}", summary.total_profit);

    Ok(())
}
