use anyhow::Context;
use clap::Parser;
use signalbot::api::{BinanceClient, TelegramNotifier};
use signalbot::config::BotConfig;
use signalbot::execution::PaperExecutor;
use signalbot::orchestrator::CycleOrchestrator;
use signalbot::persistence::TradeLedger;
use signalbot::strategy::build_strategy;
use std::path::PathBuf;

/// Indicator-driven signal bot for a single instrument
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file (defaults to ./signalbot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();

    let config = BotConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing::info!("\n📊 Configuration:");
    tracing::info!("  Symbol: {} ({})", config.symbol, config.timeframe);
    tracing::info!("  Strategy: {:?}", config.strategy);
    tracing::info!("  Trade Amount: {}", config.trade_amount);
    tracing::info!("  Poll Interval: {}s", config.poll_interval_secs);
    tracing::info!("  Ledger: {}", config.ledger_path.display());

    let market_data = BinanceClient::new(
        &config.binance.base_url,
        config.binance.api_key.as_deref(),
        config.call_timeout(),
    )
    .context("Failed to build Binance client")?;

    let notifier = match config.telegram.credentials() {
        Some((token, chat_id)) => Some(
            TelegramNotifier::new(&config.telegram.base_url, token, chat_id, config.call_timeout())
                .context("Failed to build Telegram notifier")?,
        ),
        None => {
            tracing::warn!("Telegram not configured, signals will only be logged");
            None
        }
    };

    let ledger = TradeLedger::open(&config.ledger_path).with_context(|| {
        format!("Failed to open trade ledger {}", config.ledger_path.display())
    })?;

    let strategy = build_strategy(config.strategy, config.thresholds, config.conflict_policy);

    let mut orchestrator =
        CycleOrchestrator::new(config, market_data, notifier, PaperExecutor, strategy, ledger)
            .context("Failed to initialise cycle orchestrator")?;

    if args.once {
        let report = orchestrator.run_cycle().await.context("Cycle failed")?;
        tracing::info!(
            "Cycle complete: {} at {:.2} (position: {})",
            report.signal,
            report.price,
            orchestrator.position()
        );
        return Ok(());
    }

    orchestrator.run().await;

    tracing::info!("👋 Signal bot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("signalbot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
