use crate::api::{MarketDataProvider, Notifier};
use crate::config::BotConfig;
use crate::error::BotError;
use crate::execution::{BarStore, OrderExecutor, PositionDecision, PositionTracker};
use crate::indicators::IndicatorSnapshot;
use crate::models::{PositionState, Signal, TradeAction, TradeRecord};
use crate::persistence::TradeLedger;
use crate::strategy::Strategy;
use crate::Result;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;

/// What one cycle saw and did
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub signal: Signal,
    pub decision: PositionDecision,
    pub price: f64,
    pub snapshot: IndicatorSnapshot,
    /// Ledger row written this cycle, if the signal was acted on
    pub record: Option<TradeRecord>,
}

/// Drives fetch -> compute -> detect -> act on a fixed interval
///
/// Owns the position tracker; it is the only writer of position state and of
/// the ledger. Cycles never overlap.
pub struct CycleOrchestrator<M, N, E> {
    config: BotConfig,
    market_data: M,
    notifier: N,
    executor: E,
    strategy: Box<dyn Strategy>,
    ledger: TradeLedger,
    bar_store: BarStore,
    tracker: PositionTracker,
}

impl<M, N, E> CycleOrchestrator<M, N, E>
where
    M: MarketDataProvider,
    N: Notifier,
    E: OrderExecutor,
{
    /// Build the orchestrator, rehydrating position state from the ledger
    /// when configured to
    pub fn new(
        config: BotConfig,
        market_data: M,
        notifier: N,
        executor: E,
        strategy: Box<dyn Strategy>,
        ledger: TradeLedger,
    ) -> Result<Self> {
        let tracker = if config.rehydrate_position {
            let summary = ledger.reconcile()?;
            if let Some(open) = &summary.open_position {
                tracing::info!(
                    "Ledger ends with an open BUY @ {} from {}; starting HOLDING",
                    open.price,
                    open.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
            PositionTracker::with_state(summary.position_state())
        } else {
            PositionTracker::new()
        };

        Ok(Self {
            bar_store: BarStore::new(config.bar_limit),
            config,
            market_data,
            notifier,
            executor,
            strategy,
            ledger,
            tracker,
        })
    }

    pub fn position(&self) -> PositionState {
        self.tracker.state()
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run cycles until Ctrl+C
    pub async fn run(&mut self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        })
        .await
    }

    /// Run cycles until `shutdown` completes
    ///
    /// Shutdown is observed both mid-cycle and while sleeping; the ledger
    /// append and the position commit sit between the same two await points,
    /// so an interrupted cycle never records one without the other. A failed
    /// cycle is logged and the loop moves on to the next one.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        tracing::info!(
            "🚀 Watching {} {} with {} every {}s (position: {})",
            self.config.symbol,
            self.config.timeframe,
            self.strategy.name(),
            self.config.poll_interval_secs,
            self.tracker.state()
        );

        loop {
            tokio::select! {
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        tracing::error!("[{}] Cycle failed: {}", Utc::now(), e);
                    }
                }
                _ = &mut shutdown => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = &mut shutdown => break,
            }
        }
    }

    /// One fetch -> compute -> detect -> act pass
    ///
    /// Errors leave position state and the ledger untouched.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let timeout = self.config.call_timeout();

        // FETCH
        let bars = bounded(
            "fetch_bars",
            timeout,
            self.market_data.fetch_bars(
                &self.config.symbol,
                &self.config.timeframe,
                self.config.bar_limit,
            ),
        )
        .await?;
        self.bar_store.replace(bars)?;

        // COMPUTE
        let price = self
            .bar_store
            .latest()
            .map(|bar| bar.close)
            .ok_or_else(|| BotError::MalformedData("provider returned no bars".into()))?;
        let closes = self.bar_store.closes();
        let (previous, current) = IndicatorSnapshot::pair(&closes, &self.config.indicators);

        tracing::info!(
            "Price: {:.2}, RSI: {}, EMA fast/slow: {}/{}, SMA short/long: {}/{}",
            price,
            fmt_opt(current.rsi),
            fmt_opt(current.ema_fast),
            fmt_opt(current.ema_slow),
            fmt_opt(current.sma_short),
            fmt_opt(current.sma_long)
        );

        // DETECT
        let signal = self
            .strategy
            .generate_signal(&previous, &current, self.tracker.state());
        let decision = self.tracker.decide(&signal);

        // ACT
        let record = match &decision {
            PositionDecision::Act(action) => {
                let rsi = current.rsi.ok_or_else(|| {
                    BotError::MalformedData(format!("{} signal without an RSI value", action))
                })?;
                Some(self.act(*action, price, rsi).await?)
            }
            PositionDecision::Skip { reason } => {
                if signal == Signal::Hold {
                    tracing::debug!("{} signal: {}", signal, reason);
                } else {
                    tracing::info!("{} signal ignored: {}", signal, reason);
                }
                None
            }
        };

        Ok(CycleReport {
            signal,
            decision,
            price,
            snapshot: current,
            record,
        })
    }

    /// Record the trade, move the position, then announce and execute
    ///
    /// The ledger append comes first; if it fails nothing else happens.
    /// Notification and order failures are logged and swallowed.
    async fn act(&mut self, action: TradeAction, price: f64, rsi: f64) -> Result<TradeRecord> {
        let record =
            TradeRecord::from_signal(Utc::now(), action, price, rsi, self.config.trade_amount);

        self.ledger.append(&record)?;
        self.tracker.commit(action);

        let message = signal_message(action, price, rsi);
        tracing::info!("{}", message);

        let timeout = self.config.call_timeout();

        if let Err(e) = bounded("notify", timeout, self.notifier.send(&message)).await {
            tracing::warn!("Failed to send notification: {}", e);
        }

        if let Err(e) = bounded(
            "place_order",
            timeout,
            self.executor
                .place_order(&self.config.symbol, action, self.config.trade_amount),
        )
        .await
        {
            tracing::error!("Order for recorded {} was not placed: {}", action, e);
        }

        Ok(record)
    }
}

/// Text sent to the notification destination
pub fn signal_message(action: TradeAction, price: f64, rsi: f64) -> String {
    format!("SIGNAL: {} | Price: ${:.2} | RSI: {:.2}", action, price, rsi)
}

async fn bounded<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| BotError::Timeout {
            operation,
            secs: limit.as_secs(),
        })?
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_message_format() {
        assert_eq!(
            signal_message(TradeAction::Buy, 43210.456, 28.1),
            "SIGNAL: BUY | Price: $43210.46 | RSI: 28.10"
        );
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result: Result<()> = bounded("slow_call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(BotError::Timeout {
                operation: "slow_call",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let result = bounded("fast_call", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(None), "n/a");
        assert_eq!(fmt_opt(Some(1.234)), "1.23");
    }
}
