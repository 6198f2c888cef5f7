// External collaborators: market data and notifications
pub mod binance;
pub mod telegram;

pub use binance::BinanceClient;
pub use telegram::TelegramNotifier;

use crate::models::PriceBar;
use crate::Result;

/// Source of price bars for one symbol and timeframe
#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// Fetch the most recent `count` bars, oldest first
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<PriceBar>>;
}

/// Best-effort text delivery
///
/// Failures are returned to the caller, which logs them and carries on.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, text: &str) -> Result<()>;
}

/// An unconfigured destination silently succeeds
impl<N: Notifier> Notifier for Option<N> {
    async fn send(&self, text: &str) -> Result<()> {
        match self {
            Some(notifier) => notifier.send(text).await,
            None => {
                tracing::debug!("No notification destination configured, skipping: {}", text);
                Ok(())
            }
        }
    }
}
