use crate::models::TradeAction;
use crate::Result;
use rust_decimal::Decimal;

/// Places orders for accepted trades
///
/// Invoked only after the trade has been written to the ledger.
#[allow(async_fn_in_trait)]
pub trait OrderExecutor {
    async fn place_order(&self, symbol: &str, action: TradeAction, amount: Decimal) -> Result<()>;
}

/// Advisory-only executor: logs the order it would have placed
#[derive(Debug, Clone, Default)]
pub struct PaperExecutor;

impl OrderExecutor for PaperExecutor {
    async fn place_order(&self, symbol: &str, action: TradeAction, amount: Decimal) -> Result<()> {
        tracing::info!(
            "Advisory only, no order placed: {} {} {}",
            action,
            amount,
            symbol
        );
        Ok(())
    }
}
