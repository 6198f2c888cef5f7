use crate::models::{PositionState, TradeAction, TradeRecord};
use rust_decimal::Decimal;

/// A BUY closed by the next SELL
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub buy: TradeRecord,
    pub sell: TradeRecord,
    pub profit: Decimal,
}

/// Realized profit reconstructed from the ledger
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    pub round_trips: Vec<RoundTrip>,
    pub total_profit: Decimal,
    /// Trailing BUY with no SELL yet; excluded from realized profit
    pub open_position: Option<TradeRecord>,
}

impl Reconciliation {
    /// Position implied by the ledger
    pub fn position_state(&self) -> PositionState {
        if self.open_position.is_some() {
            PositionState::Holding
        } else {
            PositionState::Flat
        }
    }
}

/// Pair each BUY with the next SELL, in ledger order
///
/// One position is open at a time. A BUY while one is already open does not
/// replace the entry: pairing is first-in, so profit is measured from the
/// earliest unmatched BUY rather than the most recent one. A SELL with nothing
/// open is ignored. Neither can happen with a ledger the bot wrote itself, but
/// hand-edited files can.
///
/// Profit per pair is `(sell.price - buy.price) * sell.amount`.
pub fn reconcile(records: &[TradeRecord]) -> Reconciliation {
    let mut round_trips = Vec::new();
    let mut open: Option<&TradeRecord> = None;

    for record in records {
        match (record.action, open) {
            (TradeAction::Buy, None) => open = Some(record),
            (TradeAction::Buy, Some(entry)) => {
                tracing::warn!(
                    "Ignoring BUY at {} while BUY from {} is still open",
                    record.timestamp,
                    entry.timestamp
                );
            }
            (TradeAction::Sell, Some(entry)) => {
                let profit = (record.price - entry.price) * record.amount;
                round_trips.push(RoundTrip {
                    buy: entry.clone(),
                    sell: record.clone(),
                    profit,
                });
                open = None;
            }
            (TradeAction::Sell, None) => {
                tracing::warn!("Ignoring SELL at {} with no open BUY", record.timestamp);
            }
        }
    }

    let total_profit = round_trips.iter().map(|t| t.profit).sum();

    Reconciliation {
        round_trips,
        total_profit,
        open_position: open.cloned(),
    }
}
