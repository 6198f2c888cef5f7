// Trading strategy module
pub mod crossover;
pub mod threshold;

pub use crossover::CrossoverStrategy;
pub use threshold::ThresholdStrategy;

use crate::indicators::IndicatorSnapshot;
use crate::models::{PositionState, Signal};
use serde::{Deserialize, Serialize};

/// Base trait for signal detection policies
///
/// Implementations are pure: the same snapshots and position always give the
/// same signal. Any absent indicator a policy consults yields `Signal::Hold`.
pub trait Strategy: Send + Sync {
    /// Generate a trading signal from two consecutive snapshots
    fn generate_signal(
        &self,
        previous: &IndicatorSnapshot,
        current: &IndicatorSnapshot,
        position: PositionState,
    ) -> Signal;

    /// Get strategy name
    fn name(&self) -> &str;
}

/// Which detection policy the bot runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// EMA fast/slow crossover confirmed by RSI
    #[default]
    Crossover,
    /// RSI extremes confirmed by SMA short/long ordering
    Threshold,
}

/// What to do when BUY and SELL conditions hold at the same time
///
/// Neither built-in policy can raise both at once; custom strategies may.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    BuyFirst,
    Hold,
}

impl ConflictPolicy {
    pub(crate) fn resolve(self, buy: bool, sell: bool) -> Signal {
        match (buy, sell) {
            (true, true) => match self {
                ConflictPolicy::BuyFirst => Signal::Buy,
                ConflictPolicy::Hold => {
                    tracing::warn!("BUY and SELL conditions both met, holding");
                    Signal::Hold
                }
            },
            (true, false) => Signal::Buy,
            (false, true) => Signal::Sell,
            (false, false) => Signal::Hold,
        }
    }
}

/// RSI levels shared by both policies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RsiThresholds {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// Build the configured strategy
pub fn build_strategy(
    kind: StrategyKind,
    thresholds: RsiThresholds,
    conflict: ConflictPolicy,
) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Crossover => Box::new(CrossoverStrategy::new(thresholds, conflict)),
        StrategyKind::Threshold => Box::new(ThresholdStrategy::new(thresholds, conflict)),
    }
}
