use super::{ConflictPolicy, RsiThresholds, Strategy};
use crate::indicators::IndicatorSnapshot;
use crate::models::{PositionState, Signal};

/// EMA crossover strategy
///
/// - BUY when the fast EMA moves from strictly below the slow EMA to strictly
///   above it, and RSI is below the overbought level
/// - SELL when the fast EMA moves from strictly above the slow EMA to strictly
///   below it, and RSI is above the oversold level
///
/// Equal EMAs on either bar are not a cross.
///
/// Position state is not consulted here; the position tracker gates it.
#[derive(Debug, Clone)]
pub struct CrossoverStrategy {
    thresholds: RsiThresholds,
    conflict: ConflictPolicy,
}

impl CrossoverStrategy {
    pub fn new(thresholds: RsiThresholds, conflict: ConflictPolicy) -> Self {
        Self {
            thresholds,
            conflict,
        }
    }
}

impl Default for CrossoverStrategy {
    fn default() -> Self {
        Self::new(RsiThresholds::default(), ConflictPolicy::default())
    }
}

impl Strategy for CrossoverStrategy {
    fn generate_signal(
        &self,
        previous: &IndicatorSnapshot,
        current: &IndicatorSnapshot,
        _position: PositionState,
    ) -> Signal {
        let (Some(prev_fast), Some(prev_slow), Some(fast), Some(slow), Some(rsi)) = (
            previous.ema_fast,
            previous.ema_slow,
            current.ema_fast,
            current.ema_slow,
            current.rsi,
        ) else {
            return Signal::Hold;
        };

        let bullish_cross = prev_fast < prev_slow && fast > slow;
        let bearish_cross = prev_fast > prev_slow && fast < slow;

        let buy = bullish_cross && rsi < self.thresholds.overbought;
        let sell = bearish_cross && rsi > self.thresholds.oversold;

        tracing::debug!(
            "Crossover: EMA fast {:.4} -> {:.4}, slow {:.4} -> {:.4}, RSI={:.2}",
            prev_fast,
            fast,
            prev_slow,
            slow,
            rsi
        );

        self.conflict.resolve(buy, sell)
    }

    fn name(&self) -> &str {
        "CrossoverStrategy"
    }
}
