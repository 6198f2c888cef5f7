use super::{ConflictPolicy, RsiThresholds, Strategy};
use crate::indicators::IndicatorSnapshot;
use crate::models::{PositionState, Signal};

/// RSI threshold strategy with SMA trend confirmation
///
/// - BUY when RSI is oversold, short SMA is above long SMA and we are flat
/// - SELL when RSI is overbought, short SMA is below long SMA and we hold
#[derive(Debug, Clone)]
pub struct ThresholdStrategy {
    thresholds: RsiThresholds,
    conflict: ConflictPolicy,
}

impl ThresholdStrategy {
    pub fn new(thresholds: RsiThresholds, conflict: ConflictPolicy) -> Self {
        Self {
            thresholds,
            conflict,
        }
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(RsiThresholds::default(), ConflictPolicy::default())
    }
}

impl Strategy for ThresholdStrategy {
    fn generate_signal(
        &self,
        _previous: &IndicatorSnapshot,
        current: &IndicatorSnapshot,
        position: PositionState,
    ) -> Signal {
        let (Some(rsi), Some(sma_short), Some(sma_long)) =
            (current.rsi, current.sma_short, current.sma_long)
        else {
            return Signal::Hold;
        };

        let buy = rsi < self.thresholds.oversold
            && sma_short > sma_long
            && position == PositionState::Flat;
        let sell = rsi > self.thresholds.overbought
            && sma_short < sma_long
            && position == PositionState::Holding;

        self.conflict.resolve(buy, sell)
    }

    fn name(&self) -> &str {
        "ThresholdStrategy"
    }
}
