// Technical indicators module
// Implements EMA, SMA and RSI over a window of closes

pub mod moving_average;
pub mod rsi;

pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;

use serde::{Deserialize, Serialize};

/// Window lengths for every indicator the bot derives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            sma_short: 5,
            sma_long: 15,
            rsi_period: 14,
        }
    }
}

impl IndicatorConfig {
    /// Number of closes needed before every indicator is defined
    pub fn longest_window(&self) -> usize {
        [
            self.ema_fast,
            self.ema_slow,
            self.sma_short,
            self.sma_long,
            self.rsi_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Indicator values at one point in time
///
/// A `None` field means the window was longer than the available history.
/// That is an expected state, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn compute(closes: &[f64], config: &IndicatorConfig) -> Self {
        Self {
            ema_fast: calculate_ema(closes, config.ema_fast),
            ema_slow: calculate_ema(closes, config.ema_slow),
            sma_short: calculate_sma(closes, config.sma_short),
            sma_long: calculate_sma(closes, config.sma_long),
            rsi: calculate_rsi(closes, config.rsi_period),
        }
    }

    /// Snapshots for the previous bar and the latest bar
    ///
    /// The previous snapshot is computed over every close except the newest.
    pub fn pair(closes: &[f64], config: &IndicatorConfig) -> (Self, Self) {
        let previous = match closes.split_last() {
            Some((_, older)) => Self::compute(older, config),
            None => Self::default(),
        };
        (previous, Self::compute(closes, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_window_counts_rsi_difference() {
        let config = IndicatorConfig {
            ema_fast: 3,
            ema_slow: 5,
            sma_short: 2,
            sma_long: 4,
            rsi_period: 14,
        };
        assert_eq!(config.longest_window(), 15);
        assert_eq!(IndicatorConfig::default().longest_window(), 21);
    }

    #[test]
    fn test_snapshot_absent_with_short_history() {
        let closes = vec![100.0; 10];
        let snapshot = IndicatorSnapshot::compute(&closes, &IndicatorConfig::default());

        assert!(snapshot.ema_fast.is_some());
        assert!(snapshot.ema_slow.is_none());
        assert!(snapshot.sma_short.is_some());
        assert!(snapshot.sma_long.is_none());
        assert!(snapshot.rsi.is_none());
    }

    #[test]
    fn test_snapshot_pair_shifts_by_one_bar() {
        let closes: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let config = IndicatorConfig::default();
        let (previous, current) = IndicatorSnapshot::pair(&closes, &config);

        assert_eq!(previous.sma_short, Some(27.0)); // 25..=29
        assert_eq!(current.sma_short, Some(28.0)); // 26..=30
    }

    #[test]
    fn test_snapshot_pair_on_empty_closes() {
        let (previous, current) = IndicatorSnapshot::pair(&[], &IndicatorConfig::default());
        assert_eq!(previous, IndicatorSnapshot::default());
        assert_eq!(current, IndicatorSnapshot::default());
    }
}
