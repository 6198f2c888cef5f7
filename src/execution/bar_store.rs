use crate::error::BotError;
use crate::models::PriceBar;
use crate::Result;
use std::collections::VecDeque;

/// Rolling window of the most recent bars for the tracked symbol
///
/// Replaced wholesale every cycle with the freshly fetched window.
#[derive(Debug, Clone)]
pub struct BarStore {
    bars: VecDeque<PriceBar>,
    max_bars: usize,
}

impl BarStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `max_bars` - Maximum number of bars to keep (oldest are dropped)
    pub fn new(max_bars: usize) -> Self {
        Self {
            bars: VecDeque::with_capacity(max_bars),
            max_bars,
        }
    }

    /// Replace the window with a fresh fetch
    ///
    /// Bars must be oldest first with strictly increasing timestamps. On a
    /// shape error the previous window is left untouched.
    pub fn replace(&mut self, bars: Vec<PriceBar>) -> Result<()> {
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(BotError::MalformedData(format!(
                    "bars out of order or duplicated at {} -> {}",
                    pair[0].timestamp.format("%Y-%m-%d %H:%M:%S"),
                    pair[1].timestamp.format("%Y-%m-%d %H:%M:%S")
                )));
            }
        }

        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite()) {
            return Err(BotError::MalformedData(format!(
                "non-finite close at {}",
                bad.timestamp
            )));
        }

        let mut window: VecDeque<PriceBar> = bars.into();
        while window.len() > self.max_bars {
            window.pop_front();
        }
        self.bars = window;

        Ok(())
    }

    /// Closing prices, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.back()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn max_bars(&self) -> usize {
        self.max_bars
    }
}
