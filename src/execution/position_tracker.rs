use crate::models::{PositionState, Signal, TradeAction};

/// Outcome of offering a signal to the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum PositionDecision {
    Act(TradeAction),
    Skip { reason: String },
}

/// Flat/holding state machine for the single tracked position
///
/// A BUY is actionable only when flat and a SELL only when holding.
/// `decide` never mutates; `commit` applies the transition once the trade has
/// been recorded.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    state: PositionState,
}

impl PositionTracker {
    /// Start flat (no position assumed on process start)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PositionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn is_holding(&self) -> bool {
        self.state == PositionState::Holding
    }

    /// Decide whether a signal should be acted on
    pub fn decide(&self, signal: &Signal) -> PositionDecision {
        match (signal, self.state) {
            (Signal::Buy, PositionState::Flat) => PositionDecision::Act(TradeAction::Buy),
            (Signal::Sell, PositionState::Holding) => PositionDecision::Act(TradeAction::Sell),
            (Signal::Buy, PositionState::Holding) => PositionDecision::Skip {
                reason: "Already holding a position".to_string(),
            },
            (Signal::Sell, PositionState::Flat) => PositionDecision::Skip {
                reason: "No position to sell".to_string(),
            },
            (Signal::Hold, _) => PositionDecision::Skip {
                reason: "Hold signal".to_string(),
            },
        }
    }

    /// Apply the transition for an accepted trade
    pub fn commit(&mut self, action: TradeAction) {
        let next = match action {
            TradeAction::Buy => PositionState::Holding,
            TradeAction::Sell => PositionState::Flat,
        };

        if self.state == next {
            tracing::warn!("Committing {} while already {}", action, self.state);
        }

        tracing::info!("Position {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_flat() {
        let tracker = PositionTracker::new();
        assert_eq!(tracker.state(), PositionState::Flat);
        assert!(!tracker.is_holding());
    }

    #[test]
    fn test_buy_when_flat_then_duplicate_buy_skipped() {
        let mut tracker = PositionTracker::new();

        assert_eq!(
            tracker.decide(&Signal::Buy),
            PositionDecision::Act(TradeAction::Buy)
        );
        tracker.commit(TradeAction::Buy);
        assert_eq!(tracker.state(), PositionState::Holding);

        match tracker.decide(&Signal::Buy) {
            PositionDecision::Skip { reason } => assert!(reason.contains("Already")),
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(tracker.state(), PositionState::Holding);
    }

    #[test]
    fn test_sell_when_flat_skipped() {
        let tracker = PositionTracker::new();
        match tracker.decide(&Signal::Sell) {
            PositionDecision::Skip { reason } => assert!(reason.contains("No position")),
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn test_sell_when_holding_goes_flat() {
        let mut tracker = PositionTracker::with_state(PositionState::Holding);
        assert_eq!(
            tracker.decide(&Signal::Sell),
            PositionDecision::Act(TradeAction::Sell)
        );
        tracker.commit(TradeAction::Sell);
        assert_eq!(tracker.state(), PositionState::Flat);
    }

    #[test]
    fn test_hold_never_acts() {
        for state in [PositionState::Flat, PositionState::Holding] {
            let tracker = PositionTracker::with_state(state);
            assert!(matches!(
                tracker.decide(&Signal::Hold),
                PositionDecision::Skip { .. }
            ));
        }
    }

    #[test]
    fn test_accepted_actions_alternate() {
        let mut tracker = PositionTracker::new();
        let signals = [
            Signal::Buy,
            Signal::Buy,
            Signal::Hold,
            Signal::Sell,
            Signal::Sell,
            Signal::Buy,
            Signal::Sell,
        ];

        let mut accepted = Vec::new();
        for signal in signals {
            if let PositionDecision::Act(action) = tracker.decide(&signal) {
                tracker.commit(action);
                accepted.push(action);
            }
        }

        assert_eq!(
            accepted,
            vec![
                TradeAction::Buy,
                TradeAction::Sell,
                TradeAction::Buy,
                TradeAction::Sell
            ]
        );
    }
}
