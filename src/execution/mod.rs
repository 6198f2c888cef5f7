// Bar window, position state and order execution
pub mod bar_store;
pub mod executor;
pub mod position_tracker;

pub use bar_store::BarStore;
pub use executor::{OrderExecutor, PaperExecutor};
pub use position_tracker::{PositionDecision, PositionTracker};
