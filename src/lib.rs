// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod strategy;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::BotError;
pub use models::*;
pub use orchestrator::{CycleOrchestrator, CycleReport};
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
