use thiserror::Error;

/// Errors raised by the bot's components
///
/// Only `Config` is fatal, and only at startup. Everything else is contained
/// to the cycle (or the step of the cycle) that produced it.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("malformed market data: {0}")]
    MalformedData(String),

    #[error("ledger write failed: {0}")]
    Persistence(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl BotError {
    /// Ledger failures must abort the whole ACT step so position state never
    /// diverges from what was recorded.
    pub fn is_fatal_for_act(&self) -> bool {
        matches!(self, BotError::Persistence(_))
    }
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}
