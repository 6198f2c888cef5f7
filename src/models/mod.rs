use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV bar for one fixed interval of the tracked symbol
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// The trade this signal asks for, if any
    pub fn action(&self) -> Option<TradeAction> {
        match self {
            Signal::Buy => Some(TradeAction::Buy),
            Signal::Sell => Some(TradeAction::Sell),
            Signal::Hold => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Side of a recorded trade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeAction::Buy),
            "SELL" => Ok(TradeAction::Sell),
            other => Err(format!("unknown trade action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Holding,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::Holding => write!(f, "HOLDING"),
        }
    }
}

pub const DEFAULT_TRADE_NOTE: &str = "Signal match";

/// One row of the trade ledger. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: Decimal,
    pub rsi: Decimal,
    pub amount: Decimal,
    pub notes: String,
}

impl TradeRecord {
    /// Build a record from live indicator values, rounding price and RSI to
    /// cents the way the ledger stores them.
    pub fn from_signal(
        timestamp: DateTime<Utc>,
        action: TradeAction,
        price: f64,
        rsi: f64,
        amount: Decimal,
    ) -> Self {
        Self {
            timestamp,
            action,
            price: to_cents(price),
            rsi: to_cents(rsi),
            amount,
            notes: DEFAULT_TRADE_NOTE.to_string(),
        }
    }
}

fn to_cents(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default().round_dp(2)
}
