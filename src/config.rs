use crate::api::binance::BINANCE_API_BASE;
use crate::api::telegram::TELEGRAM_API_BASE;
use crate::error::BotError;
use crate::indicators::IndicatorConfig;
use crate::strategy::{ConflictPolicy, RsiThresholds, StrategyKind};
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "signalbot.toml";
const ENV_PREFIX: &str = "SIGNALBOT";

/// Runtime configuration, read once at startup and immutable afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub symbol: String,
    pub timeframe: String,
    /// Bars fetched per cycle
    pub bar_limit: usize,
    pub strategy: StrategyKind,
    pub indicators: IndicatorConfig,
    pub thresholds: RsiThresholds,
    pub conflict_policy: ConflictPolicy,
    pub trade_amount: Decimal,
    pub poll_interval_secs: u64,
    /// Upper bound on every external call (fetch, notify, order)
    pub call_timeout_secs: u64,
    pub ledger_path: PathBuf,
    /// Start HOLDING when the ledger ends with an unmatched BUY
    pub rehydrate_position: bool,
    pub binance: BinanceConfig,
    pub telegram: TelegramConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframe: "15m".to_string(),
            bar_limit: 100,
            strategy: StrategyKind::default(),
            indicators: IndicatorConfig::default(),
            thresholds: RsiThresholds::default(),
            conflict_policy: ConflictPolicy::default(),
            trade_amount: Decimal::new(1, 3),
            poll_interval_secs: 15 * 60,
            call_timeout_secs: 30,
            ledger_path: PathBuf::from("trades.csv"),
            rehydrate_position: true,
            binance: BinanceConfig::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinanceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub base_url: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: TELEGRAM_API_BASE.to_string(),
            bot_token: None,
            chat_id: None,
        }
    }
}

impl TelegramConfig {
    /// Token and chat id, when both are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token, chat))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("base_url", &self.base_url)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Layers, lowest precedence first:
    /// 1. built-in defaults
    /// 2. the config file (`signalbot.toml` unless a path is given; a given
    ///    path must exist)
    /// 3. `SIGNALBOT__*` variables, nested with `__`
    ///    (e.g. `SIGNALBOT__TELEGRAM__CHAT_ID`)
    /// 4. the historical `BINANCE_API_KEY`, `TELEGRAM_BOT_TOKEN` and
    ///    `TELEGRAM_CHAT_ID` variables, for credentials still unset
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::from(file).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: BotConfig = settings.try_deserialize()?;
        cfg.apply_credential_env(|key| std::env::var(key).ok());
        cfg.validate()?;

        Ok(cfg)
    }

    /// Fill unset credentials from the historical variable names
    pub fn apply_credential_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.binance.api_key.is_none() {
            self.binance.api_key = lookup("BINANCE_API_KEY");
        }
        if self.telegram.bot_token.is_none() {
            self.telegram.bot_token = lookup("TELEGRAM_BOT_TOKEN");
        }
        if self.telegram.chat_id.is_none() {
            self.telegram.chat_id = lookup("TELEGRAM_CHAT_ID");
        }
    }

    /// Reject settings the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(BotError::Config("symbol must not be empty".into()));
        }
        if self.timeframe.trim().is_empty() {
            return Err(BotError::Config("timeframe must not be empty".into()));
        }

        let ind = &self.indicators;
        if [ind.ema_fast, ind.ema_slow, ind.sma_short, ind.sma_long, ind.rsi_period].contains(&0) {
            return Err(BotError::Config("indicator windows must be positive".into()));
        }
        if ind.ema_fast >= ind.ema_slow {
            return Err(BotError::Config(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                ind.ema_fast, ind.ema_slow
            )));
        }
        if ind.sma_short >= ind.sma_long {
            return Err(BotError::Config(format!(
                "sma_short ({}) must be shorter than sma_long ({})",
                ind.sma_short, ind.sma_long
            )));
        }

        // The previous-bar snapshot needs the longest window one bar back
        let min_bars = ind.longest_window() + 1;
        if self.bar_limit < min_bars {
            return Err(BotError::Config(format!(
                "bar_limit {} is too small, need at least {}",
                self.bar_limit, min_bars
            )));
        }

        let t = &self.thresholds;
        if !(0.0..=100.0).contains(&t.oversold) || !(0.0..=100.0).contains(&t.overbought) {
            return Err(BotError::Config("RSI thresholds must be within 0..=100".into()));
        }
        if t.oversold >= t.overbought {
            tracing::warn!(
                "RSI oversold ({}) is not below overbought ({}); conflicts resolved by {:?}",
                t.oversold,
                t.overbought,
                self.conflict_policy
            );
        }

        if self.trade_amount <= Decimal::ZERO {
            return Err(BotError::Config("trade_amount must be positive".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(BotError::Config("poll_interval_secs must be positive".into()));
        }
        if self.call_timeout_secs == 0 {
            return Err(BotError::Config("call_timeout_secs must be positive".into()));
        }

        if self.telegram.bot_token.is_some() != self.telegram.chat_id.is_some() {
            return Err(BotError::Config(
                "telegram bot_token and chat_id must be set together".into(),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
