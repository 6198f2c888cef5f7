use super::MarketDataProvider;
use crate::error::BotError;
use crate::models::PriceBar;
use crate::Result;
use chrono::{TimeZone, Utc};
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

pub const BINANCE_API_BASE: &str = "https://api.binance.com";
const RATE_LIMIT_RPM: u32 = 600;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000;

type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot market-data client
///
/// Only the public klines endpoint is used. The API key, when present, is sent
/// as a header and never logged.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<BinanceRateLimiter>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl BinanceClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - REST endpoint, e.g. `https://api.binance.com`
    /// * `api_key` - Optional key sent as `X-MBX-APIKEY`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| BotError::Config("Binance API key is not a valid header".into()))?;
            headers.insert("X-MBX-APIKEY", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the retry policy (attempts include the first request)
    pub fn with_retry_policy(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// GET /api/v3/klines with retry and exponential backoff
    ///
    /// Malformed payloads are not retried.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<PriceBar>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.fetch_klines_once(symbol, interval, limit).await {
                Ok(bars) => {
                    if attempt > 1 {
                        tracing::info!(
                            "✓ Fetched {} {} klines after {} attempts",
                            symbol,
                            interval,
                            attempt
                        );
                    }
                    return Ok(bars);
                }
                Err(e @ BotError::MalformedData(_)) => return Err(e),
                Err(e) => {
                    if attempt < self.max_retries {
                        let backoff = self.initial_backoff * 2_u32.pow(attempt - 1);
                        tracing::warn!(
                            "Attempt {}/{} for {} klines failed: {}. Retrying in {}ms...",
                            attempt,
                            self.max_retries,
                            symbol,
                            e,
                            backoff.as_millis()
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BotError::Provider("all retry attempts failed".into())))
    }

    async fn fetch_klines_once(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<PriceBar>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BotError::Provider(format!(
                "Binance klines returned {}: {}",
                status, body
            )));
        }

        let body: Value = response.json().await?;
        let entries = body
            .as_array()
            .ok_or_else(|| BotError::MalformedData("klines response is not an array".into()))?;

        entries.iter().map(parse_kline).collect()
    }
}

impl MarketDataProvider for BinanceClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<PriceBar>> {
        self.get_klines(symbol, timeframe, count).await
    }
}

/// Parse one kline: [openTime, open, high, low, close, volume, closeTime, ...]
///
/// Binance sends prices as strings; numbers are accepted too.
fn parse_kline(entry: &Value) -> Result<PriceBar> {
    let fields = entry
        .as_array()
        .filter(|a| a.len() >= 6)
        .ok_or_else(|| BotError::MalformedData(format!("bad kline entry: {}", entry)))?;

    let open_time = fields[0]
        .as_i64()
        .ok_or_else(|| BotError::MalformedData(format!("bad kline open time: {}", fields[0])))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time)
        .single()
        .ok_or_else(|| {
            BotError::MalformedData(format!("kline open time out of range: {}", open_time))
        })?;

    Ok(PriceBar {
        timestamp,
        open: parse_number(&fields[1], "open")?,
        high: parse_number(&fields[2], "high")?,
        low: parse_number(&fields[3], "low")?,
        close: parse_number(&fields[4], "close")?,
        volume: parse_number(&fields[5], "volume")?,
    })
}

fn parse_number(value: &Value, name: &str) -> Result<f64> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| BotError::MalformedData(format!("bad kline {}: {}", name, value)))
}
