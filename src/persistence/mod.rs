pub mod reconcile;

pub use reconcile::{reconcile, Reconciliation, RoundTrip};

use crate::error::BotError;
use crate::models::TradeRecord;
use crate::Result;
use chrono::{NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Column layout of the ledger file. Other tools read this format.
pub const LEDGER_HEADER: [&str; 6] = ["timestamp", "action", "price", "rsi", "amount", "notes"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV ledger of executed signals
///
/// Each row is written with a single append and synced before `append`
/// returns. Readers only ever see complete rows: a trailing line without its
/// newline is a write in progress and is not returned.
#[derive(Debug, Clone)]
pub struct TradeLedger {
    path: PathBuf,
}

impl TradeLedger {
    /// Open the ledger, creating it with a header if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&encode_row(&LEDGER_HEADER)?)?;
                file.sync_all()?;
                tracing::info!("Created trade ledger at {}", path.display());
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::info!("Appending to existing trade ledger at {}", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. Every call adds exactly one row.
    pub fn append(&self, record: &TradeRecord) -> Result<()> {
        self.append_once(record).map_err(|e| {
            BotError::Persistence(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            "Recorded {} @ {} in {}",
            record.action,
            record.price,
            self.path.display()
        );
        Ok(())
    }

    fn append_once(&self, record: &TradeRecord) -> Result<()> {
        let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        let action = record.action.to_string();
        let price = record.price.to_string();
        let rsi = record.rsi.to_string();
        let amount = record.amount.to_string();

        let row = encode_row(&[
            timestamp.as_str(),
            action.as_str(),
            price.as_str(),
            rsi.as_str(),
            amount.as_str(),
            record.notes.as_str(),
        ])?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(&row)?;
        file.sync_data()?;
        Ok(())
    }

    /// Every well-formed record, oldest first
    pub fn read_all(&self) -> Result<Vec<TradeRecord>> {
        let content = fs::read(&self.path)?;
        Ok(parse_ledger(&content))
    }

    /// Pair recorded BUYs and SELLs into realized round trips
    pub fn reconcile(&self) -> Result<Reconciliation> {
        Ok(reconcile(&self.read_all()?))
    }
}

fn encode_row(fields: &[&str]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| BotError::Persistence(e.to_string()))
}

/// Parse ledger content, ignoring an unterminated last line and malformed rows
///
/// Works on raw bytes so a row with invalid UTF-8 only loses that row.
fn parse_ledger(content: &[u8]) -> Vec<TradeRecord> {
    let complete = match content.iter().rposition(|&b| b == b'\n') {
        Some(end) => &content[..=end],
        None => &content[..0],
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(complete);

    let mut records = Vec::new();
    for (index, row) in reader.byte_records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = index + 2;
        let parsed = row
            .map_err(|e| e.to_string())
            .and_then(|r| csv::StringRecord::from_byte_record(r).map_err(|e| e.to_string()))
            .and_then(|r| parse_row(&r));
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping malformed ledger row {}: {}", line, e),
        }
    }

    records
}

fn parse_row(row: &csv::StringRecord) -> std::result::Result<TradeRecord, String> {
    let field = |i: usize| {
        row.get(i)
            .map(str::trim)
            .ok_or_else(|| format!("missing column '{}'", LEDGER_HEADER[i]))
    };
    let decimal = |i: usize| -> std::result::Result<Decimal, String> {
        let raw = field(i)?;
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|e| format!("bad {} '{}': {}", LEDGER_HEADER[i], raw, e))
    };

    let naive = NaiveDateTime::parse_from_str(field(0)?, TIMESTAMP_FORMAT)
        .map_err(|e| format!("bad timestamp: {}", e))?;

    Ok(TradeRecord {
        timestamp: Utc.from_utc_datetime(&naive),
        action: field(1)?.parse()?,
        price: decimal(2)?,
        rsi: decimal(3)?,
        amount: decimal(4)?,
        notes: row.get(5).unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PositionState, TradeAction};
    use chrono::Duration;

    fn record(action: TradeAction, price: f64, minutes: i64) -> TradeRecord {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        TradeRecord::from_signal(
            start + Duration::minutes(minutes),
            action,
            price,
            42.5,
            Decimal::new(2, 0),
        )
    }

    #[test]
    fn test_open_creates_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");

        TradeLedger::open(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "timestamp,action,price,rsi,amount,notes\n");
    }

    #[test]
    fn test_open_existing_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");

        let ledger = TradeLedger::open(&path).unwrap();
        ledger.append(&record(TradeAction::Buy, 100.0, 0)).unwrap();

        let reopened = TradeLedger::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap().len(), 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("timestamp,action").count(), 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("ledger").join("trades.csv");
        TradeLedger::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TradeLedger::open(dir.path().join("trades.csv")).unwrap();

        ledger.append(&record(TradeAction::Buy, 100.0, 0)).unwrap();
        ledger.append(&record(TradeAction::Sell, 110.25, 15)).unwrap();

        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, TradeAction::Buy);
        assert_eq!(records[1].action, TradeAction::Sell);
        assert_eq!(records[1].price, Decimal::new(11025, 2));
        assert_eq!(records[1].rsi, Decimal::new(425, 1));
        assert_eq!(records[0].notes, "Signal match");
        assert_eq!(
            records[1].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_row_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let ledger = TradeLedger::open(&path).unwrap();

        ledger.append(&record(TradeAction::Buy, 43210.456, 0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert_eq!(row, "2024-03-01 12:00:00,BUY,43210.46,42.5,2,Signal match");
    }

    #[test]
    fn test_identical_records_are_not_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TradeLedger::open(dir.path().join("trades.csv")).unwrap();

        let buy = record(TradeAction::Buy, 100.0, 0);
        ledger.append(&buy).unwrap();
        ledger.append(&buy).unwrap();

        assert_eq!(ledger.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_unterminated_row_not_observed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let ledger = TradeLedger::open(&path).unwrap();
        ledger.append(&record(TradeAction::Buy, 100.0, 0)).unwrap();

        // Simulate a concurrent writer midway through a row
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"2024-03-01 12:15:00,SELL,11").unwrap();

        let records = ledger.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, TradeAction::Buy);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        fs::write(
            &path,
            "timestamp,action,price,rsi,amount,notes\n\
             2024-03-01 12:00:00,BUY,100,25.1,1,Signal match\n\
             not a date,SELL,110,71,1,\n\
             2024-03-01 12:30:00,HOLD,105,50,1,\n\
             2024-03-01 12:45:00,sell,110,75.2,1,manual edit\n",
        )
        .unwrap();

        let ledger = TradeLedger::open(&path).unwrap();
        let records = ledger.read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].action, TradeAction::Sell);
        assert_eq!(records[1].notes, "manual edit");
    }

    #[test]
    fn test_invalid_utf8_row_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");

        let mut content = b"timestamp,action,price,rsi,amount,notes\n\
            2024-03-01 12:00:00,BUY,100,25.1,1,Signal match\n\
            2024-03-01 12:15:00,SELL,110,71,1,caf"
            .to_vec();
        content.push(0xE9);
        content.extend_from_slice(b"\n2024-03-01 12:30:00,BUY,105,28,1,Signal match\n");
        fs::write(&path, content).unwrap();

        let ledger = TradeLedger::open(&path).unwrap();
        let records = ledger.read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].price, Decimal::new(100, 0));
        assert_eq!(records[1].price, Decimal::new(105, 0));
        let summary = ledger.reconcile().unwrap();
        assert_eq!(summary.position_state(), PositionState::Holding);
    }

    #[test]
    fn test_ledger_reconcile() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TradeLedger::open(dir.path().join("trades.csv")).unwrap();

        ledger.append(&record(TradeAction::Buy, 100.0, 0)).unwrap();
        ledger.append(&record(TradeAction::Sell, 110.0, 15)).unwrap();
        ledger.append(&record(TradeAction::Buy, 120.0, 30)).unwrap();

        let summary = ledger.reconcile().unwrap();
        assert_eq!(summary.round_trips.len(), 1);
        assert_eq!(summary.total_profit, Decimal::new(2000, 2));
        assert!(summary.open_position.is_some());
    }

    #[test]
    fn test_append_to_missing_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let ledger = TradeLedger::open(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let err = ledger.append(&record(TradeAction::Buy, 100.0, 0)).unwrap_err();
        assert!(err.is_fatal_for_act());
    }
}
