#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::table::{FeatureTable, PREDICTED_COLUMN};
use sigtrader::ports::data_port::DataPort;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const PRICE: &str = "Close_1h";

pub struct MockDataPort {
    pub hourly: FeatureTable,
    pub daily: Option<FeatureTable>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(hourly: FeatureTable) -> Self {
        Self {
            hourly,
            daily: None,
            error: None,
        }
    }

    pub fn with_daily(mut self, daily: FeatureTable) -> Self {
        self.daily = Some(daily);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_hourly(&self) -> Result<FeatureTable, SigtraderError> {
        if let Some(reason) = &self.error {
            return Err(SigtraderError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(self.hourly.clone())
    }

    fn load_daily(&self) -> Result<Option<FeatureTable>, SigtraderError> {
        Ok(self.daily.clone())
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn hourly_times(n: usize) -> Vec<NaiveDateTime> {
    (0..n).map(|i| start() + Duration::hours(i as i64)).collect()
}

pub fn daily_times(n: usize) -> Vec<NaiveDateTime> {
    (0..n).map(|i| start() + Duration::days(i as i64)).collect()
}

/// Deterministic wavy uptrend.
pub fn synthetic_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.25).sin() * 6.0 + (t * 0.07).cos() * 3.0 + t * 0.05
        })
        .collect()
}

/// Raw OHLCV-style table as a price file would load it.
pub fn raw_table(times: Vec<NaiveDateTime>) -> FeatureTable {
    let closes = synthetic_closes(times.len());
    let n = closes.len();
    FeatureTable::with_times(times)
        .with_column("Open", closes.iter().map(|c| c - 0.5).collect())
        .unwrap()
        .with_column("High", closes.iter().map(|c| c + 1.0).collect())
        .unwrap()
        .with_column("Low", closes.iter().map(|c| c - 1.0).collect())
        .unwrap()
        .with_column("Close", closes.clone())
        .unwrap()
        .with_column("Volume BTC", (0..n).map(|i| 10.0 + (i % 5) as f64).collect())
        .unwrap()
        .with_column("Volume USDT", closes.iter().map(|c| c * 10.0).collect())
        .unwrap()
        .with_column("tradecount", (0..n).map(|i| 1000.0 + (i % 13) as f64).collect())
        .unwrap()
}

/// Sequence-indexed table with a price column and explicit predictions.
pub fn signal_table(prices: &[f64], predictions: &[u8]) -> FeatureTable {
    FeatureTable::with_len(prices.len())
        .with_column(PRICE, prices.to_vec())
        .unwrap()
        .with_column(
            PREDICTED_COLUMN,
            predictions.iter().map(|&p| f64::from(p)).collect(),
        )
        .unwrap()
}

/// Exchange export text for `table` (banner line, header, newest first).
pub fn export_csv(table: &FeatureTable) -> String {
    let times = table.times().unwrap();
    let mut out = String::from("https://www.cryptodatadownload.com\n");
    out.push_str("Unix,Date,Symbol,Open,High,Low,Close,Volume BTC,Volume USDT,tradecount\n");
    for row in (0..table.len()).rev() {
        let value = |name: &str| table.column(name).unwrap()[row];
        writeln!(
            out,
            "{},{},BTCUSDT,{},{},{},{},{},{},{}",
            times[row].and_utc().timestamp_millis(),
            times[row].format("%Y-%m-%d %H:%M:%S"),
            value("Open"),
            value("High"),
            value("Low"),
            value("Close"),
            value("Volume BTC"),
            value("Volume USDT"),
            value("tradecount"),
        )
        .unwrap();
    }
    out
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
