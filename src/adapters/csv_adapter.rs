//! CSV file data adapter.
//!
//! Reads exchange price exports (one banner line, then a header row, newest
//! row first) and reads/writes plain feature tables with an optional `time`
//! column.

use crate::domain::error::SigtraderError;
use crate::domain::table::{FeatureTable, TIME_COLUMN, TIME_FORMAT};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

/// Columns every exchange export must carry.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "Unix",
    "Date",
    "Symbol",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume BTC",
    "Volume USDT",
    "tradecount",
];

/// Non-numeric export columns dropped on load.
const TEXT_COLUMNS: [&str; 2] = ["Date", "Symbol"];

pub struct CsvAdapter {
    hourly_file: PathBuf,
    daily_file: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(hourly_file: PathBuf, daily_file: Option<PathBuf>) -> Self {
        Self {
            hourly_file,
            daily_file,
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_hourly(&self) -> Result<FeatureTable, SigtraderError> {
        load_price_file(&self.hourly_file)
    }

    fn load_daily(&self) -> Result<Option<FeatureTable>, SigtraderError> {
        self.daily_file
            .as_deref()
            .map(load_price_file)
            .transpose()
    }
}

fn read_file(path: &Path) -> Result<String, SigtraderError> {
    fs::read_to_string(path).map_err(|e| SigtraderError::DataLoad {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_error(path: &Path, line: u64, reason: String) -> SigtraderError {
    SigtraderError::DataParse {
        file: path.display().to_string(),
        line,
        reason,
    }
}

fn parse_value(path: &Path, line: u64, column: &str, raw: &str) -> Result<f64, SigtraderError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
        .map_err(|e| parse_error(path, line, format!("invalid {} value '{}': {}", column, raw, e)))
}

/// Load one exchange export. `Unix` (epoch milliseconds) becomes the row
/// timestamp, `Date` and `Symbol` are dropped, every other column is kept
/// as a number. Rows are returned oldest first.
pub fn load_price_file(path: &Path) -> Result<FeatureTable, SigtraderError> {
    let content = read_file(path)?;
    let body = content
        .split_once('\n')
        .map(|(_, rest)| rest)
        .unwrap_or("");

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| parse_error(path, 2, format!("CSV header error: {}", e)))?
        .clone();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(SigtraderError::missing_column(required));
        }
    }

    let unix_idx = headers.iter().position(|h| h == "Unix").unwrap_or_default();
    let numeric: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| *h != "Unix" && !TEXT_COLUMNS.contains(h))
        .collect();

    let mut times = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); numeric.len()];

    for result in rdr.records() {
        let record =
            result.map_err(|e| parse_error(path, 0, format!("CSV parse error: {}", e)))?;
        // +1 for the banner line
        let line = record.position().map_or(0, |p| p.line() + 1);

        let unix = record.get(unix_idx).unwrap_or("").trim();
        let millis: i64 = unix
            .parse()
            .map_err(|e| parse_error(path, line, format!("invalid Unix value '{}': {}", unix, e)))?;
        let time = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| parse_error(path, line, format!("Unix value {} out of range", millis)))?
            .naive_utc();
        times.push(time);

        for (slot, &(idx, name)) in numeric.iter().enumerate() {
            columns[slot].push(parse_value(path, line, name, record.get(idx).unwrap_or(""))?);
        }
    }

    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by_key(|&i| times[i]);

    let mut table = FeatureTable::with_times(order.iter().map(|&i| times[i]).collect());
    for ((_, name), values) in numeric.iter().zip(columns) {
        table.insert_column(name, order.iter().map(|&i| values[i]).collect())?;
    }
    Ok(table)
}

/// Read a plain feature table. A `time` column, if present, must use
/// `YYYY-MM-DD HH:MM:SS`; every other column must be numeric.
pub fn read_table(path: &Path) -> Result<FeatureTable, SigtraderError> {
    let content = read_file(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| parse_error(path, 1, format!("CSV header error: {}", e)))?
        .clone();

    let time_idx = headers.iter().position(|h| h == TIME_COLUMN);
    let value_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != time_idx)
        .collect();

    let mut times: Vec<NaiveDateTime> = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); value_columns.len()];
    let mut rows = 0;

    for result in rdr.records() {
        let record =
            result.map_err(|e| parse_error(path, 0, format!("CSV parse error: {}", e)))?;
        let line = record.position().map_or(0, |p| p.line());

        if let Some(idx) = time_idx {
            let raw = record.get(idx).unwrap_or("");
            let time = NaiveDateTime::parse_from_str(raw, TIME_FORMAT).map_err(|e| {
                parse_error(path, line, format!("invalid time '{}': {}", raw, e))
            })?;
            times.push(time);
        }
        for (slot, &(idx, name)) in value_columns.iter().enumerate() {
            columns[slot].push(parse_value(path, line, name, record.get(idx).unwrap_or(""))?);
        }
        rows += 1;
    }

    let mut table = match time_idx {
        Some(_) => FeatureTable::with_times(times),
        None => FeatureTable::with_len(rows),
    };
    for ((_, name), values) in value_columns.iter().zip(columns) {
        table.insert_column(name, values)?;
    }
    Ok(table)
}

/// Write `table` with a leading `time` column when it has timestamps.
/// Missing values are written as empty fields.
pub fn write_table(path: &Path, table: &FeatureTable) -> Result<(), SigtraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(std::io::Error::other)?;

    let mut header: Vec<&str> = Vec::with_capacity(table.columns().len() + 1);
    if table.times().is_some() {
        header.push(TIME_COLUMN);
    }
    header.extend(table.column_names());
    wtr.write_record(&header).map_err(std::io::Error::other)?;

    for row in 0..table.len() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if let Some(times) = table.times() {
            record.push(times[row].format(TIME_FORMAT).to_string());
        }
        for column in table.columns() {
            let v = column.values[row];
            record.push(if v.is_nan() { String::new() } else { v.to_string() });
        }
        wtr.write_record(&record).map_err(std::io::Error::other)?;
    }
    wtr.flush()?;
    Ok(())
}
