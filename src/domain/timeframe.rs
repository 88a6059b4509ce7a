//! Joining hourly and daily price tables.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::error::SigtraderError;
use super::table::FeatureTable;

pub const HOURLY_SUFFIX: &str = "_1h";
pub const DAILY_SUFFIX: &str = "_d";

/// Inner-join `hourly` and `daily` on exact timestamp, suffixing every
/// column with `_1h` / `_d`, then drop rows with missing values.
///
/// Without a daily table the hourly columns are still suffixed so the
/// price column keeps its name.
pub fn merge_timeframes(
    hourly: &FeatureTable,
    daily: Option<&FeatureTable>,
) -> Result<FeatureTable, SigtraderError> {
    let hourly_times = timestamps(hourly, "hourly")?;

    let Some(daily) = daily else {
        warn!("no daily data; continuing with hourly columns only");
        let mut merged = FeatureTable::with_times(hourly_times.to_vec());
        copy_columns(&mut merged, hourly, HOURLY_SUFFIX, None)?;
        let dropped = merged.drop_incomplete_rows();
        if dropped > 0 {
            warn!(dropped, "dropped incomplete hourly rows");
        }
        return Ok(merged);
    };

    let daily_times = timestamps(daily, "daily")?;
    let daily_index: HashMap<NaiveDateTime, usize> = daily_times
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, i))
        .collect();

    let (hourly_rows, daily_rows): (Vec<usize>, Vec<usize>) = hourly_times
        .iter()
        .enumerate()
        .filter_map(|(i, t)| daily_index.get(t).map(|&j| (i, j)))
        .unzip();

    let times = hourly_rows.iter().map(|&i| hourly_times[i]).collect();
    let mut merged = FeatureTable::with_times(times);
    copy_columns(&mut merged, hourly, HOURLY_SUFFIX, Some(&hourly_rows))?;
    copy_columns(&mut merged, daily, DAILY_SUFFIX, Some(&daily_rows))?;

    let dropped = merged.drop_incomplete_rows();
    if dropped > 0 {
        warn!(dropped, "dropped incomplete merged rows");
    }
    info!(
        hourly = hourly.len(),
        daily = daily.len(),
        merged = merged.len(),
        dropped,
        "merged timeframes"
    );
    Ok(merged)
}

fn timestamps<'a>(
    table: &'a FeatureTable,
    name: &str,
) -> Result<&'a [NaiveDateTime], SigtraderError> {
    table.times().ok_or_else(|| SigtraderError::DataLoad {
        reason: format!("{} table has no timestamps", name),
    })
}

fn copy_columns(
    into: &mut FeatureTable,
    from: &FeatureTable,
    suffix: &str,
    rows: Option<&[usize]>,
) -> Result<(), SigtraderError> {
    for column in from.columns() {
        let values = match rows {
            Some(rows) => rows.iter().map(|&r| column.values[r]).collect(),
            None => column.values.clone(),
        };
        into.insert_column(&format!("{}{}", column.name, suffix), values)?;
    }
    Ok(())
}
