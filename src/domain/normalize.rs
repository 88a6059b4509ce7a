//! Column scaling.

use std::fmt;
use std::str::FromStr;

use super::error::SigtraderError;
use super::table::FeatureTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMethod {
    MinMax,
    ZScore,
}

impl FromStr for NormalizeMethod {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minmax" => Ok(NormalizeMethod::MinMax),
            "zscore" => Ok(NormalizeMethod::ZScore),
            other => Err(SigtraderError::invalid_parameter(
                "normalize",
                format!("unknown method '{}', expected minmax or zscore", other),
            )),
        }
    }
}

impl fmt::Display for NormalizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeMethod::MinMax => write!(f, "minmax"),
            NormalizeMethod::ZScore => write!(f, "zscore"),
        }
    }
}

/// Scale `columns` in place, or every column when `columns` is `None`.
///
/// NaN values are ignored when computing the statistics and stay NaN.
/// A constant column scales to all zeros under either method.
pub fn normalize(
    table: &mut FeatureTable,
    method: NormalizeMethod,
    columns: Option<&[&str]>,
) -> Result<(), SigtraderError> {
    let names: Vec<String> = match columns {
        Some(names) => {
            for name in names {
                table.require_column(name)?;
            }
            names.iter().map(|n| n.to_string()).collect()
        }
        None => table.column_names().into_iter().map(String::from).collect(),
    };

    for name in &names {
        if let Some(values) = table.column_mut(name) {
            match method {
                NormalizeMethod::MinMax => min_max(values),
                NormalizeMethod::ZScore => z_score(values),
            }
        }
    }
    Ok(())
}

fn min_max(values: &mut [f64]) {
    let (lo, hi) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    for v in values.iter_mut().filter(|v| !v.is_nan()) {
        *v = if range > 0.0 { (*v - lo) / range } else { 0.0 };
    }
}

fn z_score(values: &mut [f64]) {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let std = (present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    for v in values.iter_mut().filter(|v| !v.is_nan()) {
        *v = if std > 0.0 { (*v - mean) / std } else { 0.0 };
    }
}
