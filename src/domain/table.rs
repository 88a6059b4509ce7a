//! Column-oriented, time-ordered feature table.
//!
//! Every column holds one `f64` per row; `NaN` marks a missing value. The row
//! index is either a timestamp per row or, when the source had none, the
//! row's sequence position.

use chrono::NaiveDateTime;
use std::fmt;

use super::error::SigtraderError;

/// Ordering key of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowKey {
    Seq(usize),
    Time(NaiveDateTime),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Seq(i) => write!(f, "{}", i),
            RowKey::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
        }
    }
}

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const TIME_COLUMN: &str = "time";
pub const TARGET_COLUMN: &str = "target";
pub const PREDICTED_COLUMN: &str = "predicted";
pub const PNL_COLUMN: &str = "PnL";

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    times: Option<Vec<NaiveDateTime>>,
    len: usize,
    columns: Vec<Column>,
}

impl FeatureTable {
    /// Empty table indexed by sequence position.
    pub fn with_len(len: usize) -> Self {
        Self {
            times: None,
            len,
            columns: Vec::new(),
        }
    }

    /// Empty table indexed by timestamp.
    pub fn with_times(times: Vec<NaiveDateTime>) -> Self {
        Self {
            len: times.len(),
            times: Some(times),
            columns: Vec::new(),
        }
    }

    /// Builder form of [`FeatureTable::insert_column`].
    pub fn with_column(
        mut self,
        name: &str,
        values: Vec<f64>,
    ) -> Result<Self, SigtraderError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Append a column, replacing any existing column with the same name.
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<(), SigtraderError> {
        if values.len() != self.len {
            return Err(SigtraderError::DataLoad {
                reason: format!(
                    "column {} has {} values, table has {} rows",
                    name,
                    values.len(),
                    self.len
                ),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.values)
    }

    pub fn require_column(&self, name: &str) -> Result<&[f64], SigtraderError> {
        self.column(name)
            .ok_or_else(|| SigtraderError::missing_column(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column names that are not in `excluding`, in table order.
    pub fn feature_names(&self, excluding: &[&str]) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !excluding.contains(&c.name.as_str()))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn times(&self) -> Option<&[NaiveDateTime]> {
        self.times.as_deref()
    }

    pub fn row_key(&self, row: usize) -> RowKey {
        match &self.times {
            Some(t) => RowKey::Time(t[row]),
            None => RowKey::Seq(row),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keep only rows whose mask entry is true. Row order is preserved.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.len);
        let keep = |values: &mut Vec<f64>| {
            let mut it = mask.iter();
            values.retain(|_| *it.next().unwrap_or(&false));
        };
        for column in &mut self.columns {
            keep(&mut column.values);
        }
        if let Some(times) = &mut self.times {
            let mut it = mask.iter();
            times.retain(|_| *it.next().unwrap_or(&false));
        }
        self.len = mask.iter().filter(|&&m| m).count();
    }

    /// Remove every row that has a `NaN` in any column. Returns the number
    /// of rows removed.
    pub fn drop_incomplete_rows(&mut self) -> usize {
        let mask: Vec<bool> = (0..self.len)
            .map(|row| self.columns.iter().all(|c| !c.values[row].is_nan()))
            .collect();
        let before = self.len;
        self.retain_rows(&mask);
        before - self.len
    }
}
