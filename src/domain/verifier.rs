//! Dataset sanity checks run before training.

use std::collections::BTreeMap;
use std::fmt;

use super::table::FeatureTable;

/// Narrowest type every non-missing value of a column satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnKind {
    Binary,
    Integer,
    Float,
}

impl ColumnKind {
    fn of(values: &[f64]) -> ColumnKind {
        let mut kind = ColumnKind::Binary;
        for &v in values.iter().filter(|v| !v.is_nan()) {
            if v != 0.0 && v != 1.0 {
                if v.fract() == 0.0 && v.is_finite() {
                    kind = kind.max(ColumnKind::Integer);
                } else {
                    return ColumnKind::Float;
                }
            }
        }
        kind
    }

    /// Whether a column of kind `self` is acceptable where `expected` is
    /// required (binary is an integer, integer is a float).
    pub fn satisfies(self, expected: ColumnKind) -> bool {
        self <= expected
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Binary => write!(f, "binary"),
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Float => write!(f, "float"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissingSummary {
    pub total_missing: usize,
    pub missing_by_column: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatch {
    pub column: String,
    /// `None` when the column is absent.
    pub actual: Option<ColumnKind>,
    pub expected: ColumnKind,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {}, found {}",
                self.column, self.expected, actual
            ),
            None => write!(f, "{}: expected {}, column missing", self.column, self.expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub rows: usize,
    pub columns: usize,
    pub missing: MissingSummary,
    pub kinds: Vec<(String, ColumnKind)>,
    pub mismatches: Vec<TypeMismatch>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.missing.total_missing == 0 && self.mismatches.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} rows x {} columns", self.rows, self.columns)?;
        writeln!(f, "Missing values: {}", self.missing.total_missing)?;
        for (column, count) in &self.missing.missing_by_column {
            writeln!(f, "  {:<20} {}", column, count)?;
        }
        writeln!(f, "Column kinds:")?;
        for (column, kind) in &self.kinds {
            writeln!(f, "  {:<20} {}", column, kind)?;
        }
        if !self.mismatches.is_empty() {
            writeln!(f, "Type mismatches:")?;
            for m in &self.mismatches {
                writeln!(f, "  {}", m)?;
            }
        }
        Ok(())
    }
}

pub fn check_missing_values(table: &FeatureTable) -> MissingSummary {
    let mut summary = MissingSummary::default();
    for column in table.columns() {
        let count = column.values.iter().filter(|v| v.is_nan()).count();
        if count > 0 {
            summary.total_missing += count;
            summary.missing_by_column.insert(column.name.clone(), count);
        }
    }
    summary
}

pub fn check_column_types(
    table: &FeatureTable,
    expected: &[(&str, ColumnKind)],
) -> Vec<TypeMismatch> {
    expected
        .iter()
        .filter_map(|&(name, want)| {
            let actual = table.column(name).map(ColumnKind::of);
            match actual {
                Some(kind) if kind.satisfies(want) => None,
                _ => Some(TypeMismatch {
                    column: name.to_string(),
                    actual,
                    expected: want,
                }),
            }
        })
        .collect()
}

pub fn verify_dataset(
    table: &FeatureTable,
    expected: Option<&[(&str, ColumnKind)]>,
) -> VerificationReport {
    VerificationReport {
        rows: table.len(),
        columns: table.columns().len(),
        missing: check_missing_values(table),
        kinds: table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), ColumnKind::of(&c.values)))
            .collect(),
        mismatches: expected
            .map(|e| check_column_types(table, e))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        FeatureTable::with_len(3)
            .with_column("Close_1h", vec![100.5, f64::NAN, 101.0])
            .unwrap()
            .with_column("tradecount", vec![10.0, 12.0, 9.0])
            .unwrap()
            .with_column("target", vec![0.0, 1.0, 1.0])
            .unwrap()
    }

    #[test]
    fn missing_values_counted_per_column() {
        let summary = check_missing_values(&table());
        assert_eq!(summary.total_missing, 1);
        assert_eq!(summary.missing_by_column.get("Close_1h"), Some(&1));
        assert!(!summary.missing_by_column.contains_key("target"));
    }

    #[test]
    fn column_kind_is_narrowest() {
        assert_eq!(ColumnKind::of(&[0.0, 1.0, f64::NAN]), ColumnKind::Binary);
        assert_eq!(ColumnKind::of(&[0.0, 3.0]), ColumnKind::Integer);
        assert_eq!(ColumnKind::of(&[0.5, 3.0]), ColumnKind::Float);
    }

    #[test]
    fn type_check_reports_mismatch_and_absence() {
        let t = table();
        let mismatches = check_column_types(
            &t,
            &[
                ("Close_1h", ColumnKind::Float),
                ("tradecount", ColumnKind::Binary),
                ("target", ColumnKind::Integer),
                ("rsi", ColumnKind::Float),
            ],
        );
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].column, "tradecount");
        assert_eq!(mismatches[0].actual, Some(ColumnKind::Integer));
        assert_eq!(mismatches[1].column, "rsi");
        assert_eq!(mismatches[1].actual, None);
    }

    #[test]
    fn report_display_summarises() {
        let report = verify_dataset(&table(), None);
        assert!(!report.is_clean());
        let text = report.to_string();
        assert!(text.contains("Shape: 3 rows x 3 columns"));
        assert!(text.contains("Missing values: 1"));
        assert!(text.contains("target"));
        assert!(!text.contains("Type mismatches"));
    }
}
