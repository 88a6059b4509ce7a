//! Report adapter writing run artifacts into a directory.
//!
//! - `annotated.csv`: every column plus `predicted` and `PnL`
//! - `trades.csv`: one line per completed trade
//! - `metrics.csv`: `metric,value`
//! - `trading_performance.svg`, `feature_importance.svg`,
//!   `confusion_matrix.svg`

use crate::adapters::chart_svg;
use crate::adapters::csv_adapter::write_table;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::model::ModelEvaluation;
use crate::domain::simulation::AnnotatedSeries;
use crate::domain::table::RowKey;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ANNOTATED_FILE: &str = "annotated.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const METRICS_FILE: &str = "metrics.csv";
pub const PERFORMANCE_CHART_FILE: &str = "trading_performance.svg";
pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance.svg";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.svg";

#[derive(Serialize)]
struct TradeLine {
    entry: String,
    exit: String,
    entry_price: f64,
    exit_price: f64,
    units: f64,
    pnl: f64,
}

pub struct FileReportAdapter {
    dir: PathBuf,
}

impl FileReportAdapter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> Result<PathBuf, SigtraderError> {
        fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(name))
    }

    fn write_svg(&self, name: &str, svg: String) -> Result<(), SigtraderError> {
        if svg.is_empty() {
            warn!(chart = name, "nothing to plot; chart skipped");
            return Ok(());
        }
        let path = self.path(name)?;
        fs::write(&path, svg)?;
        debug!(path = %path.display(), "wrote chart");
        Ok(())
    }

    fn write_trades(&self, series: &AnnotatedSeries) -> Result<(), SigtraderError> {
        let path = self.path(TRADES_FILE)?;
        let mut wtr = csv::Writer::from_path(&path).map_err(std::io::Error::other)?;
        if series.trades.is_empty() {
            wtr.write_record(["entry", "exit", "entry_price", "exit_price", "units", "pnl"])
                .map_err(std::io::Error::other)?;
        }
        for trade in &series.trades {
            wtr.serialize(TradeLine {
                entry: series.table.row_key(trade.entry_row).to_string(),
                exit: series.table.row_key(trade.exit_row).to_string(),
                entry_price: trade.entry_price,
                exit_price: trade.exit_price,
                units: trade.units,
                pnl: trade.pnl,
            })
            .map_err(std::io::Error::other)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for FileReportAdapter {
    fn write_series(&self, series: &AnnotatedSeries) -> Result<(), SigtraderError> {
        let path = self.path(ANNOTATED_FILE)?;
        write_table(&path, &series.table)?;
        self.write_trades(series)
    }

    fn write_metrics(&self, metrics: &PerformanceMetrics) -> Result<(), SigtraderError> {
        let path = self.path(METRICS_FILE)?;
        let mut wtr = csv::Writer::from_path(&path).map_err(std::io::Error::other)?;
        wtr.write_record(["metric", "value"])
            .map_err(std::io::Error::other)?;
        for (key, value) in metrics.as_map() {
            wtr.write_record([key, value.to_string().as_str()])
                .map_err(std::io::Error::other)?;
        }
        wtr.write_record(["total_trades", metrics.total_trades.to_string().as_str()])
            .map_err(std::io::Error::other)?;
        wtr.flush()?;
        Ok(())
    }

    fn write_performance_chart(&self, series: &AnnotatedSeries) -> Result<(), SigtraderError> {
        let keys: Vec<RowKey> = (0..series.table.len())
            .map(|i| series.table.row_key(i))
            .collect();
        let svg = chart_svg::generate_pnl_svg(&keys, &series.cumulative_pnl());
        self.write_svg(PERFORMANCE_CHART_FILE, svg)
    }

    fn write_feature_importance(
        &self,
        names: &[String],
        importances: &[f64],
    ) -> Result<(), SigtraderError> {
        let svg = chart_svg::generate_feature_importance_svg(names, importances);
        self.write_svg(FEATURE_IMPORTANCE_FILE, svg)
    }

    fn write_confusion_matrix(&self, evaluation: &ModelEvaluation) -> Result<(), SigtraderError> {
        let svg = chart_svg::generate_confusion_svg(&evaluation.confusion);
        self.write_svg(CONFUSION_MATRIX_FILE, svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::simulation::{simulate_trading, SimulationParams};
    use crate::domain::table::FeatureTable;
    use tempfile::tempdir;

    fn sample_run() -> (PerformanceMetrics, AnnotatedSeries) {
        let table = FeatureTable::with_len(5)
            .with_column("Close_1h", vec![100.0, 102.0, 101.0, 105.0, 110.0])
            .unwrap()
            .with_column("predicted", vec![1.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        simulate_trading(&table, "Close_1h", None, &SimulationParams::default()).unwrap()
    }

    #[test]
    fn write_simulation_creates_files() {
        let dir = tempdir().unwrap();
        let adapter = FileReportAdapter::new(dir.path().join("nested/report"));
        let (metrics, series) = sample_run();

        adapter.write_simulation(&series, &metrics).unwrap();

        let out = adapter.dir();
        assert!(out.join(ANNOTATED_FILE).exists());
        assert!(out.join(TRADES_FILE).exists());
        assert!(out.join(METRICS_FILE).exists());
        assert!(out.join(PERFORMANCE_CHART_FILE).exists());
    }

    #[test]
    fn annotated_csv_has_pnl_column() {
        let dir = tempdir().unwrap();
        let adapter = FileReportAdapter::new(dir.path());
        let (_, series) = sample_run();

        adapter.write_series(&series).unwrap();

        let text = fs::read_to_string(dir.path().join(ANNOTATED_FILE)).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Close_1h,predicted,PnL"));
        assert_eq!(lines.next(), Some("100,1,0"));
        assert_eq!(lines.next(), Some("102,0,2"));

        let mut rdr = csv::Reader::from_path(dir.path().join(TRADES_FILE)).unwrap();
        let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, ["entry", "exit", "entry_price", "exit_price", "units", "pnl"]);
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "0");
        assert_eq!(&records[0][1], "1");
        let pnl: f64 = records[0][5].parse().unwrap();
        assert_eq!(pnl, 2.0);
    }

    #[test]
    fn metrics_csv_lists_every_metric() {
        let dir = tempdir().unwrap();
        let adapter = FileReportAdapter::new(dir.path());
        let (metrics, _) = sample_run();

        adapter.write_metrics(&metrics).unwrap();

        let text = fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap();
        assert!(text.starts_with("metric,value\n"));
        assert!(text.contains("final_balance,9902\n"));
        assert!(text.contains("total_profit,-98\n"));
        assert!(text.contains("win_rate,1\n"));
        assert!(text.contains("sharpe_ratio,0\n"));
        assert!(text.contains("total_trades,1\n"));
    }

    #[test]
    fn empty_feature_importance_is_skipped() {
        let dir = tempdir().unwrap();
        let adapter = FileReportAdapter::new(dir.path());
        adapter.write_feature_importance(&[], &[]).unwrap();
        assert!(!dir.path().join(FEATURE_IMPORTANCE_FILE).exists());
    }

    #[test]
    fn confusion_matrix_chart_written() {
        let dir = tempdir().unwrap();
        let adapter = FileReportAdapter::new(dir.path());
        let evaluation = ModelEvaluation::from_predictions(&[0, 1, 1], &[0, 1, 0]).unwrap();
        adapter.write_confusion_matrix(&evaluation).unwrap();
        let svg = fs::read_to_string(dir.path().join(CONFUSION_MATRIX_FILE)).unwrap();
        assert!(svg.contains("No Buy"));
    }
}
