//! Report generation port trait.

use crate::domain::error::SigtraderError;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::model::ModelEvaluation;
use crate::domain::simulation::AnnotatedSeries;

/// Port for persisting the artifacts of a run.
pub trait ReportPort {
    fn write_series(&self, series: &AnnotatedSeries) -> Result<(), SigtraderError>;

    fn write_metrics(&self, metrics: &PerformanceMetrics) -> Result<(), SigtraderError>;

    fn write_performance_chart(&self, series: &AnnotatedSeries) -> Result<(), SigtraderError>;

    fn write_feature_importance(
        &self,
        names: &[String],
        importances: &[f64],
    ) -> Result<(), SigtraderError>;

    fn write_confusion_matrix(&self, evaluation: &ModelEvaluation) -> Result<(), SigtraderError>;

    /// Default implementation: series, metrics and performance chart only,
    /// for runs without a trained model.
    fn write_simulation(
        &self,
        series: &AnnotatedSeries,
        metrics: &PerformanceMetrics,
    ) -> Result<(), SigtraderError> {
        self.write_series(series)?;
        self.write_metrics(metrics)?;
        self.write_performance_chart(series)
    }
}
