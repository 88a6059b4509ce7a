//! Price data access port trait.

use crate::domain::error::SigtraderError;
use crate::domain::table::FeatureTable;

/// Source of raw price tables, one per timeframe. Tables carry timestamps
/// and are sorted oldest first.
pub trait DataPort {
    fn load_hourly(&self) -> Result<FeatureTable, SigtraderError>;

    /// `None` when no daily source is configured.
    fn load_daily(&self) -> Result<Option<FeatureTable>, SigtraderError>;
}
