//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("missing required column: {column}")]
    MissingColumn { column: String },

    #[error("invalid price {price} at row {row}")]
    InvalidPrice { row: String, price: f64 },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("parse error in {file} at line {line}: {reason}")]
    DataParse {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("no rows left after {stage}")]
    EmptyDataset { stage: String },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        SigtraderError::MissingColumn {
            column: column.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SigtraderError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::DataLoad { .. }
            | SigtraderError::DataParse { .. }
            | SigtraderError::EmptyDataset { .. } => 3,
            SigtraderError::InvalidParameter { .. } => 4,
            SigtraderError::MissingColumn { .. } | SigtraderError::InvalidPrice { .. } => 5,
            SigtraderError::Model { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
