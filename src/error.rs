use thiserror::Error;

pub type CotlensResult<T> = Result<T, CotlensError>;

#[derive(Debug, Error)]
pub enum CotlensError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors caused by the user's filter selection.
///
/// These are request-level and non-fatal: the caller shows the message and
/// no series are computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("select at least one year")]
    NoYears,

    #[error("Invalid smoothing window: {0} (allowed: 1, 7, 30)")]
    InvalidWindow(u16),
}

/// Errors related to source tables, their schemas and column resolution.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Missing required column '{column}' in {source_kind} table")]
    MissingColumn { column: String, source_kind: String },

    #[error("Column '{column}' in {source_kind} table is not date-like (found {dtype})")]
    InvalidDateColumn {
        column: String,
        source_kind: String,
        dtype: String,
    },

    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),

    #[error("Category '{0}' has no column mapping")]
    UnmappedCategory(String),

    #[error("Column '{column}' for metric '{metric}' not found in {source_kind} table")]
    ColumnNotFound {
        column: String,
        metric: String,
        source_kind: String,
    },

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read data: {0}")]
    ReadFailed(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}

pub(crate) fn polars_err(context: &str, e: polars::error::PolarsError) -> CotlensError {
    CotlensError::Data(DataError::DataFrame(format!("{context}: {e}")))
}
