//! Error types for the drill engine and its storage/import collaborators.

use thiserror::Error;

/// Errors surfaced by the drill engine.
///
/// Degenerate input (empty pool, exhausted session) is never an error; those
/// cases come back as `Ok(None)` or empty collections.
#[derive(Debug, Error)]
pub enum DrillError {
    /// A session operation was invoked before `make_session`.
    #[error("session is not initialized, call make_session() first")]
    UninitializedSession,

    /// The answered question is not the one most recently issued.
    #[error("question '{got}' is not awaiting an answer (pending: {expected:?})")]
    StaleQuestion {
        expected: Option<String>,
        got: String,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("excel error: {0}")]
    Excel(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file format: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, DrillError>;

#[cfg(feature = "python")]
impl From<DrillError> for pyo3::PyErr {
    fn from(err: DrillError) -> Self {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
