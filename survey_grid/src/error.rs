//! Error type shared by the grid pipeline and its I/O helpers.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading points, building the grid or writing results.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller supplied parameter is unusable (bad step, unknown entity
    /// kind, missing input file).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The point selection produced no samples.
    #[error("no data: {0}")]
    NoData(String),

    /// The sample geometry cannot be triangulated.
    #[error("interpolation failed: {0}")]
    Interpolation(String),

    /// A coordinate is missing a component or the data has the wrong shape.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// Malformed input text.
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}
