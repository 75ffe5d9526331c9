/// Error types for the analytics and terroir-matching core.
use thiserror::Error;

/// Failures the core reports to its caller.
///
/// Insufficient data is deliberately absent: operations that need a minimum
/// sample count return a typed sentinel in their result instead.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Structurally malformed input (wrong shape, wrong length, bad parameter).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Benchmark id not present in the reference database.
    #[error("Reference terroir not found: {requested}")]
    MissingReference { requested: String },

    /// Configuration or reference data failed to parse or validate.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Loader could not read its source file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Type alias for Results using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;
