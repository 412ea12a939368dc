use thiserror::Error;

/// Top-level error type for the CAPA bot.
#[derive(Debug, Error)]
pub enum CapaError {
    /// Error reading the spreadsheet.
    #[error("sheet error: {0}")]
    Sheet(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Holiday calendar lookup error.
    #[error("holiday error: {0}")]
    Holiday(String),

    /// Operational notification error.
    #[error("notify error: {0}")]
    Notify(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
