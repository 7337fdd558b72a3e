use thiserror::Error;

/// All errors produced by the pomo crates.
///
/// None of these are fatal to the timeline: the runtime logs them and keeps
/// the clock ticking.
#[derive(Error, Debug)]
pub enum PomoError {
    /// A value could not be read back from the storage collaborator.
    #[error("Failed to read key {key} from storage: {reason}")]
    StorageRead { key: String, reason: String },

    /// A value could not be written to the storage collaborator.
    #[error("Failed to write key {key} to storage: {reason}")]
    StorageWrite { key: String, reason: String },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The notification collaborator could not deliver a message.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// The audio/alert collaborator could not play the alert.
    #[error("Alert failed: {0}")]
    Alert(String),

    /// The clock service has shut down and no longer answers requests.
    #[error("Clock service is not running")]
    ClockStopped,

    /// Pass-through for any raw I/O error that does not carry a key.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the pomo crates.
pub type Result<T> = std::result::Result<T, PomoError>;
