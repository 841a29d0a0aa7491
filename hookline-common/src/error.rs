//! Error types for Hookline

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Main error type for Hookline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded its configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Request was canceled before the transport settled
    #[error("Request canceled: {0}")]
    Canceled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication gate rejected the request
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// A response was classified as a failure by a retry predicate
    #[error("Upstream reported failure status {status}")]
    Upstream {
        /// Status code the predicate flagged
        status: StatusCode,
    },

    /// A duplicate request was dropped by the throttle window
    #[error("Duplicate request dropped: {0}")]
    Throttled(String),

    /// The request this invocation was merged into failed
    #[error("Merged request failed: {0}")]
    Merged(String),

    /// A singleton chain handler slot was registered twice
    #[error("Hook registration conflict: {0}")]
    HookConflict(String),

    /// A plugin's `before_register` rejected the registration
    #[error("Plugin `{plugin}` rejected registration: {reason}")]
    Veto {
        /// Plugin that refused to register
        plugin: String,
        /// Human-readable reason
        reason: String,
    },

    /// A shared cache slot was requested with a mismatching type
    #[error("Shared cache slot `{0}` holds a different type")]
    SlotTypeMismatch(String),

    /// Plugin-specific failure
    #[error("Plugin error: {0}")]
    Plugin(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
