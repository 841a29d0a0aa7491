//! Common error types and constants for Hookline

pub mod constants;
pub mod error;

pub use constants::{
    DEFAULT_DEBOUNCE_WINDOW, DEFAULT_MERGE_WINDOW, DEFAULT_RETRY_MAX, DEFAULT_THROTTLE_WINDOW,
};
pub use error::{Error, Result};
