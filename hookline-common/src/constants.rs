//! Default windows and limits shared by the built-in plugins

use std::time::Duration;

/// Settle window appended after a debounced request completes
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::ZERO;

/// Window during which duplicate requests are dropped by the throttle plugin
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(500);

/// Window during which late duplicates still receive a merged response
pub const DEFAULT_MERGE_WINDOW: Duration = Duration::from_millis(200);

/// Default maximum retry attempts
pub const DEFAULT_RETRY_MAX: u32 = 0;
