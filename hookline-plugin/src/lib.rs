//! Built-in coordination plugins
//!
//! Ready-made [`hookline_core::Plugin`] bundles for the common lifecycle
//! chores: request deduplication ([`builtin::debounce`], [`builtin::merge`],
//! [`builtin::throttle`]), failure handling ([`builtin::retry`],
//! [`builtin::cancel`]), gatekeeping ([`builtin::auth`]), and tracing
//! ([`builtin::logger`]). Each constructor returns a plugin ready to hand to
//! [`PluginClient::plugin`](hookline_core::PluginClient::plugin).

pub mod backoff;
pub mod builtin;

pub use backoff::BackoffConfig;
pub use builtin::auth::{auth, AuthOptions, LoginFn};
pub use builtin::cancel::{cancel, cancel_all, CancelOptions};
pub use builtin::debounce::{debounce, DebounceMark, DebounceOptions};
pub use builtin::logger::{logger, LoggerOptions};
pub use builtin::merge::{merge, MergeMark, MergeOptions};
pub use builtin::retry::{retry, RetryMark, RetryOptions};
pub use builtin::throttle::{throttle, DuplicateBehavior, ThrottleMark, ThrottleOptions};
