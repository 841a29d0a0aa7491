//! Request lifecycle engine
//!
//! The pieces that turn a plain [`hookline_http::HttpClient`] into a
//! plugin-extensible one:
//!
//! - [`chain`]: the single-use abortable task chain every request runs on
//! - [`hook`]: plugin, lifecycle, and hook definitions
//! - [`dispatch`]: enforce-class ordering and sequential hook dispatch
//! - [`attach`]: the client wrapper driving the whole lifecycle
//! - [`cache`]: per-client shared state for cooperating hooks
//! - [`filter`]: URL include/exclude scoping
//! - [`fingerprint`]: request identity for coordination plugins

pub mod attach;
pub mod cache;
pub mod chain;
pub mod dispatch;
pub mod filter;
pub mod fingerprint;
pub mod hook;

pub use attach::{attach, PluginClient};
pub use cache::SharedCache;
pub use chain::{AbortChain, AbortPayload, ChainError, Controller, Halt};
pub use dispatch::{dispatch, has_hook, Direction};
pub use filter::{UrlFilter, UrlPattern};
pub use fingerprint::{default_hash_fn, fingerprint, HashFn, RequestHash};
pub use hook::{
    Enforce, Hook, HookController, HookHalt, HookPayload, HookResult, Lifecycle, Plugin,
    ShareOptions,
};
