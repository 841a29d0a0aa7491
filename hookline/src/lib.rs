//! # Hookline
//!
//! Request-lifecycle plugin middleware for HTTP clients.
//!
//! ## Overview
//!
//! Hookline wraps a transport-agnostic HTTP client in a plugin registry.
//! Every request runs through an abortable task chain that dispatches the
//! registered plugins' lifecycle hooks around the transport call, so
//! cross-cutting request behavior (deduplication, retry, auth gating,
//! logging) composes without touching the client itself.
//!
//! ## Quick Start
//!
//! ```rust
//! use hookline::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> hookline::Result<()> {
//! let transport = Arc::new(transport_fn(|config| async move {
//!     Ok(Response::ok(json!({ "url": config.full_url() })))
//! }));
//! let client = attach(HttpClient::new(transport))
//!     .plugin(merge(MergeOptions::new()))?
//!     .plugin(retry(RetryOptions::new().max(2)))?
//!     .plugin(logger(LoggerOptions::new()))?;
//!
//! let res = client
//!     .request(RequestConfig::get("/users").timeout(Duration::from_secs(5)))
//!     .await?;
//! assert_eq!(res.body["url"], "/users");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Hookline consists of several crates:
//!
//! - [`hookline-common`](hookline_common) - Shared errors and constants
//! - [`hookline-http`](hookline_http) - Client, config, response, transport
//! - [`hookline-core`](hookline_core) - Chain executor, hook dispatch, attach
//! - [`hookline-plugin`](hookline_plugin) - Built-in coordination plugins
//!
//! ## Re-exports
//!
//! This crate re-exports the most commonly used items from the subcrates
//! for convenience.

// Re-export subcrates
pub use hookline_common as common;
pub use hookline_core as core;
pub use hookline_http as http;
pub use hookline_plugin as plugin;

/// Prelude module for convenient imports
pub mod prelude {
    // Common types
    pub use crate::common::{Error, Result};

    // Client types
    pub use crate::http::{transport_fn, HttpClient, RequestConfig, Response, Transport};

    // Lifecycle types
    pub use crate::core::{
        attach, AbortChain, Enforce, Halt, Hook, Plugin, PluginClient, ShareOptions, UrlFilter,
        UrlPattern,
    };

    // Built-in plugins
    pub use crate::plugin::{
        auth, cancel, cancel_all, debounce, logger, merge, retry, throttle, AuthOptions,
        BackoffConfig, CancelOptions, DebounceMark, DebounceOptions, DuplicateBehavior,
        LoggerOptions, MergeMark, MergeOptions, RetryMark, RetryOptions, ThrottleMark,
        ThrottleOptions,
    };
}

// Convenience re-exports at crate root
pub use hookline_common::{Error, Result};
pub use hookline_core::{attach, AbortChain, Halt, Hook, Plugin, PluginClient};
pub use hookline_http::{HttpClient, RequestConfig, Response, Transport};
