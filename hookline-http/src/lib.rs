//! # Hookline HTTP collaborator surface
//!
//! The instrumentation shim in `hookline-core` wraps a pre-existing client
//! instance. This crate defines the minimal surface such a client must offer:
//! a single [`Transport::send`] entry point, a `defaults` config bag, and two
//! interceptor registration points (request-bound and response-bound). The
//! shim assumes nothing beyond that contract.
//!
//! [`HttpClient`] is a small reference client over an arbitrary [`Transport`];
//! [`transport_fn`] turns a closure into a transport, which is how the test
//! suites stand in for a network.

pub mod client;
pub mod config;
pub mod response;
pub mod transport;
pub mod url;

pub use client::{HttpClient, HttpClientBuilder, Interceptors};
pub use config::RequestConfig;
pub use response::Response;
pub use transport::{transport_fn, Transport};
pub use url::{combine_urls, is_absolute_url};
