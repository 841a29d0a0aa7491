//! Transport trait and closure adapter

use crate::config::RequestConfig;
use crate::response::Response;
use async_trait::async_trait;
use hookline_common::Result;
use std::future::Future;

/// The single entry point a transport must provide.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request described by `config` and resolve its response.
    async fn send(&self, config: RequestConfig) -> Result<Response>;
}

/// Adapt an async closure into a [`Transport`].
///
/// This is how tests and demos stand in for a network:
///
/// ```rust
/// use hookline_http::{transport_fn, Response};
/// use serde_json::json;
///
/// let transport = transport_fn(|config| async move {
///     Ok(Response::ok(json!({ "url": config.full_url() })))
/// });
/// # let _ = transport;
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send,
{
    TransportFn { f }
}

/// [`Transport`] implemented by a closure; built with [`transport_fn`].
pub struct TransportFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send,
{
    async fn send(&self, config: RequestConfig) -> Result<Response> {
        (self.f)(config).await
    }
}
