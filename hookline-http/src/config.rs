//! Request configuration bag

use crate::url::{combine_urls, is_absolute_url};
use http::{Extensions, HeaderMap, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Configuration for a single request.
///
/// A client's `defaults` bag is also a `RequestConfig`; [`RequestConfig::merge_over`]
/// layers a per-request config over it. Plugin-specific per-request options ride
/// in [`extensions`](http::Extensions) as typed values (the counterpart of the
/// dynamic config fields the plugins key on).
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// HTTP method (defaults to GET)
    pub method: Method,
    /// Base URL prepended to relative `url`s
    pub base_url: Option<String>,
    /// Target path or absolute URL
    pub url: String,
    /// Query parameters; sorted map so request identity is order-independent
    pub params: BTreeMap<String, String>,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON request body
    pub body: Option<Value>,
    /// Per-request timeout applied around the transport call
    pub timeout: Option<Duration>,
    /// Cooperative cancellation handle honored by the transport boundary
    pub cancel: Option<CancellationToken>,
    /// Typed per-request plugin options
    pub extensions: Extensions,
}

impl RequestConfig {
    /// Config targeting `url` with all other fields defaulted.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// POST config with a JSON body.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
            ..Self::default()
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a typed per-request plugin option.
    #[must_use]
    pub fn with_extension<T>(mut self, ext: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.extensions.insert(ext);
        self
    }

    /// The fully resolved target URL (base + relative, unless already absolute).
    pub fn full_url(&self) -> String {
        match &self.base_url {
            Some(base) if !is_absolute_url(&self.url) => combine_urls(base, &self.url),
            _ => self.url.clone(),
        }
    }

    /// Layer `self` over `defaults`, producing the effective config.
    ///
    /// Scalars fall back to the default when unset; headers, params, and
    /// extensions are merged with the per-request side winning on conflicts.
    #[must_use]
    pub fn merge_over(self, defaults: &RequestConfig) -> RequestConfig {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers);

        let mut params = defaults.params.clone();
        params.extend(self.params);

        let mut extensions = defaults.extensions.clone();
        extensions.extend(self.extensions);

        RequestConfig {
            method: self.method,
            base_url: self.base_url.or_else(|| defaults.base_url.clone()),
            url: self.url,
            params,
            headers,
            body: self.body.or_else(|| defaults.body.clone()),
            timeout: self.timeout.or(defaults.timeout),
            cancel: self.cancel,
            extensions,
        }
    }
}
