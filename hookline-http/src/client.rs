//! Reference client over an arbitrary [`Transport`]

use crate::config::RequestConfig;
use crate::response::Response;
use crate::transport::Transport;
use hookline_common::{Error, Result};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Request-bound interceptor, run over the effective config before the transport.
pub type RequestInterceptor = dyn Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync;

/// Response-bound interceptor, run over the response after the transport.
pub type ResponseInterceptor = dyn Fn(Response) -> Result<Response> + Send + Sync;

/// The two interceptor registration points a client exposes.
#[derive(Default)]
pub struct Interceptors {
    request: RwLock<Vec<Arc<RequestInterceptor>>>,
    response: RwLock<Vec<Arc<ResponseInterceptor>>>,
}

impl Interceptors {
    /// Register a request-bound interceptor.
    pub fn use_request<F>(&self, f: F)
    where
        F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync + 'static,
    {
        self.request
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(f));
    }

    /// Register a response-bound interceptor.
    pub fn use_response<F>(&self, f: F)
    where
        F: Fn(Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.response
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(f));
    }

    fn request_snapshot(&self) -> Vec<Arc<RequestInterceptor>> {
        self.request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn response_snapshot(&self) -> Vec<Arc<ResponseInterceptor>> {
        self.response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A small HTTP client: a `defaults` config bag, a transport, and two
/// interceptor lists. Nothing more is assumed by the instrumentation shim.
pub struct HttpClient {
    defaults: RequestConfig,
    transport: Arc<dyn Transport>,
    interceptors: Interceptors,
}

impl HttpClient {
    /// Client over `transport` with empty defaults.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    /// Start building a client.
    pub fn builder(transport: Arc<dyn Transport>) -> HttpClientBuilder {
        HttpClientBuilder {
            defaults: RequestConfig::default(),
            transport,
        }
    }

    /// The defaults config bag.
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    /// The interceptor registration points.
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Spawn a child client sharing this client's transport.
    ///
    /// The child gets its own defaults and empty interceptor lists; it carries
    /// nothing over from any instrumentation wrapped around its parent.
    pub fn create(&self, defaults: RequestConfig) -> HttpClient {
        HttpClient {
            defaults,
            transport: Arc::clone(&self.transport),
            interceptors: Interceptors::default(),
        }
    }

    /// Merge defaults and run the request-bound interceptors.
    pub fn prepare(&self, config: RequestConfig) -> Result<RequestConfig> {
        let mut config = config.merge_over(&self.defaults);
        for interceptor in self.interceptors.request_snapshot() {
            config = interceptor(config)?;
        }
        Ok(config)
    }

    /// Drive `config` through the transport (honoring cancellation and
    /// timeout), then run the response-bound interceptors.
    pub async fn perform(&self, config: RequestConfig) -> Result<Response> {
        let url = config.full_url();
        let timeout = config.timeout;
        let cancel = config.cancel.clone();
        debug!(%url, method = %config.method, "performing request");

        let send = self.transport.send(config);
        let mut response = match (cancel, timeout) {
            (Some(token), Some(limit)) => tokio::select! {
                () = token.cancelled() => return Err(Error::Canceled(url)),
                res = tokio::time::timeout(limit, send) => {
                    res.map_err(|_| Error::Timeout(limit))??
                }
            },
            (Some(token), None) => tokio::select! {
                () = token.cancelled() => return Err(Error::Canceled(url)),
                res = send => res?,
            },
            (None, Some(limit)) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| Error::Timeout(limit))??,
            (None, None) => send.await?,
        };

        for interceptor in self.interceptors.response_snapshot() {
            response = interceptor(response)?;
        }
        Ok(response)
    }

    /// The client's single request entry point: prepare, then perform.
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        let config = self.prepare(config)?;
        self.perform(config).await
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    defaults: RequestConfig,
    transport: Arc<dyn Transport>,
}

impl HttpClientBuilder {
    /// Set the defaults config bag.
    #[must_use]
    pub fn defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Finish building.
    pub fn build(self) -> HttpClient {
        HttpClient {
            defaults: self.defaults,
            transport: self.transport,
            interceptors: Interceptors::default(),
        }
    }
}
