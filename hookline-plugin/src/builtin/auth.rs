//! Gate requests behind a login check
//!
//! Before a scoped request reaches the transport, an async login routine gets
//! a look at it. Returning `false` fails the request with
//! [`Error::Unauthorized`]; with `once` enabled the first success is
//! remembered and the routine is not consulted again for this client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;

use hookline_common::{Error, Result};
use hookline_core::{Hook, Plugin, ShareOptions, UrlFilter, UrlPattern};
use hookline_http::RequestConfig;

use super::in_scope;

const SLOT: &str = "auth";

/// Async login routine consulted per request.
pub type LoginFn = Arc<dyn Fn(RequestConfig) -> BoxFuture<'static, Result<bool>> + Send + Sync>;

/// Configuration for [`auth`].
pub struct AuthOptions {
    filter: UrlFilter,
    login: LoginFn,
    once: bool,
}

impl AuthOptions {
    /// Configure with the login routine; everything else defaults.
    pub fn new<F, Fut>(login: F) -> Self
    where
        F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<bool>> + Send + 'static,
    {
        Self {
            filter: UrlFilter::new(),
            login: Arc::new(move |config| Box::pin(login(config))),
            once: false,
        }
    }

    #[must_use]
    pub fn include(mut self, pattern: impl Into<UrlPattern>) -> Self {
        self.filter = self.filter.include(pattern);
        self
    }

    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<UrlPattern>) -> Self {
        self.filter = self.filter.exclude(pattern);
        self
    }

    /// Remember the first successful login for the client's lifetime.
    #[must_use]
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }
}

#[derive(Default)]
struct AuthSlot {
    logged_in: AtomicBool,
}

/// Build the auth plugin.
pub fn auth(options: AuthOptions) -> Plugin {
    let AuthOptions {
        filter,
        login,
        once,
    } = options;
    let filter = Arc::new(filter);

    let gate_filter = Arc::clone(&filter);
    let gate = Hook::new(move |config: RequestConfig, share: ShareOptions, _| {
        let login = Arc::clone(&login);
        let slot = share.shared.get_or_create(SLOT, AuthSlot::default);
        async move {
            let slot = slot?;
            if once && slot.logged_in.load(Ordering::Acquire) {
                return Ok(config);
            }
            if login(config.clone()).await? {
                slot.logged_in.store(true, Ordering::Release);
                Ok(config)
            } else {
                Err(Error::Unauthorized(share.origin.full_url()).into())
            }
        }
    })
    .run_when(move |_, share| in_scope(&gate_filter, share));

    Plugin::new("auth").transform_request(gate)
}
