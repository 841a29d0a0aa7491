//! Plugin lifecycle hooks
//!
//! A [`Plugin`] is a named bundle of optional hooks, one per lifecycle event.
//! Each [`Hook`] pairs an async handler with a guard deciding whether it
//! applies to a given value and request context. Hooks receive a
//! [`ShareOptions`] snapshot of the invocation: the original config, the
//! client's shared cache, the client itself, and the invocation id.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use hookline_common::{Error, Result};
use hookline_http::{RequestConfig, Response};

use crate::attach::PluginClient;
use crate::cache::SharedCache;
use crate::chain::{AbortPayload, Controller, Halt};

/// Chain outcome vocabulary specialized to the request lifecycle.
pub type HookHalt = Halt<Response, Error>;
pub type HookController = Controller<Response, Error>;
pub type HookResult<T> = std::result::Result<T, HookHalt>;
/// Payload seen by `aborted` hooks.
pub type HookPayload = AbortPayload<Response, Error>;

/// Read-only invocation context handed to every hook.
#[derive(Clone)]
pub struct ShareOptions {
    /// The request as the caller submitted it, before any transform ran.
    pub origin: Arc<RequestConfig>,
    /// The owning client's plugin state cache.
    pub shared: SharedCache,
    /// The client executing this request, for re-entrant dispatch.
    pub client: PluginClient,
    /// Unique id of this invocation.
    pub request_id: Uuid,
}

impl fmt::Debug for ShareOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareOptions")
            .field("origin", &self.origin)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

type GuardFn<T> = Box<dyn Fn(&T, &ShareOptions) -> bool + Send + Sync>;
type HandlerFn<T> = Box<
    dyn Fn(T, ShareOptions, HookController) -> BoxFuture<'static, HookResult<T>> + Send + Sync,
>;

/// One lifecycle handler plus its applicability guard.
pub struct Hook<T> {
    run_when: GuardFn<T>,
    handler: HandlerFn<T>,
}

impl<T> Hook<T> {
    /// Wrap an async handler; the guard defaults to always-run.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(T, ShareOptions, HookController) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult<T>> + Send + 'static,
    {
        Self {
            run_when: Box::new(|_, _| true),
            handler: Box::new(move |value, share, ctl| Box::pin(handler(value, share, ctl))),
        }
    }

    /// Replace the guard.
    #[must_use]
    pub fn run_when<G>(mut self, guard: G) -> Self
    where
        G: Fn(&T, &ShareOptions) -> bool + Send + Sync + 'static,
    {
        self.run_when = Box::new(guard);
        self
    }

    pub(crate) fn applies(&self, value: &T, share: &ShareOptions) -> bool {
        (self.run_when)(value, share)
    }

    pub(crate) fn invoke(
        &self,
        value: T,
        share: ShareOptions,
        ctl: HookController,
    ) -> BoxFuture<'static, HookResult<T>> {
        (self.handler)(value, share, ctl)
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// All hook slots a plugin may fill, in lifecycle order.
#[derive(Debug, Default)]
pub struct Lifecycle {
    /// Before built-in request preparation.
    pub pre_request_transform: Option<Hook<RequestConfig>>,
    /// After preparation, immediately before the transport call.
    pub transform_request: Option<Hook<RequestConfig>>,
    /// After a successful transport call.
    pub post_response_transform: Option<Hook<Response>>,
    /// When any stage produced a business error.
    pub capture_exception: Option<Hook<Error>>,
    /// Exactly once per invocation, whatever the outcome.
    pub completed: Option<Hook<()>>,
    /// When the invocation short-circuited via an abort.
    pub aborted: Option<Hook<HookPayload>>,
}

/// Dispatch-order class of a plugin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Enforce {
    /// Always before unordered plugins.
    Pre,
    /// Registration order among its peers.
    #[default]
    Unordered,
    /// Always after unordered plugins.
    Post,
}

type VetoFn = Box<dyn Fn(&PluginClient) -> Result<()> + Send + Sync>;

/// A named bundle of lifecycle hooks.
pub struct Plugin {
    name: String,
    enforce: Enforce,
    before_register: Option<VetoFn>,
    lifecycle: Lifecycle,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enforce: Enforce::default(),
            before_register: None,
            lifecycle: Lifecycle::default(),
        }
    }

    #[must_use]
    pub fn enforce(mut self, enforce: Enforce) -> Self {
        self.enforce = enforce;
        self
    }

    /// Install a registration veto, consulted before the plugin is accepted.
    #[must_use]
    pub fn before_register<F>(mut self, check: F) -> Self
    where
        F: Fn(&PluginClient) -> Result<()> + Send + Sync + 'static,
    {
        self.before_register = Some(Box::new(check));
        self
    }

    #[must_use]
    pub fn pre_request_transform(mut self, hook: Hook<RequestConfig>) -> Self {
        self.lifecycle.pre_request_transform = Some(hook);
        self
    }

    #[must_use]
    pub fn transform_request(mut self, hook: Hook<RequestConfig>) -> Self {
        self.lifecycle.transform_request = Some(hook);
        self
    }

    #[must_use]
    pub fn post_response_transform(mut self, hook: Hook<Response>) -> Self {
        self.lifecycle.post_response_transform = Some(hook);
        self
    }

    #[must_use]
    pub fn capture_exception(mut self, hook: Hook<Error>) -> Self {
        self.lifecycle.capture_exception = Some(hook);
        self
    }

    #[must_use]
    pub fn completed(mut self, hook: Hook<()>) -> Self {
        self.lifecycle.completed = Some(hook);
        self
    }

    #[must_use]
    pub fn aborted(mut self, hook: Hook<HookPayload>) -> Self {
        self.lifecycle.aborted = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn enforce_class(&self) -> Enforce {
        self.enforce
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn check_registration(&self, client: &PluginClient) -> Result<()> {
        if let Some(check) = &self.before_register {
            check(client)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("enforce", &self.enforce)
            .finish_non_exhaustive()
    }
}
