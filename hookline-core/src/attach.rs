//! Plugin-aware client wrapper
//!
//! [`attach`] wraps an [`HttpClient`] in a [`PluginClient`] that owns a
//! plugin registry and a [`SharedCache`]. The wrapped client is never
//! mutated; every request runs through an abort chain that dispatches the
//! registered lifecycle hooks around the underlying transport call.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug_span, Instrument};
use uuid::Uuid;

use futures::future::BoxFuture;
use hookline_common::Result;
use hookline_http::{HttpClient, RequestConfig, Response};

use crate::cache::SharedCache;
use crate::chain::{AbortChain, Halt};
use crate::dispatch::{dispatch, has_hook, sort_by_enforce, Direction};
use crate::hook::{HookResult, Plugin, ShareOptions};

struct Registry {
    plugins: RwLock<Vec<Arc<Plugin>>>,
    shared: SharedCache,
}

impl Registry {
    fn new() -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
            shared: SharedCache::new(),
        }
    }

    fn snapshot(&self) -> Vec<Arc<Plugin>> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn register(&self, plugin: Plugin) {
        let mut plugins = self
            .plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        plugins.push(Arc::new(plugin));
        sort_by_enforce(&mut plugins);
    }
}

/// An [`HttpClient`] plus its registered plugins.
///
/// Cheap to clone; clones share the registry and cache. Dropping all clones
/// drops the plugin state with them, so plugin scope equals client scope.
#[derive(Clone)]
pub struct PluginClient {
    inner: Arc<HttpClient>,
    registry: Arc<Registry>,
}

/// Wrap a client with an empty plugin registry.
pub fn attach(client: impl Into<Arc<HttpClient>>) -> PluginClient {
    PluginClient {
        inner: client.into(),
        registry: Arc::new(Registry::new()),
    }
}

impl PluginClient {
    /// Register a plugin, consulting its `before_register` veto first.
    ///
    /// # Errors
    ///
    /// Returns the veto's error unchanged when the plugin declines to join
    /// this client.
    pub fn plugin(self, plugin: Plugin) -> Result<Self> {
        plugin.check_registration(&self)?;
        self.registry.register(plugin);
        Ok(self)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.registry
            .snapshot()
            .iter()
            .any(|p| p.name() == name)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// The wrapped client, untouched by any plugin machinery.
    pub fn inner(&self) -> &HttpClient {
        &self.inner
    }

    /// This client's plugin state cache.
    pub fn shared(&self) -> &SharedCache {
        &self.registry.shared
    }

    /// A plain async function view of this client, for callers that want a
    /// request fn rather than an object.
    pub fn wrap(&self) -> impl Fn(RequestConfig) -> BoxFuture<'static, Result<Response>> + Clone {
        let client = self.clone();
        move |config| {
            let client = client.clone();
            Box::pin(async move { client.request(config).await })
        }
    }

    /// Execute one request through the full plugin lifecycle.
    ///
    /// Stages: `pre_request_transform` (forward), preparation plus
    /// `transform_request` (forward) plus transport, then
    /// `post_response_transform` (reverse). Errors fold through
    /// `capture_exception` (reverse); `completed` fires exactly once;
    /// `aborted` observes short-circuits.
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let span = debug_span!("request", %request_id, url = %config.full_url());
        self.run(config, request_id).instrument(span).await
    }

    async fn run(&self, config: RequestConfig, request_id: Uuid) -> Result<Response> {
        let plugins = self.registry.snapshot();
        let share = ShareOptions {
            origin: Arc::new(config.clone()),
            shared: self.registry.shared.clone(),
            client: self.clone(),
            request_id,
        };

        let chain = {
            let (share, plugins) = (share.clone(), plugins.clone());
            AbortChain::new(config).next(move |config, _| async move {
                dispatch(
                    &plugins,
                    "pre_request_transform",
                    |l| l.pre_request_transform.as_ref(),
                    Direction::Forward,
                    config,
                    &share,
                )
                .await
            })
        };
        let chain = {
            let (share, plugins, client) = (share.clone(), plugins.clone(), self.clone());
            chain.next(move |config, _| async move {
                client.send_through(config, &plugins, &share).await
            })
        };
        let chain = {
            let (share, plugins) = (share.clone(), plugins.clone());
            chain.next(move |response, _| async move {
                dispatch(
                    &plugins,
                    "post_response_transform",
                    |l| l.post_response_transform.as_ref(),
                    Direction::Reverse,
                    response,
                    &share,
                )
                .await
            })
        };

        let chain = if has_hook(&plugins, |l| l.capture_exception.as_ref()) {
            let (share, plugins) = (share.clone(), plugins.clone());
            chain.capture(move |reason, _| async move {
                let folded = dispatch(
                    &plugins,
                    "capture_exception",
                    |l| l.capture_exception.as_ref(),
                    Direction::Reverse,
                    reason,
                    &share,
                )
                .await?;
                Err(Halt::Error(folded))
            })?
        } else {
            chain
        };

        let chain = {
            let (share, plugins) = (share.clone(), plugins.clone());
            chain.completed(move |_| async move {
                dispatch(
                    &plugins,
                    "completed",
                    |l| l.completed.as_ref(),
                    Direction::Reverse,
                    (),
                    &share,
                )
                .await
            })?
        };

        let chain = {
            chain.abort(move |payload| async move {
                dispatch(
                    &plugins,
                    "aborted",
                    |l| l.aborted.as_ref(),
                    Direction::Reverse,
                    payload,
                    &share,
                )
                .await
            })?
        };

        chain.done().await
    }

    /// Preparation, the `transform_request` hooks, and the transport call.
    async fn send_through(
        &self,
        config: RequestConfig,
        plugins: &[Arc<Plugin>],
        share: &ShareOptions,
    ) -> HookResult<Response> {
        let prepared = self.inner.prepare(config)?;
        let finalized = dispatch(
            plugins,
            "transform_request",
            |l| l.transform_request.as_ref(),
            Direction::Forward,
            prepared,
            share,
        )
        .await?;
        let response = self.inner.perform(finalized).await?;
        Ok(response)
    }
}

impl std::fmt::Debug for PluginClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginClient")
            .field("plugins", &self.plugin_names())
            .finish_non_exhaustive()
    }
}
