//! Cancel in-flight requests on demand
//!
//! Equips every request with a cancellation token, tracked per invocation in
//! the shared cache. [`cancel_all`] trips every outstanding token at once,
//! which the transport layer surfaces as [`Error::Canceled`]; the plugin then
//! reclassifies that failure as a deliberate abort so retry-style error hooks
//! never see it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hookline_common::{Error, Result};
use hookline_core::{Hook, Plugin, PluginClient, ShareOptions, UrlFilter, UrlPattern};
use hookline_http::RequestConfig;

use super::in_scope;

const SLOT: &str = "cancel";

/// Configuration for [`cancel`].
#[derive(Default)]
pub struct CancelOptions {
    filter: UrlFilter,
}

impl CancelOptions {
    pub fn new() -> Self {
        Self::default()
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
}

#[derive(Default)]
struct CancelSlot {
    tokens: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl CancelSlot {
    fn track(&self, id: Uuid, token: CancellationToken) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, token);
    }

    fn forget(&self, id: Uuid) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<CancellationToken> = {
            let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
            tokens.drain().map(|(_, token)| token).collect()
        };
        for token in &drained {
            token.cancel();
        }
        drained.len()
    }
}

/// Trip every outstanding request token on `client`.
///
/// Returns how many requests were told to stop. Requests whose token was
/// supplied by the caller rather than this plugin are not touched.
pub fn cancel_all(client: &PluginClient) -> Result<usize> {
    let slot: Arc<CancelSlot> = client.shared().get_or_create(SLOT, CancelSlot::default)?;
    Ok(slot.cancel_all())
}

/// Build the cancel plugin.
pub fn cancel(options: CancelOptions) -> Plugin {
    let CancelOptions { filter } = options;
    let filter = Arc::new(filter);

    let pre_filter = Arc::clone(&filter);
    let pre = Hook::new(move |mut config: RequestConfig, share: ShareOptions, _| {
        let slot = share.shared.get_or_create(SLOT, CancelSlot::default);
        async move {
            let token = CancellationToken::new();
            slot?.track(share.request_id, token.clone());
            config.cancel = Some(token);
            Ok(config)
        }
    })
    .run_when(move |config: &RequestConfig, share| {
        config.cancel.is_none() && in_scope(&pre_filter, share)
    });

    // a tripped token is a deliberate stop, not a failure to recover from
    let err = Hook::new(move |reason: Error, _, ctl| async move { Err(ctl.abort_error(reason)) })
        .run_when(|reason, _| matches!(reason, Error::Canceled(_)));

    let done_filter = Arc::clone(&filter);
    let done = Hook::new(move |value, share: ShareOptions, _| {
        let slot = share.shared.get_or_create(SLOT, CancelSlot::default);
        async move {
            slot?.forget(share.request_id);
            Ok(value)
        }
    })
    .run_when(move |_, share| in_scope(&done_filter, share));

    Plugin::new("cancel")
        .before_register(super::reject_duplicate("cancel"))
        .pre_request_transform(pre)
        .capture_exception(err)
        .completed(done)
}
