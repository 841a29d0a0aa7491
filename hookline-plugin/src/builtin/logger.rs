//! Structured request/response logging

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use hookline_common::Error;
use hookline_core::{Hook, Plugin, ShareOptions, UrlFilter, UrlPattern};
use hookline_http::{RequestConfig, Response};

use super::in_scope;

const SLOT: &str = "logger";

/// Configuration for [`logger`].
pub struct LoggerOptions {
    filter: UrlFilter,
    request: bool,
    response: bool,
    error: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::new(),
            request: true,
            response: true,
            error: true,
        }
    }
}

impl LoggerOptions {
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

    #[must_use]
    pub fn request(mut self, enabled: bool) -> Self {
        self.request = enabled;
        self
    }

    #[must_use]
    pub fn response(mut self, enabled: bool) -> Self {
        self.response = enabled;
        self
    }

    #[must_use]
    pub fn error(mut self, enabled: bool) -> Self {
        self.error = enabled;
        self
    }
}

#[derive(Default)]
struct LoggerSlot {
    started: Mutex<HashMap<Uuid, Instant>>,
}

impl LoggerSlot {
    fn start(&self, id: Uuid) {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Instant::now());
    }

    fn elapsed_ms(&self, id: Uuid) -> Option<u64> {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|at| u64::try_from(at.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    fn forget(&self, id: Uuid) {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Build the logger plugin.
pub fn logger(options: LoggerOptions) -> Plugin {
    let LoggerOptions {
        filter,
        request,
        response,
        error,
    } = options;
    let filter = Arc::new(filter);

    let mut plugin = Plugin::new("logger");

    if request {
        let scope = Arc::clone(&filter);
        plugin = plugin.transform_request(
            Hook::new(move |config: RequestConfig, share: ShareOptions, _| {
                let slot = share.shared.get_or_create(SLOT, LoggerSlot::default);
                async move {
                    slot?.start(share.request_id);
                    info!(
                        method = %config.method,
                        url = %config.full_url(),
                        "request dispatched"
                    );
                    Ok(config)
                }
            })
            .run_when(move |_, share| in_scope(&scope, share)),
        );
    }

    if response {
        let scope = Arc::clone(&filter);
        plugin = plugin.post_response_transform(
            Hook::new(move |res: Response, share: ShareOptions, _| {
                let slot = share.shared.get_or_create(SLOT, LoggerSlot::default);
                async move {
                    let elapsed = slot?.elapsed_ms(share.request_id);
                    info!(
                        status = %res.status,
                        url = %share.origin.full_url(),
                        elapsed_ms = elapsed,
                        "response received"
                    );
                    Ok(res)
                }
            })
            .run_when(move |_, share| in_scope(&scope, share)),
        );
    }

    if error {
        let scope = Arc::clone(&filter);
        plugin = plugin.capture_exception(
            Hook::new(move |reason: Error, share: ShareOptions, _| {
                let slot = share.shared.get_or_create(SLOT, LoggerSlot::default);
                async move {
                    let elapsed = slot?.elapsed_ms(share.request_id);
                    warn!(
                        url = %share.origin.full_url(),
                        elapsed_ms = elapsed,
                        error = %reason,
                        "request failed"
                    );
                    Ok(reason)
                }
            })
            .run_when(move |_, share| in_scope(&scope, share)),
        );
    }

    // timing entries must not outlive their invocation, whatever the outcome
    let cleanup_scope = Arc::clone(&filter);
    plugin.completed(
        Hook::new(move |value, share: ShareOptions, _| {
            let slot = share.shared.get_or_create(SLOT, LoggerSlot::default);
            async move {
                slot?.forget(share.request_id);
                Ok(value)
            }
        })
        .run_when(move |_, share| in_scope(&cleanup_scope, share)),
    )
}
