//! Retry failed requests
//!
//! Failures fold through the error hook; while the attempt budget lasts, the
//! plugin waits out a backoff delay and re-submits the original request
//! through the full lifecycle. A recovered response aborts the failing
//! invocation with the fresh result. A response predicate can also flag
//! "successful" transport responses as failures worth retrying.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use hookline_common::constants::DEFAULT_RETRY_MAX;
use hookline_common::Error;
use hookline_core::{
    default_hash_fn, HashFn, Hook, HookHalt, Plugin, RequestHash, ShareOptions, UrlFilter,
    UrlPattern,
};
use hookline_http::Response;

use crate::backoff::BackoffConfig;

use super::{in_scope, reject_duplicate};

const SLOT: &str = "retry";

/// Per-request override, set via
/// [`RequestConfig::with_extension`](hookline_http::RequestConfig::with_extension).
#[derive(Clone, Debug)]
pub struct RetryMark {
    /// Replace the plugin-wide attempt budget for this request.
    pub max: Option<u32>,
}

type ExceptionFn = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// Configuration for [`retry`].
pub struct RetryOptions {
    filter: UrlFilter,
    max: u32,
    backoff: BackoffConfig,
    is_exception: Option<ExceptionFn>,
    hash: HashFn,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::new(),
            max: DEFAULT_RETRY_MAX,
            backoff: BackoffConfig::default(),
            is_exception: None,
            hash: default_hash_fn(),
        }
    }
}

impl RetryOptions {
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

    /// Attempt budget beyond the initial request.
    #[must_use]
    pub fn max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Treat a transport response as a failure when the predicate holds.
    #[must_use]
    pub fn retry_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        self.is_exception = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn hash_with(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }
}

#[derive(Default)]
struct RetrySlot {
    attempts: Mutex<HashMap<RequestHash, u32>>,
}

impl RetrySlot {
    fn attempts(&self, hash: RequestHash) -> u32 {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, hash: RequestHash) -> u32 {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let count = attempts.entry(hash).or_insert(0);
        *count += 1;
        *count
    }

    fn clear(&self, hash: RequestHash) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&hash);
    }
}

fn budget(share: &ShareOptions, default: u32) -> u32 {
    share
        .origin
        .extensions
        .get::<RetryMark>()
        .and_then(|mark| mark.max)
        .unwrap_or(default)
}

/// Build the retry plugin.
pub fn retry(options: RetryOptions) -> Plugin {
    let RetryOptions {
        filter,
        max,
        backoff,
        is_exception,
        hash,
    } = options;
    let filter = Arc::new(filter);

    let err_filter = Arc::clone(&filter);
    let err = Hook::new(move |reason: Error, share: ShareOptions, ctl| {
        let hash = hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, RetrySlot::default);
        let backoff = backoff.clone();
        async move {
            let slot = slot?;
            let max = budget(&share, max);
            let used = slot.attempts(hash);
            if used >= max {
                slot.clear(hash);
                return Err(ctl.abort_error(reason));
            }
            let attempt = slot.record(hash);
            tokio::time::sleep(backoff.delay_for(attempt - 1)).await;
            tracing::debug!(%hash, attempt, "retrying request");
            match share.client.request((*share.origin).clone()).await {
                Ok(response) => {
                    slot.clear(hash);
                    Err(ctl.abort(response))
                }
                // the nested invocation already burned through the budget
                Err(final_reason) => Ok(final_reason),
            }
        }
    })
    .run_when(move |_, share| in_scope(&err_filter, share));

    let mut plugin = Plugin::new("retry")
        .before_register(reject_duplicate("retry"))
        .capture_exception(err);

    if let Some(is_exception) = is_exception {
        let post_filter = Arc::clone(&filter);
        let post = Hook::new(move |response: Response, _, _| {
            let failed = is_exception(&response);
            let status = response.status;
            async move {
                if failed {
                    return Err(HookHalt::Error(Error::Upstream { status }));
                }
                Ok(response)
            }
        })
        .run_when(move |_, share| in_scope(&post_filter, share));
        plugin = plugin.post_response_transform(post);
    }

    plugin
}
