//! Merge duplicate in-flight requests
//!
//! The first request with a given fingerprint becomes the leader and goes to
//! the transport; duplicates arriving while it is in flight subscribe to its
//! outcome instead. The leader's response (or failure) is fanned out to every
//! subscriber, and the subscription stays open a short window after settling
//! to catch stragglers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use hookline_common::constants::DEFAULT_MERGE_WINDOW;
use hookline_common::Error;
use hookline_core::{
    default_hash_fn, Enforce, HashFn, Hook, Plugin, RequestHash, ShareOptions, UrlFilter,
    UrlPattern,
};
use hookline_http::Response;

use super::{in_scope, reject_duplicate};

const SLOT: &str = "merge";

type Outcome = Result<Response, String>;

/// Per-request override, set via
/// [`RequestConfig::with_extension`](hookline_http::RequestConfig::with_extension).
#[derive(Clone, Debug)]
pub struct MergeMark {
    /// Opt this request out when false.
    pub enabled: bool,
}

/// Configuration for [`merge`].
pub struct MergeOptions {
    filter: UrlFilter,
    window: Duration,
    hash: HashFn,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::new(),
            window: DEFAULT_MERGE_WINDOW,
            hash: default_hash_fn(),
        }
    }
}

impl MergeOptions {
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

    /// How long after settling duplicates still receive the shared outcome.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn hash_with(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }
}

#[derive(Default)]
struct MergeSlot {
    subscribers: Mutex<HashMap<RequestHash, Vec<oneshot::Sender<Outcome>>>>,
}

impl MergeSlot {
    /// Subscribe to an in-flight leader; `None` means the caller leads.
    fn subscribe(&self, hash: RequestHash) -> Option<oneshot::Receiver<Outcome>> {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match subscribers.get_mut(&hash) {
            Some(list) => {
                let (tx, rx) = oneshot::channel();
                list.push(tx);
                Some(rx)
            }
            None => {
                subscribers.insert(hash, Vec::new());
                None
            }
        }
    }

    /// Fan the outcome out now, then keep the lane open one more window for
    /// late subscribers before tearing it down.
    fn distribute(self: &Arc<Self>, hash: RequestHash, outcome: &Outcome, window: Duration) {
        let immediate = {
            let mut subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers
                .get_mut(&hash)
                .map(std::mem::take)
                .unwrap_or_default()
        };
        for tx in immediate {
            let _ = tx.send(outcome.clone());
        }

        let slot = Arc::clone(self);
        let outcome = outcome.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let late = {
                let mut subscribers = slot
                    .subscribers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                subscribers.remove(&hash).unwrap_or_default()
            };
            for tx in late {
                let _ = tx.send(outcome.clone());
            }
        });
    }
}

fn enabled(share: &ShareOptions) -> bool {
    share
        .origin
        .extensions
        .get::<MergeMark>()
        .map_or(true, |mark| mark.enabled)
}

/// Build the merge plugin.
pub fn merge(options: MergeOptions) -> Plugin {
    let MergeOptions {
        filter,
        window,
        hash,
    } = options;
    let filter = Arc::new(filter);

    let pre_filter = Arc::clone(&filter);
    let pre_hash = Arc::clone(&hash);
    let pre = Hook::new(move |config, share: ShareOptions, ctl| {
        let hash = pre_hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, MergeSlot::default);
        async move {
            let Some(rx) = slot?.subscribe(hash) else {
                return Ok(config);
            };
            match rx.await {
                Ok(Ok(response)) => Err(ctl.abort(response)),
                Ok(Err(reason)) => Err(ctl.abort_error(Error::Merged(reason))),
                // leader torn down without an outcome: run independently
                Err(_) => Ok(config),
            }
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&pre_filter, share));

    let post_filter = Arc::clone(&filter);
    let post_hash = Arc::clone(&hash);
    let post = Hook::new(move |response: Response, share: ShareOptions, _| {
        let hash = post_hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, MergeSlot::default);
        async move {
            slot?.distribute(hash, &Ok(response.clone()), window);
            Ok(response)
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&post_filter, share));

    let err_filter = Arc::clone(&filter);
    let err = Hook::new(move |reason: Error, share: ShareOptions, _| {
        let hash = hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, MergeSlot::default);
        async move {
            slot?.distribute(hash, &Err(reason.to_string()), window);
            Ok(reason)
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&err_filter, share));

    Plugin::new("merge")
        .enforce(Enforce::Pre)
        .before_register(reject_duplicate("merge"))
        .pre_request_transform(pre)
        .post_response_transform(post)
        .capture_exception(err)
}
