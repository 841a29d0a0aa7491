//! Debounce duplicate requests
//!
//! While a request is in flight, identical requests (same fingerprint) queue
//! up behind it instead of hitting the transport. Each queued request is
//! released one debounce window after its predecessor settles, so rapid
//! duplicate submissions collapse into a slow orderly line.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use hookline_common::constants::DEFAULT_DEBOUNCE_WINDOW;
use hookline_core::{
    default_hash_fn, Enforce, HashFn, Hook, Plugin, RequestHash, ShareOptions, UrlFilter,
    UrlPattern,
};

use super::{in_scope, reject_duplicate};
use std::sync::Arc;

const SLOT: &str = "debounce";

/// Per-request override, set via
/// [`RequestConfig::with_extension`](hookline_http::RequestConfig::with_extension).
#[derive(Clone, Debug)]
pub struct DebounceMark {
    /// Opt this request out when false.
    pub enabled: bool,
    /// Replace the plugin-wide window for this request.
    pub delay: Option<Duration>,
}

/// Configuration for [`debounce`].
pub struct DebounceOptions {
    filter: UrlFilter,
    delay: Duration,
    hash: HashFn,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::new(),
            delay: DEFAULT_DEBOUNCE_WINDOW,
            hash: default_hash_fn(),
        }
    }
}

impl DebounceOptions {
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

    /// Gap enforced between consecutive duplicate requests.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replace the request fingerprint strategy.
    #[must_use]
    pub fn hash_with(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }
}

#[derive(Default)]
struct DebounceSlot {
    waiters: Mutex<HashMap<RequestHash, VecDeque<oneshot::Sender<()>>>>,
}

impl DebounceSlot {
    /// Join the queue for `hash`; `None` means the lane is free and the
    /// caller becomes the in-flight holder.
    fn enqueue(&self, hash: RequestHash) -> Option<oneshot::Receiver<()>> {
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        match waiters.get_mut(&hash) {
            Some(queue) => {
                let (tx, rx) = oneshot::channel();
                queue.push_back(tx);
                Some(rx)
            }
            None => {
                waiters.insert(hash, VecDeque::new());
                None
            }
        }
    }

    /// Hand the lane to the next waiter after `delay`, or close it.
    fn release(&self, hash: RequestHash, delay: Duration) {
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(queue) = waiters.get_mut(&hash) {
            match queue.pop_front() {
                Some(tx) => {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(());
                    });
                }
                None => {
                    waiters.remove(&hash);
                }
            }
        }
    }
}

fn enabled(share: &ShareOptions) -> bool {
    share
        .origin
        .extensions
        .get::<DebounceMark>()
        .map_or(true, |mark| mark.enabled)
}

fn window(share: &ShareOptions, default: Duration) -> Duration {
    share
        .origin
        .extensions
        .get::<DebounceMark>()
        .and_then(|mark| mark.delay)
        .unwrap_or(default)
}

/// Build the debounce plugin.
pub fn debounce(options: DebounceOptions) -> Plugin {
    let DebounceOptions {
        filter,
        delay,
        hash,
    } = options;
    let filter = Arc::new(filter);

    let pre_filter = Arc::clone(&filter);
    let pre_hash = Arc::clone(&hash);
    let pre = Hook::new(move |config, share: ShareOptions, _| {
        let hash = pre_hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, DebounceSlot::default);
        async move {
            if let Some(rx) = slot?.enqueue(hash) {
                // predecessor settles the channel; a dropped sender just
                // means the lane was torn down, so proceed either way
                let _ = rx.await;
            }
            Ok(config)
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&pre_filter, share));

    let done_filter = Arc::clone(&filter);
    let done = Hook::new(move |value, share: ShareOptions, _| {
        let hash = hash(&share.origin);
        let delay = window(&share, delay);
        let slot = share.shared.get_or_create(SLOT, DebounceSlot::default);
        async move {
            slot?.release(hash, delay);
            Ok(value)
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&done_filter, share));

    Plugin::new("debounce")
        .enforce(Enforce::Pre)
        .before_register(reject_duplicate("debounce"))
        .pre_request_transform(pre)
        .completed(done)
}
