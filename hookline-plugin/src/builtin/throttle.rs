//! Throttle duplicate requests
//!
//! The first request with a given fingerprint claims its lane for a window;
//! duplicates arriving before the window closes are rejected outright or
//! parked forever, depending on [`DuplicateBehavior`]. Useful for buttons
//! that must not double-submit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use hookline_common::constants::DEFAULT_THROTTLE_WINDOW;
use hookline_common::Error;
use hookline_core::{
    default_hash_fn, Enforce, HashFn, Hook, Plugin, RequestHash, ShareOptions, UrlFilter,
    UrlPattern,
};

use super::{in_scope, reject_duplicate};

const SLOT: &str = "throttle";

/// Per-request override, set via
/// [`RequestConfig::with_extension`](hookline_http::RequestConfig::with_extension).
#[derive(Clone, Debug)]
pub struct ThrottleMark {
    /// Opt this request out when false.
    pub enabled: bool,
    /// Replace the plugin-wide window for this request.
    pub window: Option<Duration>,
}

/// What happens to a duplicate inside the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateBehavior {
    /// Reject with [`Error::Throttled`].
    #[default]
    Reject,
    /// Park the request; its future never settles.
    Stall,
}

/// Configuration for [`throttle`].
pub struct ThrottleOptions {
    filter: UrlFilter,
    window: Duration,
    on_duplicate: DuplicateBehavior,
    hash: HashFn,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        Self {
            filter: UrlFilter::new(),
            window: DEFAULT_THROTTLE_WINDOW,
            on_duplicate: DuplicateBehavior::default(),
            hash: default_hash_fn(),
        }
    }
}

impl ThrottleOptions {
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

    /// How long a lane stays claimed after its request settles.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn on_duplicate(mut self, behavior: DuplicateBehavior) -> Self {
        self.on_duplicate = behavior;
        self
    }

    #[must_use]
    pub fn hash_with(mut self, hash: HashFn) -> Self {
        self.hash = hash;
        self
    }
}

/// Lane owners, keyed by fingerprint. The owning invocation id prevents a
/// rejected duplicate's teardown from clearing the owner's claim.
#[derive(Default)]
struct ThrottleSlot {
    owners: Mutex<HashMap<RequestHash, Uuid>>,
}

impl ThrottleSlot {
    fn try_claim(&self, hash: RequestHash, owner: Uuid) -> bool {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        if owners.contains_key(&hash) {
            return false;
        }
        owners.insert(hash, owner);
        true
    }

    fn release_later(self: &Arc<Self>, hash: RequestHash, owner: Uuid, window: Duration) {
        let slot = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut owners = slot.owners.lock().unwrap_or_else(PoisonError::into_inner);
            if owners.get(&hash) == Some(&owner) {
                owners.remove(&hash);
            }
        });
    }

    fn owns(&self, hash: RequestHash, owner: Uuid) -> bool {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
            == Some(&owner)
    }
}

fn enabled(share: &ShareOptions) -> bool {
    share
        .origin
        .extensions
        .get::<ThrottleMark>()
        .map_or(true, |mark| mark.enabled)
}

fn effective_window(share: &ShareOptions, default: Duration) -> Duration {
    share
        .origin
        .extensions
        .get::<ThrottleMark>()
        .and_then(|mark| mark.window)
        .unwrap_or(default)
}

/// Build the throttle plugin.
pub fn throttle(options: ThrottleOptions) -> Plugin {
    let ThrottleOptions {
        filter,
        window,
        on_duplicate,
        hash,
    } = options;
    let filter = Arc::new(filter);

    let pre_filter = Arc::clone(&filter);
    let pre_hash = Arc::clone(&hash);
    let pre = Hook::new(move |config, share: ShareOptions, ctl| {
        let hash = pre_hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, ThrottleSlot::default);
        async move {
            if slot?.try_claim(hash, share.request_id) {
                return Ok(config);
            }
            match on_duplicate {
                DuplicateBehavior::Reject => {
                    Err(ctl.abort_error(Error::Throttled(share.origin.full_url())))
                }
                DuplicateBehavior::Stall => Err(ctl.stall()),
            }
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&pre_filter, share));

    let done_filter = Arc::clone(&filter);
    let done = Hook::new(move |value, share: ShareOptions, _| {
        let hash = hash(&share.origin);
        let slot = share.shared.get_or_create(SLOT, ThrottleSlot::default);
        let window = effective_window(&share, window);
        async move {
            let slot = slot?;
            // only the lane owner schedules the release; a rejected
            // duplicate also reaches this hook and must not interfere
            if slot.owns(hash, share.request_id) {
                slot.release_later(hash, share.request_id, window);
            }
            Ok(value)
        }
    })
    .run_when(move |_, share| enabled(share) && in_scope(&done_filter, share));

    Plugin::new("throttle")
        .enforce(Enforce::Pre)
        .before_register(reject_duplicate("throttle"))
        .pre_request_transform(pre)
        .completed(done)
}
