//! Request identity for coordination plugins
//!
//! Two requests are "the same" when their full URL, query parameters, and
//! body serialize identically. Debounce, throttle, and merge all key their
//! bookkeeping on this fingerprint; a custom [`HashFn`] overrides the default
//! when equality needs to be looser or stricter.

use serde::Serialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use hookline_http::RequestConfig;

/// Stable identity of one logical request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestHash(u64);

impl fmt::Display for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestHash({:016x})", self.0)
    }
}

/// Pluggable fingerprint strategy.
pub type HashFn = Arc<dyn Fn(&RequestConfig) -> RequestHash + Send + Sync>;

#[derive(Serialize)]
struct FingerprintSource<'a> {
    url: String,
    params: &'a BTreeMap<String, String>,
    body: Option<&'a Value>,
}

/// Fingerprint a request from its resolved URL, params, and body.
///
/// Params are held in an ordered map, so key order never perturbs the hash.
/// Headers and timeouts are deliberately left out: they do not change which
/// resource the request names.
pub fn fingerprint(config: &RequestConfig) -> RequestHash {
    let source = FingerprintSource {
        url: config.full_url(),
        params: &config.params,
        body: config.body.as_ref(),
    };
    let serialized = serde_json::to_string(&source).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    RequestHash(hasher.finish())
}

/// The default strategy as a [`HashFn`].
pub fn default_hash_fn() -> HashFn {
    Arc::new(fingerprint)
}
