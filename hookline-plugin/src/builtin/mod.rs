//! The plugin constructors

pub mod auth;
pub mod cancel;
pub mod debounce;
pub mod logger;
pub mod merge;
pub mod retry;
pub mod throttle;

use std::sync::Arc;

use hookline_common::{Error, Result};
use hookline_core::{PluginClient, ShareOptions, UrlFilter};

/// Whether a plugin's hooks apply to this invocation's original URL.
pub(crate) fn in_scope(filter: &Arc<UrlFilter>, share: &ShareOptions) -> bool {
    filter.is_match(&share.origin.full_url())
}

/// Registration veto shared by the coordination plugins: two instances of
/// the same plugin on one client would fight over the same state slot.
pub(crate) fn reject_duplicate(name: &'static str) -> impl Fn(&PluginClient) -> Result<()> {
    move |client| {
        if client.has_plugin(name) {
            return Err(Error::Veto {
                plugin: name.to_string(),
                reason: "already registered on this client".to_string(),
            });
        }
        Ok(())
    }
}
