//! Hook ordering and sequential dispatch
//!
//! For each lifecycle event the registered plugins' hooks run one after
//! another, folding the event value through every applicable handler. Request
//! events run in registration order (forward); response, error, completion,
//! and abort events run reversed, so the plugin registered first wraps
//! outermost on the way out.

use std::sync::Arc;
use tracing::trace;

use crate::hook::{Enforce, Hook, HookController, HookResult, Lifecycle, Plugin, ShareOptions};

/// Which way to walk the plugin list for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Fold `value` through every applicable hook for one event.
///
/// Hooks run strictly sequentially; the first `Halt` wins and the remaining
/// hooks for this event are skipped.
pub async fn dispatch<T>(
    plugins: &[Arc<Plugin>],
    event: &'static str,
    select: fn(&Lifecycle) -> Option<&Hook<T>>,
    direction: Direction,
    mut value: T,
    share: &ShareOptions,
) -> HookResult<T> {
    let mut ordered: Vec<&Arc<Plugin>> = plugins.iter().collect();
    if direction == Direction::Reverse {
        ordered.reverse();
    }
    for plugin in ordered {
        let Some(hook) = select(plugin.lifecycle()) else {
            continue;
        };
        if !hook.applies(&value, share) {
            continue;
        }
        trace!(plugin = plugin.name(), event, "running hook");
        value = hook
            .invoke(value, share.clone(), HookController::default())
            .await?;
    }
    Ok(value)
}

/// Whether any registered plugin fills the selected hook slot.
pub fn has_hook<T>(plugins: &[Arc<Plugin>], select: fn(&Lifecycle) -> Option<&Hook<T>>) -> bool {
    plugins.iter().any(|p| select(p.lifecycle()).is_some())
}

/// Stable sort by enforce class: pre plugins first, post plugins last,
/// unordered plugins keeping registration order among themselves.
pub(crate) fn sort_by_enforce(plugins: &mut [Arc<Plugin>]) {
    // The pairwise rule below is not a total order (a pre and a post compare
    // "less" both ways), so std sorts cannot be trusted with it. A plain
    // insertion sort applies it stably, which is all the ordering contract
    // needs.
    for i in 1..plugins.len() {
        let mut j = i;
        while j > 0 && ranks_before(&plugins[j], &plugins[j - 1]) {
            plugins.swap(j, j - 1);
            j -= 1;
        }
    }
}

fn ranks_before(a: &Arc<Plugin>, b: &Arc<Plugin>) -> bool {
    let (a, b) = (a.enforce_class(), b.enforce_class());
    if a == Enforce::Pre || b == Enforce::Post {
        // equal classes stay put to keep the sort stable
        a != b
    } else {
        false
    }
}
