#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for Hookline
//!
//! These tests drive the public `hookline` crate end to end: a mock
//! transport stands in for the network, and every request runs through the
//! full plugin lifecycle.

mod cancel_test;
mod dedupe_test;
mod lifecycle_test;
mod retry_test;
mod scoping_test;

use hookline::prelude::*;
use serde_json::json;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Install a test subscriber once so `RUST_LOG` surfaces hook traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client whose transport echoes the resolved URL and params, counting calls.
pub fn echo_client() -> (PluginClient, Arc<AtomicUsize>) {
    scripted_client(|n, config: RequestConfig| async move {
        Ok(Response::ok(json!({
            "url": config.full_url(),
            "params": config.params,
            "call": n,
        })))
    })
}

/// Client backed by an arbitrary transport closure, plus a call counter.
pub fn scripted_client<F, Fut>(script: F) -> (PluginClient, Arc<AtomicUsize>)
where
    F: Fn(usize, RequestConfig) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = hookline::Result<Response>> + Send + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let transport = Arc::new(transport_fn(move |config: RequestConfig| {
        let n = seen.fetch_add(1, Ordering::SeqCst);
        script(n, config)
    }));
    (attach(HttpClient::new(transport)), calls)
}

/// A plugin that appends its name to a shared log whenever one of its hooks
/// runs, for asserting dispatch order.
pub fn probe(name: &'static str, log: &Arc<std::sync::Mutex<Vec<String>>>) -> Plugin {
    let on = |stage: &'static str, log: Arc<std::sync::Mutex<Vec<String>>>| {
        move || log.lock().unwrap().push(format!("{name}:{stage}"))
    };
    let req = on("request", Arc::clone(log));
    let res = on("response", Arc::clone(log));
    let done = on("completed", Arc::clone(log));
    Plugin::new(name)
        .transform_request(Hook::new(move |config: RequestConfig, _, _| {
            req();
            async move { Ok(config) }
        }))
        .post_response_transform(Hook::new(move |response: Response, _, _| {
            res();
            async move { Ok(response) }
        }))
        .completed(Hook::new(move |value, _, _| {
            done();
            async move { Ok(value) }
        }))
}
