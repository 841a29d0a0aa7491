//! Lifecycle ordering across the full request path

use super::{echo_client, probe, scripted_client};
use hookline::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Arc<Mutex<Vec<String>>>, stage: &str) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|e| e.ends_with(stage))
        .map(|e| e.split(':').next().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_enforce_classes_order_request_hooks() {
    super::init_tracing();
    let order = log();
    let (client, _) = echo_client();
    let client = client
        .plugin(probe("a", &order))
        .unwrap()
        .plugin(probe("b", &order))
        .unwrap()
        .plugin(probe("c", &order).enforce(Enforce::Post))
        .unwrap()
        .plugin(probe("d", &order).enforce(Enforce::Pre))
        .unwrap()
        .plugin(probe("e", &order))
        .unwrap();

    client.request(RequestConfig::get("/users")).await.unwrap();

    assert_eq!(entries(&order, "request"), vec!["d", "a", "b", "e", "c"]);
}

#[tokio::test]
async fn test_response_hooks_run_reversed() {
    let order = log();
    let (client, _) = echo_client();
    let client = client
        .plugin(probe("d", &order).enforce(Enforce::Pre))
        .unwrap()
        .plugin(probe("a", &order))
        .unwrap()
        .plugin(probe("c", &order).enforce(Enforce::Post))
        .unwrap();

    client.request(RequestConfig::get("/users")).await.unwrap();

    assert_eq!(entries(&order, "request"), vec!["d", "a", "c"]);
    assert_eq!(entries(&order, "response"), vec!["c", "a", "d"]);
    assert_eq!(entries(&order, "completed"), vec!["c", "a", "d"]);
}

#[tokio::test]
async fn test_request_transforms_accumulate() {
    let (client, _) = echo_client();
    let client = client
        .plugin(
            Plugin::new("first").transform_request(Hook::new(
                |config: RequestConfig, _, _| async move { Ok(config.param("first", "1")) },
            )),
        )
        .unwrap()
        .plugin(
            Plugin::new("second").transform_request(Hook::new(
                |config: RequestConfig, _, _| async move { Ok(config.param("second", "2")) },
            )),
        )
        .unwrap();

    let res = client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body["params"]["first"], "1");
    assert_eq!(res.body["params"]["second"], "2");
}

#[tokio::test]
async fn test_error_folds_through_capture_hooks_reversed() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (client, _) = scripted_client(|_, _| async {
        Err(Error::Transport("connection refused".to_string()))
    });
    let mut client = client;
    for name in ["outer", "inner"] {
        let seen = Arc::clone(&seen);
        client = client
            .plugin(
                Plugin::new(name).capture_exception(Hook::new(move |reason, _, _| {
                    seen.lock().unwrap().push(name);
                    async move { Ok(reason) }
                })),
            )
            .unwrap();
    }

    let res = client.request(RequestConfig::get("/users")).await;
    assert!(matches!(res, Err(Error::Transport(_))));
    assert_eq!(*seen.lock().unwrap(), vec!["inner", "outer"]);
}

#[tokio::test]
async fn test_capture_recovery_produces_a_response() {
    let (client, _) = scripted_client(|_, _| async {
        Err(Error::Transport("connection refused".to_string()))
    });
    let client = client
        .plugin(
            Plugin::new("fallback").capture_exception(Hook::new(|_, _, ctl| async move {
                Err(ctl.abort(Response::ok(json!({ "source": "cache" }))))
            })),
        )
        .unwrap();

    let res = client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body["source"], "cache");
}

#[tokio::test]
async fn test_abort_skips_transport_and_later_stages() {
    let responses = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&responses);
    let (client, calls) = echo_client();
    let client = client
        .plugin(
            Plugin::new("answer-from-cache").pre_request_transform(Hook::new(
                |_, _, ctl| async move { Err(ctl.abort(Response::ok(json!("cached")))) },
            )),
        )
        .unwrap()
        .plugin(
            Plugin::new("never-runs").post_response_transform(Hook::new(move |res, _, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                async move { Ok(res) }
            })),
        )
        .unwrap();

    let res = client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body, json!("cached"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(responses.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_aborted_hook_sees_the_substitute_outcome() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&observed);
    let (client, _) = echo_client();
    let client = client
        .plugin(
            Plugin::new("aborter")
                .pre_request_transform(Hook::new(|_, _, ctl| async move {
                    Err(ctl.abort(Response::ok(json!("early"))))
                }))
                .aborted(Hook::new(move |payload, _, _| {
                    let tag = match &payload {
                        hookline_core::HookPayload::Resolved(_) => "resolved",
                        hookline_core::HookPayload::Rejected(_) => "rejected",
                    };
                    seen.lock().unwrap().push(tag);
                    async move { Ok(payload) }
                })),
        )
        .unwrap();

    client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(*observed.lock().unwrap(), vec!["resolved"]);
}

#[tokio::test]
async fn test_completed_runs_once_whatever_the_outcome() {
    for fail in [false, true] {
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        let (client, _) = scripted_client(move |_, _| async move {
            if fail {
                Err(Error::Transport("connection refused".to_string()))
            } else {
                Ok(Response::ok(json!(null)))
            }
        });
        let client = client
            .plugin(Plugin::new("counter").completed(Hook::new(move |v, _, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                async move { Ok(v) }
            })))
            .unwrap();

        let _ = client.request(RequestConfig::get("/users")).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_wrap_behaves_like_request() {
    let (client, _) = echo_client();
    let client = client
        .plugin(
            Plugin::new("tagger").transform_request(Hook::new(
                |config: RequestConfig, _, _| async move { Ok(config.param("tagged", "1")) },
            )),
        )
        .unwrap();

    let call = client.wrap();
    let res = call(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body["params"]["tagged"], "1");
}
