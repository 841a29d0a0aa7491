//! Retry behavior through the public API

use super::scripted_client;
use hookline::prelude::*;
use http::StatusCode;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn flaky_options(max: u32) -> RetryOptions {
    RetryOptions::new()
        .max(max)
        .backoff(BackoffConfig::fixed(Duration::from_millis(10)))
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_a_transient_failure() {
    let (client, calls) = scripted_client(|n, _| async move {
        if n == 0 {
            Err(Error::Transport("connection refused".to_string()))
        } else {
            Ok(Response::ok(json!({ "call": n })))
        }
    });
    let client = client.plugin(retry(flaky_options(2))).unwrap();

    let res = client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body["call"], 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_gives_up_after_the_budget() {
    let (client, calls) = scripted_client(|_, _| async {
        Err(Error::Transport("connection refused".to_string()))
    });
    let client = client.plugin(retry(flaky_options(2))).unwrap();

    let res = client.request(RequestConfig::get("/users")).await;
    assert!(matches!(res, Err(Error::Transport(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retry_on_server_error_statuses() {
    let (client, calls) = scripted_client(|n, _| async move {
        let status = if n == 0 {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::OK
        };
        Ok(Response::with_status(status))
    });
    let client = client
        .plugin(retry(
            flaky_options(1).retry_when(|res| res.status.is_server_error()),
        ))
        .unwrap();

    let res = client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_and_logger_compose() {
    let (client, calls) = scripted_client(|n, _| async move {
        if n == 0 {
            Err(Error::Transport("connection refused".to_string()))
        } else {
            Ok(Response::ok(json!(null)))
        }
    });
    let client = client
        .plugin(logger(LoggerOptions::new()))
        .unwrap()
        .plugin(retry(flaky_options(1)))
        .unwrap();

    client.request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_auth_gates_and_remembers() {
    let (client, calls) = scripted_client(|n, _| async move {
        Ok(Response::ok(json!({ "call": n })))
    });
    let attempts = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = std::sync::Arc::clone(&attempts);
    let client = client
        .plugin(auth(
            AuthOptions::new(move |_| {
                let n = seen.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n > 0) }
            })
            .once(true),
        ))
        .unwrap();

    // first login attempt fails, the request never reaches the transport
    let first = client.request(RequestConfig::get("/private")).await;
    assert!(matches!(first, Err(Error::Unauthorized(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // second attempt succeeds and is remembered
    client.request(RequestConfig::get("/private")).await.unwrap();
    client.request(RequestConfig::get("/private")).await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
