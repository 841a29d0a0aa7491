//! Debounce, merge, and throttle through the public API

use super::{echo_client, scripted_client};
use hookline::prelude::*;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_debounce_spaces_out_duplicates() {
    let (client, calls) = scripted_client(|_, _| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Response::ok(json!(null)))
    });
    let client = client
        .plugin(debounce(
            DebounceOptions::new().delay(Duration::from_millis(50)),
        ))
        .unwrap();

    let started = Instant::now();
    let (a, b) = tokio::join!(
        client.request(RequestConfig::get("/users")),
        client.request(RequestConfig::get("/users")),
    );
    a.unwrap();
    b.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_merge_collapses_duplicates_into_one_call() {
    let (client, calls) = scripted_client(|n, _| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Response::ok(json!({ "call": n })))
    });
    let client = client.plugin(merge(MergeOptions::new())).unwrap();

    let (a, b, c) = tokio::join!(
        client.request(RequestConfig::get("/users")),
        client.request(RequestConfig::get("/users")),
        client.request(RequestConfig::get("/users")),
    );
    assert_eq!(a.unwrap().body["call"], 0);
    assert_eq!(b.unwrap().body["call"], 0);
    assert_eq!(c.unwrap().body["call"], 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_rejects_rapid_duplicates() {
    let (client, calls) = echo_client();
    let client = client
        .plugin(throttle(
            ThrottleOptions::new().window(Duration::from_millis(500)),
        ))
        .unwrap();

    client.request(RequestConfig::get("/submit")).await.unwrap();
    let second = client.request(RequestConfig::get("/submit")).await;
    assert!(matches!(second, Err(Error::Throttled(_))));

    tokio::time::sleep(Duration::from_millis(600)).await;
    client.request(RequestConfig::get("/submit")).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fingerprint_distinguishes_params() {
    let (client, calls) = echo_client();
    let client = client
        .plugin(throttle(
            ThrottleOptions::new().window(Duration::from_millis(500)),
        ))
        .unwrap();

    client
        .request(RequestConfig::get("/search").param("q", "rust"))
        .await
        .unwrap();
    client
        .request(RequestConfig::get("/search").param("q", "tokio"))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_merge_and_throttle_compose() {
    // merge first: duplicates collapse before throttle ever sees them
    let (client, calls) = scripted_client(|n, _| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Response::ok(json!({ "call": n })))
    });
    let client = client
        .plugin(merge(MergeOptions::new()))
        .unwrap()
        .plugin(throttle(
            ThrottleOptions::new().window(Duration::from_millis(500)),
        ))
        .unwrap();

    let (a, b) = tokio::join!(
        client.request(RequestConfig::get("/users")),
        client.request(RequestConfig::get("/users")),
    );
    assert_eq!(a.unwrap().body["call"], 0);
    assert_eq!(b.unwrap().body["call"], 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
