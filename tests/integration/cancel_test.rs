//! Cancellation through the public API

use super::scripted_client;
use hookline::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn hanging_client() -> (PluginClient, Arc<AtomicUsize>) {
    scripted_client(|_, _| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Response::ok(json!(null)))
    })
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_aborts_every_in_flight_request() {
    let (client, _) = hanging_client();
    let client = client.plugin(cancel(CancelOptions::new())).unwrap();

    let mut pending = Vec::new();
    for path in ["/a", "/b", "/c"] {
        let peer = client.clone();
        pending.push(tokio::spawn(async move {
            peer.request(RequestConfig::get(path)).await
        }));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(cancel_all(&client).unwrap(), 3);
    for handle in pending {
        let res = handle.await.unwrap();
        assert!(matches!(res, Err(Error::Canceled(_))));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_counts_as_an_abort_not_an_error() {
    let recovered = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&recovered);
    let (client, _) = hanging_client();
    let client = client
        .plugin(
            // a would-be recovery hook must never see the cancellation
            Plugin::new("recoverer").capture_exception(Hook::new(move |reason, _, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                async move { Ok(reason) }
            })),
        )
        .unwrap()
        // error hooks fold in reverse registration order, so cancel's
        // reclassification runs before the recoverer and halts the fold
        .plugin(cancel(CancelOptions::new()))
        .unwrap();

    let peer = client.clone();
    let pending = tokio::spawn(async move { peer.request(RequestConfig::get("/slow")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel_all(&client).unwrap();

    let res = pending.await.unwrap();
    assert!(matches!(res, Err(Error::Canceled(_))));
    assert_eq!(recovered.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_caller_supplied_token_survives_the_plugin() {
    let (client, _) = hanging_client();
    let client = client.plugin(cancel(CancelOptions::new())).unwrap();

    let token = tokio_util::sync::CancellationToken::new();
    let mut config = RequestConfig::get("/slow");
    config.cancel = Some(token.clone());

    let peer = client.clone();
    let pending = tokio::spawn(async move { peer.request(config).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let res = pending.await.unwrap();
    assert!(matches!(res, Err(Error::Canceled(_))));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_still_applies_under_the_plugin() {
    let (client, _) = hanging_client();
    let client = client.plugin(cancel(CancelOptions::new())).unwrap();

    let res = client
        .request(RequestConfig::get("/slow").timeout(Duration::from_millis(200)))
        .await;
    assert!(matches!(res, Err(Error::Timeout(_))));
}
