//! Registry and state isolation between client attachments

use super::echo_client;
use hookline::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn test_attachments_do_not_share_plugins() {
    let (a, _) = echo_client();
    let (b, _) = echo_client();
    let a = a.plugin(Plugin::new("only-a")).unwrap();

    assert!(a.has_plugin("only-a"));
    assert!(!b.has_plugin("only-a"));
}

#[tokio::test]
async fn test_attachments_do_not_share_state() {
    let (a, _) = echo_client();
    let (b, _) = echo_client();

    let slot: Arc<u32> = a.shared().get_or_create("counter", || 7).unwrap();
    assert_eq!(*slot, 7);
    assert!(!b.shared().contains("counter"));
}

#[tokio::test]
async fn test_clones_share_everything() {
    let (client, _) = echo_client();
    let peer = client.clone();
    let client = client.plugin(Plugin::new("shared")).unwrap();

    assert!(peer.has_plugin("shared"));
    let _: Arc<u32> = client.shared().get_or_create("n", || 1).unwrap();
    assert!(peer.shared().contains("n"));
}

#[tokio::test]
async fn test_plugin_names_reflect_dispatch_order() {
    let (client, _) = echo_client();
    let client = client
        .plugin(Plugin::new("u1"))
        .unwrap()
        .plugin(Plugin::new("late").enforce(Enforce::Post))
        .unwrap()
        .plugin(Plugin::new("early").enforce(Enforce::Pre))
        .unwrap();

    assert_eq!(client.plugin_names(), vec!["early", "u1", "late"]);
}

#[tokio::test]
async fn test_inner_client_stays_bare() {
    let (client, calls) = echo_client();
    let client = client
        .plugin(
            Plugin::new("tagger").transform_request(Hook::new(
                |config: RequestConfig, _, _| async move { Ok(config.param("tagged", "1")) },
            )),
        )
        .unwrap();

    // going through the wrapped client directly bypasses every plugin
    let res = client.inner().request(RequestConfig::get("/users")).await.unwrap();
    assert_eq!(res.body["params"], serde_json::json!({}));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_url_filter_scopes_a_plugin_to_routes() {
    let (client, _) = echo_client();
    let filter = Arc::new(UrlFilter::new().include("/api/").exclude("/api/health"));
    let guard = Arc::clone(&filter);
    let client = client
        .plugin(
            Plugin::new("api-tagger").transform_request(
                Hook::new(|config: RequestConfig, _, _| async move {
                    Ok(config.param("api", "1"))
                })
                .run_when(move |_, share| guard.is_match(&share.origin.full_url())),
            ),
        )
        .unwrap();

    let hit = client.request(RequestConfig::get("/api/users")).await.unwrap();
    assert_eq!(hit.body["params"]["api"], "1");

    let excluded = client.request(RequestConfig::get("/api/health")).await.unwrap();
    assert!(excluded.body["params"].get("api").is_none());

    let outside = client.request(RequestConfig::get("/static/logo")).await.unwrap();
    assert!(outside.body["params"].get("api").is_none());
}
