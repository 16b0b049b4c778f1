use std::sync::Arc;

use serde_json::json;
use tla_core::{
    Aggregator, CollectorRole, KeyValueStore, MemoryStore, Router, StaticCollector,
};
use tla_protocol::{Fragment, LocationFragment};

fn router() -> (Router, Arc<MemoryStore>) {
    let kv = Arc::new(MemoryStore::new());
    let agg = Aggregator::new(vec![Arc::new(StaticCollector::new(
        "overview",
        CollectorRole::Comprehensive,
        Some(Fragment {
            locations: vec![LocationFragment {
                name: Some("Capital".into()),
                ..LocationFragment::new("v1")
            }],
            active_location: Some("v1".into()),
            ..Fragment::default()
        }),
    ))]);
    let router = Router::new(agg, kv.clone()).with_observation("https://x/dorf2.php");
    (router, kv)
}

#[tokio::test]
async fn unknown_type_gets_a_single_failure() {
    let (router, _) = router();
    let reply = router.handle_json(&json!({"type": "OPEN_SIDEBAR"})).await;
    assert_eq!(
        reply,
        json!({"success": false, "error": "Unknown message type"})
    );
    let reply = router.handle_json(&json!({"payload": 1})).await;
    assert_eq!(reply["error"], "Unknown message type");
}

#[tokio::test]
async fn malformed_known_type_reports_invalid_message() {
    let (router, _) = router();
    let reply = router
        .handle_json(&json!({"type": "GAME_CONTEXT_UPDATE"}))
        .await;
    assert_eq!(reply["success"], false);
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid GAME_CONTEXT_UPDATE"));
}

#[tokio::test]
async fn context_update_is_stored_and_persisted() {
    let (router, kv) = router();
    let reply = router
        .handle_json(&json!({"type": "GAME_CONTEXT_UPDATE", "context": {"tribe": "Gauls"}}))
        .await;
    assert_eq!(reply, json!({"success": true}));

    let reply = router.handle_json(&json!({"type": "GET_GAME_CONTEXT"})).await;
    assert_eq!(reply["context"]["tribe"], "Gauls");
    assert!(reply["lastUpdate"].as_i64().is_some());

    assert_eq!(
        kv.get("gameContext").await.unwrap(),
        Some(json!({"tribe": "Gauls"}))
    );

    let (fresh, _) = router_sharing(kv.clone());
    assert!(fresh.restore().await.unwrap());
    let reply = fresh.handle_json(&json!({"type": "GET_GAME_CONTEXT"})).await;
    assert_eq!(reply["context"]["tribe"], "Gauls");
}

fn router_sharing(kv: Arc<MemoryStore>) -> (Router, Arc<MemoryStore>) {
    (Router::new(Aggregator::new(Vec::new()), kv.clone()), kv)
}

#[tokio::test]
async fn chat_context_keeps_supplied_timestamp() {
    let (router, kv) = router();
    router
        .handle_json(&json!({
            "type": "CHAT_MESSAGE_WITH_CONTEXT",
            "gameContext": {"page": "buildings"},
            "timestamp": 1_700_000_000_000i64,
        }))
        .await;
    let reply = router.handle_json(&json!({"type": "GET_GAME_CONTEXT"})).await;
    assert_eq!(reply["context"]["page"], "buildings");
    assert_eq!(reply["lastUpdate"], 1_700_000_000_000i64);
    assert!(kv.is_empty().await);
}

#[tokio::test]
async fn refresh_runs_a_cycle_and_returns_advice() {
    let (router, _) = router();
    let reply = router.handle_json(&json!({"type": "REFRESH_DATA"})).await;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["snapshot"]["page"], "buildings");
    assert_eq!(reply["snapshot"]["locations"]["v1"]["name"], "Capital");
    assert_eq!(reply["advice"]["pick"]["priority"], 70);
    assert_eq!(
        reply["advice"]["pick"]["detail"],
        "No buildings queued. Add an upgrade now."
    );
}

#[tokio::test]
async fn context_falls_back_to_snapshot() {
    let (router, _) = router();
    router
        .handle_json(&json!({"type": "REFRESH_DATA", "observation": "https://x/dorf1.php"}))
        .await;
    let reply = router.handle_json(&json!({"type": "GET_GAME_CONTEXT"})).await;
    assert_eq!(reply["context"]["page"], "resources");
    assert!(reply["advice"].is_object());
}

#[tokio::test]
async fn user_email_requires_stored_identity() {
    let (router, _) = router();
    let reply = router.handle_json(&json!({"type": "REQUEST_USER_EMAIL"})).await;
    assert_eq!(reply["success"], false);

    let token = router
        .profiles()
        .set_identity_from_email("Player@Example.com")
        .await
        .unwrap();
    let reply = router.handle_json(&json!({"type": "REQUEST_USER_EMAIL"})).await;
    assert_eq!(reply["success"], true);
    assert_eq!(reply["userHash"], token);
}
