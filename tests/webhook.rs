//! Tests for the inbound webhook and the operational endpoints.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use chat_notify_gateway::bot::ECHO_REPLY;
use chat_notify_gateway::telegram::ChatId;
use common::{build_test_context, post_json, request, settings, DEFAULT_TOKEN};

fn update() -> serde_json::Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1700000000,
            "chat": {"id": -555, "type": "group", "title": "Ops"},
            "from": {"id": 1, "is_bot": false, "first_name": "Sam"},
            "text": "Hello, bot!"
        }
    })
}

#[tokio::test]
async fn test_webhook_echoes_message() {
    let ctx = build_test_context(settings(vec![-1], None), vec![]);

    let (status, body) = post_json(&ctx.app, &format!("/bot/{}", DEFAULT_TOKEN), update()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    // The reply is sent on a background task
    let mut sent = Vec::new();
    for _ in 0..50 {
        sent = ctx.default_client.sent();
        if !sent.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, ChatId::Id(-555));
    assert_eq!(sent[0].text, ECHO_REPLY);
}

#[tokio::test]
async fn test_webhook_rejects_unknown_credential() {
    let ctx = build_test_context(settings(vec![-1], None), vec![]);

    let (status, body) = post_json(&ctx.app, "/bot/not-the-token", update()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not Found"}));
}

#[tokio::test]
async fn test_webhook_checks_secret_token() {
    let ctx = build_test_context(settings(vec![-1], Some("s3cret")), vec![]);
    let uri = format!("/bot/{}", DEFAULT_TOKEN);

    let (status, _) = post_json(&ctx.app, &uri, update()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri(&uri)
        .header("content-type", "application/json")
        .header("X-Telegram-Bot-Api-Secret-Token", "s3cret")
        .body(Body::from(update().to_string()))
        .unwrap();
    let (status, _) = request(&ctx.app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_acknowledges_undecodable_update() {
    let ctx = build_test_context(settings(vec![-1], None), vec![]);

    let (status, _) = post_json(
        &ctx.app,
        &format!("/bot/{}", DEFAULT_TOKEN),
        json!({"unexpected": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(ctx.default_client.sent().is_empty());
}

#[tokio::test]
async fn test_health_and_metrics() {
    let ctx = build_test_context(settings(vec![-1], None), vec![]);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = request(&ctx.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    post_json(&ctx.app, "/send_notification", json!({"text": "hi"})).await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = tower::util::ServiceExt::oneshot(ctx.app.clone(), req)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("notify_gateway_notifications_total"));
}
