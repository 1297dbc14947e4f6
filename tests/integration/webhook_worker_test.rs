// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{InMemoryEventRepo, InMemoryWebhookRepo};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use hmac::{Hmac, Mac};
use nlprs::domain::models::webhook::{Webhook, WebhookEvent, WebhookEventType, WebhookStatus};
use nlprs::domain::repositories::webhook_event_repository::WebhookEventRepository;
use nlprs::domain::repositories::webhook_repository::WebhookRepository;
use nlprs::workers::webhook_worker::WebhookWorker;
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

type Received = Arc<Mutex<Vec<(String, String, Value)>>>;

/// 启动捕获请求的本地接收端
async fn start_capture_server(received: Received, status: StatusCode) -> String {
    let app = Router::new().route(
        "/hook",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let received = received.clone();
            async move {
                let signature = headers
                    .get("X-Nlprs-Signature")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let event_type = headers
                    .get("X-Nlprs-Event")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                received.lock().unwrap().push((signature, event_type, body));
                status
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/hook", addr)
}

fn expected_signature(secret: &str, payload: &Value) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn worker_for(
    event_repo: Arc<InMemoryEventRepo>,
    webhook_repo: Arc<InMemoryWebhookRepo>,
    max_endpoint_failures: i32,
) -> WebhookWorker<InMemoryEventRepo, InMemoryWebhookRepo> {
    WebhookWorker::new(
        event_repo,
        webhook_repo,
        "global-secret".to_string(),
        max_endpoint_failures,
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_delivery_to_registered_endpoint_signs_with_endpoint_secret() {
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let url = start_capture_server(received.clone(), StatusCode::OK).await;

    let webhook = Webhook::new(
        url,
        vec![WebhookEventType::TaskCompleted],
        None,
        "endpoint-secret".to_string(),
    );
    webhook_repo.create(&webhook).await.unwrap();

    let payload = json!({"task_id": "t-1", "status": "completed"});
    let event = WebhookEvent::for_webhook(
        &webhook,
        WebhookEventType::TaskCompleted,
        payload.clone(),
        3,
    );
    event_repo.create(&event).await.unwrap();

    let worker = worker_for(event_repo.clone(), webhook_repo.clone(), 3);
    worker.process_pending_webhooks().await.unwrap();

    let updated = event_repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(updated.status, WebhookStatus::Delivered);
    assert_eq!(updated.response_status, Some(200));
    assert!(updated.delivered_at.is_some());
    assert!(updated.updated_at >= updated.created_at);

    let requests = received.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (signature, event_type, body) = &requests[0];
    assert_eq!(signature, &expected_signature("endpoint-secret", &payload));
    assert_eq!(event_type, "task.completed");
    assert_eq!(body, &payload);

    // 成功投递刷新端点健康状态
    let endpoint = webhook_repo.find_by_id(webhook.id).await.unwrap().unwrap();
    assert_eq!(endpoint.failure_count, 0);
    assert_eq!(endpoint.last_status, Some(200));
    assert!(endpoint.last_triggered.is_some());
}

#[tokio::test]
async fn test_adhoc_url_uses_global_secret() {
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let url = start_capture_server(received.clone(), StatusCode::OK).await;

    let payload = json!({"batch_job_id": "b-1", "status": "completed"});
    let event = WebhookEvent::for_url(url, WebhookEventType::BatchCompleted, payload.clone(), 3);
    event_repo.create(&event).await.unwrap();

    let worker = worker_for(event_repo.clone(), webhook_repo, 3);
    worker.process_pending_webhooks().await.unwrap();

    let updated = event_repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(updated.status, WebhookStatus::Delivered);

    let requests = received.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0,
        expected_signature("global-secret", &payload)
    );
    assert_eq!(requests[0].1, "batch.completed");
}

#[tokio::test]
async fn test_failed_delivery_schedules_retry_then_dead_letter() {
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let url = start_capture_server(received.clone(), StatusCode::INTERNAL_SERVER_ERROR).await;

    let event = WebhookEvent::for_url(url, WebhookEventType::TaskFailed, json!({"task_id": "t"}), 2);
    event_repo.create(&event).await.unwrap();

    let worker = worker_for(event_repo.clone(), webhook_repo, 3);

    // 第一次失败进入重试等待
    worker.process_pending_webhooks().await.unwrap();
    let mut updated = event_repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(updated.status, WebhookStatus::Failed);
    assert_eq!(updated.attempt_count, 1);
    assert_eq!(updated.response_status, Some(500));
    assert!(updated.next_retry_at.unwrap() > Utc::now());

    // 重试时间未到之前不会再次投递
    worker.process_pending_webhooks().await.unwrap();
    assert_eq!(received.lock().unwrap().len(), 1);

    // 到期后再次失败，达到最大重试次数进入死信
    updated.next_retry_at = Some(Utc::now() - chrono::Duration::seconds(1));
    event_repo.update(&updated).await.unwrap();

    worker.process_pending_webhooks().await.unwrap();
    let updated = event_repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(updated.status, WebhookStatus::Dead);
    // 死信记录真实的尝试次数
    assert_eq!(updated.attempt_count, 2);
    assert_eq!(received.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_event_for_inactive_endpoint_goes_to_dead_letter() {
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let url = start_capture_server(received.clone(), StatusCode::OK).await;

    let mut webhook = Webhook::new(
        url,
        vec![WebhookEventType::TaskCompleted],
        None,
        "secret".to_string(),
    );
    webhook.is_active = false;
    webhook_repo.create(&webhook).await.unwrap();

    let event =
        WebhookEvent::for_webhook(&webhook, WebhookEventType::TaskCompleted, json!({}), 3);
    event_repo.create(&event).await.unwrap();

    let worker = worker_for(event_repo.clone(), webhook_repo, 3);
    worker.process_pending_webhooks().await.unwrap();

    let updated = event_repo.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(updated.status, WebhookStatus::Dead);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_endpoint_deactivated_after_consecutive_failures() {
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());

    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let url = start_capture_server(received.clone(), StatusCode::INTERNAL_SERVER_ERROR).await;

    let webhook = Webhook::new(
        url,
        vec![WebhookEventType::TaskCompleted],
        None,
        "secret".to_string(),
    );
    webhook_repo.create(&webhook).await.unwrap();

    let event =
        WebhookEvent::for_webhook(&webhook, WebhookEventType::TaskCompleted, json!({}), 3);
    event_repo.create(&event).await.unwrap();

    let worker = worker_for(event_repo.clone(), webhook_repo.clone(), 1);
    worker.process_pending_webhooks().await.unwrap();

    let endpoint = webhook_repo.find_by_id(webhook.id).await.unwrap().unwrap();
    assert!(!endpoint.is_active);
    assert_eq!(endpoint.failure_count, 1);
}
