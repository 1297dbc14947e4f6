// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::application::dto::task_response::{WebhookCreatedDto, WebhookResponseDto};
use crate::application::dto::webhook_request::CreateWebhookRequestDto;
use crate::domain::models::task::DomainError;
use crate::domain::models::webhook::{WebhookEvent, WebhookEventType};
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::use_cases::create_webhook::CreateWebhookUseCase;
use crate::presentation::errors::AppError;
use axum::{extract::Path, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

fn parse_events(raw: &[String]) -> Result<Vec<WebhookEventType>, DomainError> {
    raw.iter()
        .map(|s| {
            s.parse().map_err(|_| {
                DomainError::ValidationError(format!("Unknown event type: {}", s))
            })
        })
        .collect()
}

/// 注册Webhook端点
///
/// 签名密钥仅在本次响应中返回
pub async fn create_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Json(payload): Json<CreateWebhookRequestDto>,
) -> Result<(StatusCode, Json<WebhookCreatedDto>), AppError> {
    payload.validate()?;
    let events = parse_events(&payload.events)?;

    let use_case = CreateWebhookUseCase::new(repo);
    let webhook = use_case
        .execute(payload.url, events, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(webhook.into())))
}

/// 列出所有已注册的Webhook端点
pub async fn list_webhooks<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
) -> Result<Json<Vec<WebhookResponseDto>>, AppError> {
    let webhooks = repo.find_all().await?;
    Ok(Json(webhooks.into_iter().map(Into::into).collect()))
}

/// 删除Webhook端点
pub async fn delete_webhook<R: WebhookRepository>(
    Extension(repo): Extension<Arc<R>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 触发测试事件
///
/// 为指定端点排入一条测试事件，经由正常投递管道发送
pub async fn test_webhook<R, E>(
    Extension(repo): Extension<Arc<R>>,
    Extension(event_repo): Extension<Arc<E>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError>
where
    R: WebhookRepository,
    E: WebhookEventRepository,
{
    let webhook = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    if !webhook.is_active {
        return Err(DomainError::ValidationError("Webhook is deactivated".to_string()).into());
    }

    let event = WebhookEvent::for_webhook(
        &webhook,
        WebhookEventType::Test,
        json!({
            "event": "test",
            "webhook_id": webhook.id,
            "timestamp": Utc::now(),
        }),
        0,
    );
    event_repo.create(&event).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued", "event_id": event.id })),
    ))
}
