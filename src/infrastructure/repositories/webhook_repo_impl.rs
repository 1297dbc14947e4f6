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

use crate::domain::models::webhook::{Webhook, WebhookEventType};
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::infrastructure::database::entities::webhook as webhook_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// Webhook仓库实现
///
/// 基于SeaORM实现的Webhook端点配置数据访问层。
/// 订阅的事件类型以JSON字符串数组形式存储。
#[derive(Clone)]
pub struct WebhookRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl WebhookRepositoryImpl {
    /// 创建新的Webhook仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn events_to_json(events: &[WebhookEventType]) -> serde_json::Value {
    serde_json::Value::Array(
        events
            .iter()
            .map(|e| serde_json::Value::String(e.to_string()))
            .collect(),
    )
}

fn events_from_json(value: &serde_json::Value) -> Vec<WebhookEventType> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| s.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

impl From<webhook_entity::Model> for Webhook {
    fn from(model: webhook_entity::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            events: events_from_json(&model.events),
            description: model.description,
            secret: model.secret,
            is_active: model.is_active,
            failure_count: model.failure_count,
            last_triggered: model.last_triggered.map(Into::into),
            last_status: model.last_status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Webhook> for webhook_entity::ActiveModel {
    fn from(webhook: Webhook) -> Self {
        Self {
            id: Set(webhook.id),
            url: Set(webhook.url.clone()),
            events: Set(events_to_json(&webhook.events)),
            description: Set(webhook.description.clone()),
            secret: Set(webhook.secret.clone()),
            is_active: Set(webhook.is_active),
            failure_count: Set(webhook.failure_count),
            last_triggered: Set(webhook.last_triggered.map(Into::into)),
            last_status: Set(webhook.last_status),
            created_at: Set(webhook.created_at.into()),
            updated_at: Set(webhook.updated_at.into()),
        }
    }
}

#[async_trait]
impl WebhookRepository for WebhookRepositoryImpl {
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        let model: webhook_entity::ActiveModel = webhook.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(webhook.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        let model = webhook_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_all(&self) -> Result<Vec<Webhook>, RepositoryError> {
        let models = webhook_entity::Entity::find()
            .order_by_asc(webhook_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_active_by_event(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        // 事件列表为JSON列，订阅匹配在内存中完成
        let models = webhook_entity::Entity::find()
            .filter(webhook_entity::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await?;

        Ok(models
            .into_iter()
            .map(Webhook::from)
            .filter(|w| w.events.contains(event_type))
            .collect())
    }

    async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        let mut model: webhook_entity::ActiveModel = webhook.clone().into();

        model.is_active = Set(webhook.is_active);
        model.failure_count = Set(webhook.failure_count);
        model.last_triggered = Set(webhook.last_triggered.map(Into::into));
        model.last_status = Set(webhook.last_status);
        model.updated_at = Set(Utc::now().into());

        let updated_model = model.update(self.db.as_ref()).await?;
        Ok(updated_model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = webhook_entity::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
