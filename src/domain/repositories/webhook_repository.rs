// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::webhook::{Webhook, WebhookEventType};
use async_trait::async_trait;
use uuid::Uuid;

/// Webhook仓库特质
///
/// 定义Webhook端点配置数据访问接口
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// 创建Webhook
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError>;
    /// 根据ID查找Webhook
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError>;
    /// 查找所有Webhook
    async fn find_all(&self) -> Result<Vec<Webhook>, RepositoryError>;
    /// 查找订阅了指定事件类型的启用端点
    async fn find_active_by_event(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError>;
    /// 更新Webhook
    async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError>;
    /// 删除Webhook
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
