// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::{WebhookEvent, WebhookEventType};
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use std::sync::Arc;
use tracing::debug;

/// 通知服务
///
/// 将领域事件扇出为Webhook事件。对每个订阅了该事件类型的
/// 启用端点各生成一条待投递记录，实际投递由后台工作器完成。
pub struct NotificationService<W: WebhookRepository, E: WebhookEventRepository> {
    webhook_repo: Arc<W>,
    event_repo: Arc<E>,
    max_retries: i32,
}

impl<W: WebhookRepository, E: WebhookEventRepository> NotificationService<W, E> {
    /// 创建通知服务实例
    pub fn new(webhook_repo: Arc<W>, event_repo: Arc<E>, max_retries: i32) -> Self {
        Self {
            webhook_repo,
            event_repo,
            max_retries,
        }
    }

    /// 发布事件到所有订阅端点
    ///
    /// # 参数
    ///
    /// * `event_type` - 事件类型
    /// * `payload` - 事件负载
    ///
    /// # 返回值
    ///
    /// 返回生成的事件数量
    pub async fn publish(
        &self,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<usize, RepositoryError> {
        let subscribers = self.webhook_repo.find_active_by_event(&event_type).await?;
        if subscribers.is_empty() {
            debug!(event_type = %event_type, "No active webhook subscribers for event");
            return Ok(0);
        }

        for webhook in &subscribers {
            let event = WebhookEvent::for_webhook(
                webhook,
                event_type.clone(),
                payload.clone(),
                self.max_retries,
            );
            self.event_repo.create(&event).await?;
        }

        debug!(
            event_type = %event_type,
            count = subscribers.len(),
            "Queued webhook events for subscribers"
        );
        Ok(subscribers.len())
    }

    /// 发布事件到临时回调URL
    ///
    /// 批处理作业可附带一次性回调URL，该URL不需要注册端点
    pub async fn publish_to_url(
        &self,
        url: String,
        event_type: WebhookEventType,
        payload: serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let event = WebhookEvent::for_url(url, event_type, payload, self.max_retries);
        self.event_repo.create(&event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::webhook::{Webhook, WebhookStatus};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FakeWebhookRepo {
        webhooks: Vec<Webhook>,
    }

    #[async_trait]
    impl WebhookRepository for FakeWebhookRepo {
        async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
            Ok(webhook.clone())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
            Ok(None)
        }
        async fn find_all(&self) -> Result<Vec<Webhook>, RepositoryError> {
            Ok(self.webhooks.clone())
        }
        async fn find_active_by_event(
            &self,
            event_type: &WebhookEventType,
        ) -> Result<Vec<Webhook>, RepositoryError> {
            Ok(self
                .webhooks
                .iter()
                .filter(|w| w.subscribes_to(event_type))
                .cloned()
                .collect())
        }
        async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
            Ok(webhook.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeEventRepo {
        created: Mutex<Vec<WebhookEvent>>,
    }

    #[async_trait]
    impl WebhookEventRepository for FakeEventRepo {
        async fn create(&self, event: &WebhookEvent) -> Result<WebhookEvent, RepositoryError> {
            self.created.lock().unwrap().push(event.clone());
            Ok(event.clone())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<WebhookEvent>, RepositoryError> {
            Ok(None)
        }
        async fn find_pending(&self, _limit: u64) -> Result<Vec<WebhookEvent>, RepositoryError> {
            Ok(vec![])
        }
        async fn update(&self, event: &WebhookEvent) -> Result<WebhookEvent, RepositoryError> {
            Ok(event.clone())
        }
    }

    fn webhook_for(events: Vec<WebhookEventType>, active: bool) -> Webhook {
        let mut w = Webhook::new(
            "https://example.com/hook".to_string(),
            events,
            None,
            "secret".to_string(),
        );
        w.is_active = active;
        w
    }

    #[tokio::test]
    async fn test_publish_fans_out_to_subscribers_only() {
        let webhook_repo = Arc::new(FakeWebhookRepo {
            webhooks: vec![
                webhook_for(vec![WebhookEventType::TaskCompleted], true),
                webhook_for(vec![WebhookEventType::TaskFailed], true),
                webhook_for(vec![WebhookEventType::TaskCompleted], false),
            ],
        });
        let event_repo = Arc::new(FakeEventRepo::default());
        let service = NotificationService::new(webhook_repo, event_repo.clone(), 3);

        let count = service
            .publish(WebhookEventType::TaskCompleted, json!({"task_id": "t"}))
            .await
            .unwrap();

        assert_eq!(count, 1);
        let created = event_repo.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, WebhookStatus::Pending);
        assert!(created[0].webhook_id.is_some());
    }

    #[tokio::test]
    async fn test_publish_to_url_creates_anonymous_event() {
        let webhook_repo = Arc::new(FakeWebhookRepo { webhooks: vec![] });
        let event_repo = Arc::new(FakeEventRepo::default());
        let service = NotificationService::new(webhook_repo, event_repo.clone(), 3);

        service
            .publish_to_url(
                "https://example.com/batch".to_string(),
                WebhookEventType::BatchCompleted,
                json!({"batch_job_id": "b"}),
            )
            .await
            .unwrap();

        let created = event_repo.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert!(created[0].webhook_id.is_none());
        assert_eq!(created[0].webhook_url, "https://example.com/batch");
    }
}
