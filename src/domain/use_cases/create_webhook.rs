// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::DomainError;
use crate::domain::models::webhook::{Webhook, WebhookEventType};
use crate::domain::repositories::webhook_repository::WebhookRepository;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::sync::Arc;
use url::Url;

/// 创建Webhook用例
///
/// 注册一个新的Webhook端点：校验回调URL，生成端点专属的
/// 签名密钥，然后持久化配置。
pub struct CreateWebhookUseCase<R: WebhookRepository> {
    repo: Arc<R>,
}

impl<R: WebhookRepository> CreateWebhookUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        url: String,
        events: Vec<WebhookEventType>,
        description: Option<String>,
    ) -> Result<Webhook, DomainError> {
        let parsed = Url::parse(&url)
            .map_err(|e| DomainError::ValidationError(format!("Invalid webhook URL: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DomainError::ValidationError(
                "Webhook URL must use http or https".to_string(),
            ));
        }
        if events.is_empty() {
            return Err(DomainError::ValidationError(
                "At least one event type is required".to_string(),
            ));
        }

        let secret = generate_secret();
        let webhook = Webhook::new(url, events, description, secret);
        self.repo
            .create(&webhook)
            .await
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        Ok(webhook)
    }
}

/// 生成URL安全的随机签名密钥
fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::task_repository::RepositoryError;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct NoopRepo;

    #[async_trait]
    impl WebhookRepository for NoopRepo {
        async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
            Ok(webhook.clone())
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
            Ok(None)
        }
        async fn find_all(&self) -> Result<Vec<Webhook>, RepositoryError> {
            Ok(vec![])
        }
        async fn find_active_by_event(
            &self,
            _event_type: &WebhookEventType,
        ) -> Result<Vec<Webhook>, RepositoryError> {
            Ok(vec![])
        }
        async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
            Ok(webhook.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_webhook_generates_secret() {
        let use_case = CreateWebhookUseCase::new(Arc::new(NoopRepo));
        let webhook = use_case
            .execute(
                "https://example.com/hook".to_string(),
                vec![WebhookEventType::TaskCompleted],
                None,
            )
            .await
            .unwrap();
        assert!(webhook.is_active);
        assert!(webhook.secret.len() >= 40);
    }

    #[tokio::test]
    async fn test_rejects_invalid_url() {
        let use_case = CreateWebhookUseCase::new(Arc::new(NoopRepo));
        let result = use_case
            .execute(
                "not-a-url".to_string(),
                vec![WebhookEventType::TaskCompleted],
                None,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let use_case = CreateWebhookUseCase::new(Arc::new(NoopRepo));
        let result = use_case
            .execute(
                "ftp://example.com/hook".to_string(),
                vec![WebhookEventType::TaskCompleted],
                None,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejects_empty_event_list() {
        let use_case = CreateWebhookUseCase::new(Arc::new(NoopRepo));
        let result = use_case
            .execute("https://example.com/hook".to_string(), vec![], None)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
