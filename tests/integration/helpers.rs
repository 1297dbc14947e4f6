// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试辅助模块
///
/// 提供内存版仓库实现和NLP服务桩，测试不依赖
/// 真实的PostgreSQL和Redis实例。
use async_trait::async_trait;
use chrono::Utc;
use nlprs::config::settings::CacheSettings;
use nlprs::domain::models::batch_job::BatchJob;
use nlprs::domain::models::task::{Task, TaskStatus, TaskType};
use nlprs::domain::models::webhook::{Webhook, WebhookEvent, WebhookEventType, WebhookStatus};
use nlprs::domain::repositories::batch_job_repository::BatchJobRepository;
use nlprs::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use nlprs::domain::repositories::webhook_event_repository::WebhookEventRepository;
use nlprs::domain::repositories::webhook_repository::WebhookRepository;
use nlprs::domain::services::nlp_service::NlpService;
use nlprs::infrastructure::cache::redis_client::RedisClient;
use nlprs::infrastructure::cache::response_cache::ResponseCache;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// 构造禁用状态的响应缓存
///
/// Redis客户端惰性连接，禁用的缓存不会发起任何网络调用
pub async fn disabled_cache() -> ResponseCache {
    let redis = RedisClient::new("redis://127.0.0.1:1")
        .await
        .expect("redis client should build lazily");
    ResponseCache::new(
        redis,
        &CacheSettings {
            enabled: false,
            ttl_seconds: 60,
            prefix: "test".to_string(),
        },
    )
}

#[derive(Default)]
pub struct InMemoryTaskRepo {
    pub tasks: Mutex<HashMap<Uuid, Task>>,
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepo {
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError> {
        self.tasks.lock().unwrap().insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn create_many(&self, tasks: &[Task]) -> Result<(), RepositoryError> {
        let mut store = self.tasks.lock().unwrap();
        for task in tasks {
            store.insert(task.id, task.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, RepositoryError> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn update_if_processing(&self, task: &Task) -> Result<Option<Task>, RepositoryError> {
        let mut store = self.tasks.lock().unwrap();
        let stored = store.get(&task.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != TaskStatus::Processing {
            return Ok(None);
        }
        store.insert(task.id, task.clone());
        Ok(Some(task.clone()))
    }

    async fn acquire_next(&self, worker_id: Uuid) -> Result<Option<Task>, RepositoryError> {
        let mut store = self.tasks.lock().unwrap();
        let next_id = store
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .min_by_key(|t| t.created_at)
            .map(|t| t.id);

        let Some(id) = next_id else {
            return Ok(None);
        };

        let task = store.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        task.status = TaskStatus::Processing;
        task.started_at = Some(Utc::now().into());
        task.attempt_count += 1;
        task.lock_token = Some(worker_id);
        task.lock_expires_at = Some((Utc::now() + chrono::Duration::minutes(5)).into());
        Ok(Some(task.clone()))
    }

    async fn find_by_batch_job_id(&self, batch_job_id: Uuid) -> Result<Vec<Task>, RepositoryError> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.batch_job_id == Some(batch_job_id))
            .cloned()
            .collect())
    }

    async fn cancel_tasks_by_batch_job_id(
        &self,
        batch_job_id: Uuid,
    ) -> Result<u64, RepositoryError> {
        let mut store = self.tasks.lock().unwrap();
        let mut cancelled = 0;
        for task in store.values_mut() {
            if task.batch_job_id == Some(batch_job_id) && !task.status.is_terminal() {
                task.status = TaskStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn reset_stuck_tasks(&self, timeout: chrono::Duration) -> Result<u64, RepositoryError> {
        let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
        let threshold: chrono::DateTime<chrono::FixedOffset> = (Utc::now() - timeout).into();
        let mut store = self.tasks.lock().unwrap();
        let mut reset = 0;
        for task in store.values_mut() {
            let expired = task
                .lock_expires_at
                .map(|t| t <= now)
                .unwrap_or_else(|| task.started_at.map(|t| t <= threshold).unwrap_or(false));
            if task.status == TaskStatus::Processing && expired {
                task.status = TaskStatus::Pending;
                task.lock_token = None;
                task.lock_expires_at = None;
                reset += 1;
            }
        }
        Ok(reset)
    }
}

#[derive(Default)]
pub struct InMemoryBatchRepo {
    pub jobs: Mutex<HashMap<Uuid, BatchJob>>,
}

#[async_trait]
impl BatchJobRepository for InMemoryBatchRepo {
    async fn create(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BatchJob>, RepositoryError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError> {
        let mut store = self.jobs.lock().unwrap();
        if !store.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        store.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn increment_completed(&self, id: Uuid) -> Result<BatchJob, RepositoryError> {
        let mut store = self.jobs.lock().unwrap();
        let job = store.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        job.completed_tasks += 1;
        Ok(job.clone())
    }

    async fn increment_failed(&self, id: Uuid) -> Result<BatchJob, RepositoryError> {
        let mut store = self.jobs.lock().unwrap();
        let job = store.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        job.failed_tasks += 1;
        Ok(job.clone())
    }
}

#[derive(Default)]
pub struct InMemoryWebhookRepo {
    pub webhooks: Mutex<HashMap<Uuid, Webhook>>,
}

#[async_trait]
impl WebhookRepository for InMemoryWebhookRepo {
    async fn create(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        self.webhooks
            .lock()
            .unwrap()
            .insert(webhook.id, webhook.clone());
        Ok(webhook.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, RepositoryError> {
        Ok(self.webhooks.lock().unwrap().get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Webhook>, RepositoryError> {
        Ok(self.webhooks.lock().unwrap().values().cloned().collect())
    }

    async fn find_active_by_event(
        &self,
        event_type: &WebhookEventType,
    ) -> Result<Vec<Webhook>, RepositoryError> {
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.subscribes_to(event_type))
            .cloned()
            .collect())
    }

    async fn update(&self, webhook: &Webhook) -> Result<Webhook, RepositoryError> {
        let mut store = self.webhooks.lock().unwrap();
        if !store.contains_key(&webhook.id) {
            return Err(RepositoryError::NotFound);
        }
        store.insert(webhook.id, webhook.clone());
        Ok(webhook.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.webhooks
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryEventRepo {
    pub events: Mutex<HashMap<Uuid, WebhookEvent>>,
}

#[async_trait]
impl WebhookEventRepository for InMemoryEventRepo {
    async fn create(&self, event: &WebhookEvent) -> Result<WebhookEvent, RepositoryError> {
        self.events.lock().unwrap().insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookEvent>, RepositoryError> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn find_pending(&self, limit: u64) -> Result<Vec<WebhookEvent>, RepositoryError> {
        let now = Utc::now();
        let mut pending: Vec<WebhookEvent> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| match e.status {
                WebhookStatus::Pending => true,
                WebhookStatus::Failed => e.next_retry_at.map(|t| t <= now).unwrap_or(false),
                _ => false,
            })
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn update(&self, event: &WebhookEvent) -> Result<WebhookEvent, RepositoryError> {
        let mut store = self.events.lock().unwrap();
        if !store.contains_key(&event.id) {
            return Err(RepositoryError::NotFound);
        }
        store.insert(event.id, event.clone());
        Ok(event.clone())
    }
}

/// NLP服务桩
///
/// 文本包含"boom"时返回错误，其余回显输入
pub struct StubNlpService;

#[async_trait]
impl NlpService for StubNlpService {
    async fn process(&self, task_type: TaskType, text: &str, _parameters: &Value) -> anyhow::Result<Value> {
        if text.contains("boom") {
            anyhow::bail!("provider unavailable");
        }
        Ok(json!({
            "operation": task_type.to_string(),
            "echo": text,
        }))
    }
}
