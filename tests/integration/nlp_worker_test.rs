// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    disabled_cache, InMemoryBatchRepo, InMemoryEventRepo, InMemoryTaskRepo, InMemoryWebhookRepo,
    StubNlpService,
};
use async_trait::async_trait;
use nlprs::domain::models::batch_job::{BatchJob, BatchJobStatus};
use nlprs::domain::models::task::{Task, TaskStatus, TaskType};
use nlprs::domain::models::webhook::{Webhook, WebhookEventType};
use nlprs::domain::repositories::batch_job_repository::BatchJobRepository;
use nlprs::domain::repositories::task_repository::TaskRepository;
use nlprs::domain::repositories::webhook_repository::WebhookRepository;
use nlprs::domain::services::nlp_service::NlpService;
use nlprs::domain::services::notification_service::NotificationService;
use nlprs::queue::task_queue::{PostgresTaskQueue, TaskQueue};
use nlprs::workers::nlp_worker::NlpWorker;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

struct TestHarness {
    task_repo: Arc<InMemoryTaskRepo>,
    batch_repo: Arc<InMemoryBatchRepo>,
    webhook_repo: Arc<InMemoryWebhookRepo>,
    event_repo: Arc<InMemoryEventRepo>,
    queue: Arc<PostgresTaskQueue<InMemoryTaskRepo>>,
    worker: NlpWorker<InMemoryTaskRepo, InMemoryBatchRepo, InMemoryWebhookRepo, InMemoryEventRepo>,
}

async fn harness() -> TestHarness {
    let task_repo = Arc::new(InMemoryTaskRepo::default());
    let batch_repo = Arc::new(InMemoryBatchRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let notifications = Arc::new(NotificationService::new(
        webhook_repo.clone(),
        event_repo.clone(),
        3,
    ));
    let nlp: Arc<dyn NlpService> = Arc::new(StubNlpService);
    let worker = NlpWorker::new(
        task_repo.clone(),
        batch_repo.clone(),
        notifications,
        nlp,
        disabled_cache().await,
    );
    let queue = Arc::new(PostgresTaskQueue::new(task_repo.clone()));

    TestHarness {
        task_repo,
        batch_repo,
        webhook_repo,
        event_repo,
        queue,
        worker,
    }
}

#[tokio::test]
async fn test_empty_queue_is_not_an_error() {
    let h = harness().await;
    let processed = h.worker.process_next_task(h.queue.as_ref()).await.unwrap();
    assert!(!processed);
}

#[tokio::test]
async fn test_successful_task_is_completed_and_notified() {
    let h = harness().await;

    let webhook = Webhook::new(
        "https://example.com/hook".to_string(),
        vec![WebhookEventType::TaskCompleted],
        None,
        "secret".to_string(),
    );
    h.webhook_repo.create(&webhook).await.unwrap();

    let task = Task::new(
        TaskType::Classification,
        "hello world".to_string(),
        json!({"categories": ["news"]}),
    );
    let task_id = task.id;
    h.queue.enqueue(task).await.unwrap();

    let processed = h.worker.process_next_task(h.queue.as_ref()).await.unwrap();
    assert!(processed);

    let stored = h.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.result.as_ref().unwrap()["echo"], "hello world");
    assert!(stored.processing_time.is_some());

    let events = h.event_repo.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = events.values().next().unwrap();
    assert_eq!(event.event_type, WebhookEventType::TaskCompleted);
    assert_eq!(event.payload["task_id"], task_id.to_string());
}

#[tokio::test]
async fn test_failed_task_is_requeued_until_retries_exhausted() {
    let h = harness().await;

    let mut task = Task::new(TaskType::Summarization, "boom".to_string(), json!({}));
    task.max_retries = 2;
    let task_id = task.id;
    h.queue.enqueue(task).await.unwrap();

    // 第一次尝试失败后任务回到队列
    h.worker.process_next_task(h.queue.as_ref()).await.unwrap();
    let stored = h.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
    assert_eq!(stored.attempt_count, 1);
    assert!(stored.lock_token.is_none());

    // 第二次尝试耗尽重试预算
    h.worker.process_next_task(h.queue.as_ref()).await.unwrap();
    let stored = h.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Failed);
    assert_eq!(stored.attempt_count, 2);
    assert!(stored
        .error
        .as_deref()
        .unwrap()
        .contains("provider unavailable"));
}

#[tokio::test]
async fn test_batch_job_settles_after_all_tasks_finish() {
    let h = harness().await;

    let job = BatchJob::new(2, Some("https://example.com/batch-hook".to_string()));
    let job_id = job.id;
    h.batch_repo.create(&job).await.unwrap();

    let ok_task = Task::new_in_batch(
        TaskType::SentimentAnalysis,
        "great product".to_string(),
        json!({}),
        job_id,
    );
    let mut bad_task = Task::new_in_batch(
        TaskType::SentimentAnalysis,
        "boom".to_string(),
        json!({}),
        job_id,
    );
    bad_task.max_retries = 1;
    let ok_id = ok_task.id;
    let bad_id = bad_task.id;
    h.queue.enqueue(ok_task).await.unwrap();
    h.queue.enqueue(bad_task).await.unwrap();

    h.worker.process_next_task(h.queue.as_ref()).await.unwrap();
    h.worker.process_next_task(h.queue.as_ref()).await.unwrap();

    let job = h.batch_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, BatchJobStatus::Completed);
    assert_eq!(job.completed_tasks, 1);
    assert_eq!(job.failed_tasks, 1);

    let results = job.results.unwrap();
    assert_eq!(results[ok_id.to_string()]["status"], "completed");
    assert_eq!(results[bad_id.to_string()]["status"], "failed");

    // 批处理完成事件发往作业附带的回调URL
    let events = h.event_repo.events.lock().unwrap();
    let batch_event = events
        .values()
        .find(|e| e.event_type == WebhookEventType::BatchCompleted)
        .expect("batch completion event should be queued");
    assert_eq!(batch_event.webhook_url, "https://example.com/batch-hook");
    assert!(batch_event.webhook_id.is_none());
    assert_eq!(batch_event.payload["completed_tasks"], 1);

    // 作业只结算一次，完成事件不重复
    let batch_events = events
        .values()
        .filter(|e| e.event_type == WebhookEventType::BatchCompleted)
        .count();
    assert_eq!(batch_events, 1);
}

/// 在process调用期间取消所属批处理作业的NLP服务桩，
/// 模拟取消请求与工作器处理的并发竞争
struct CancelDuringProcessing {
    task_repo: Arc<InMemoryTaskRepo>,
    batch_job_id: Uuid,
}

#[async_trait]
impl NlpService for CancelDuringProcessing {
    async fn process(
        &self,
        _task_type: TaskType,
        _text: &str,
        _parameters: &Value,
    ) -> anyhow::Result<Value> {
        self.task_repo
            .cancel_tasks_by_batch_job_id(self.batch_job_id)
            .await?;
        Ok(json!({"ok": true}))
    }
}

#[tokio::test]
async fn test_task_cancelled_during_processing_stays_cancelled() {
    let task_repo = Arc::new(InMemoryTaskRepo::default());
    let batch_repo = Arc::new(InMemoryBatchRepo::default());
    let webhook_repo = Arc::new(InMemoryWebhookRepo::default());
    let event_repo = Arc::new(InMemoryEventRepo::default());
    let notifications = Arc::new(NotificationService::new(
        webhook_repo.clone(),
        event_repo.clone(),
        3,
    ));

    let job = BatchJob::new(1, None);
    let job_id = job.id;
    batch_repo.create(&job).await.unwrap();

    let task = Task::new_in_batch(
        TaskType::Classification,
        "racy input".to_string(),
        json!({}),
        job_id,
    );
    let task_id = task.id;

    let nlp: Arc<dyn NlpService> = Arc::new(CancelDuringProcessing {
        task_repo: task_repo.clone(),
        batch_job_id: job_id,
    });
    let worker = NlpWorker::new(
        task_repo.clone(),
        batch_repo.clone(),
        notifications,
        nlp,
        disabled_cache().await,
    );
    let queue = Arc::new(PostgresTaskQueue::new(task_repo.clone()));
    queue.enqueue(task).await.unwrap();

    worker.process_next_task(queue.as_ref()).await.unwrap();

    // 取消优先：结果被丢弃，任务保持取消状态
    let stored = task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Cancelled);
    assert!(stored.result.is_none());

    // 不发送完成通知，也不推进作业计数
    assert!(event_repo.events.lock().unwrap().is_empty());
    let job = batch_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.completed_tasks, 0);
    assert_eq!(job.failed_tasks, 0);
}

#[tokio::test]
async fn test_all_failed_batch_is_marked_failed() {
    let h = harness().await;

    let job = BatchJob::new(1, None);
    let job_id = job.id;
    h.batch_repo.create(&job).await.unwrap();

    let mut task = Task::new_in_batch(TaskType::Classification, "boom".to_string(), json!({}), job_id);
    task.max_retries = 1;
    h.queue.enqueue(task).await.unwrap();

    h.worker.process_next_task(h.queue.as_ref()).await.unwrap();

    let job = h.batch_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, BatchJobStatus::Failed);
    assert_eq!(job.failed_tasks, 1);
}
