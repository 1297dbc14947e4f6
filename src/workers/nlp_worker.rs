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

use anyhow::Result;
use metrics::{counter, histogram};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::batch_job::{BatchJob, BatchJobStatus};
use crate::domain::models::task::{Task, TaskStatus};
use crate::domain::models::webhook::WebhookEventType;
use crate::domain::repositories::batch_job_repository::BatchJobRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::nlp_service::NlpService;
use crate::domain::services::notification_service::NotificationService;
use crate::infrastructure::cache::response_cache::ResponseCache;
use crate::queue::task_queue::TaskQueue;

/// NLP工作器
///
/// 从任务队列出队NLP任务，调用提供商处理，并将结果写回
/// 数据库与响应缓存。任务失败时按重试预算重新入队，
/// 耗尽后进入失败终态。终态变更会触发Webhook事件，
/// 批处理任务同时推进所属作业的进度计数。
pub struct NlpWorker<T, B, W, E>
where
    T: TaskRepository + Send + Sync,
    B: BatchJobRepository + Send + Sync,
    W: WebhookRepository + Send + Sync,
    E: WebhookEventRepository + Send + Sync,
{
    task_repo: Arc<T>,
    batch_repo: Arc<B>,
    notifications: Arc<NotificationService<W, E>>,
    nlp: Arc<dyn NlpService>,
    cache: ResponseCache,
    worker_id: Uuid,
}

impl<T, B, W, E> NlpWorker<T, B, W, E>
where
    T: TaskRepository + Send + Sync,
    B: BatchJobRepository + Send + Sync,
    W: WebhookRepository + Send + Sync,
    E: WebhookEventRepository + Send + Sync,
{
    /// 创建新的NLP工作器实例
    pub fn new(
        task_repo: Arc<T>,
        batch_repo: Arc<B>,
        notifications: Arc<NotificationService<W, E>>,
        nlp: Arc<dyn NlpService>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            task_repo,
            batch_repo,
            notifications,
            nlp,
            cache,
            worker_id: Uuid::new_v4(),
        }
    }

    /// 运行NLP工作器
    pub async fn run<Q>(&self, queue: Arc<Q>)
    where
        Q: TaskQueue + Send + Sync,
    {
        info!("NLP worker {} started", self.worker_id);

        loop {
            match self.process_next_task(queue.as_ref()).await {
                Ok(processed) => {
                    if !processed {
                        sleep(Duration::from_secs(1)).await;
                    }
                }
                Err(e) => {
                    error!("Error processing task: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// 处理下一个任务
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 成功处理了一个任务
    /// * `Ok(false)` - 队列为空
    pub async fn process_next_task<Q>(&self, queue: &Q) -> Result<bool>
    where
        Q: TaskQueue,
    {
        let task_opt = queue.dequeue(self.worker_id).await?;

        if let Some(task) = task_opt {
            self.process_task(task).await?;
            return Ok(true);
        }

        Ok(false)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, task_type = %task.task_type))]
    async fn process_task(&self, task: Task) -> Result<()> {
        info!("Processing task");

        let task_type = task.task_type;
        let input_hash = task.input_hash.clone();

        // 提交后才入缓存的结果在这里仍可命中，批处理任务同样受益
        if let Some(cached) = self.cache.get(task_type, &input_hash).await {
            self.handle_success(task, cached, true).await?;
            return Ok(());
        }

        match self
            .nlp
            .process(task_type, &task.input_text, &task.parameters)
            .await
        {
            Ok(result) => {
                self.cache.put(task_type, &input_hash, &result).await;
                self.handle_success(task, result, false).await?;
            }
            Err(e) => {
                self.handle_error(task, e).await?;
            }
        }

        Ok(())
    }

    async fn handle_success(&self, task: Task, result: Value, from_cache: bool) -> Result<()> {
        let task = task.complete(result)?;
        // 处理期间被取消的任务放弃写入，取消优先
        let Some(task) = self.task_repo.update_if_processing(&task).await? else {
            self.discard_cancelled(&task);
            return Ok(());
        };

        counter!("nlp_tasks_processed_total", "task_type" => task.task_type.to_string(), "outcome" => "success")
            .increment(1);
        if let Some(elapsed) = task.processing_time {
            histogram!("nlp_task_duration_seconds", "task_type" => task.task_type.to_string())
                .record(elapsed);
        }
        info!(task_id = %task.id, from_cache, "Task completed");

        self.notifications
            .publish(
                WebhookEventType::TaskCompleted,
                json!({
                    "task_id": task.id,
                    "task_type": task.task_type,
                    "status": task.status,
                    "result": task.result,
                }),
            )
            .await?;

        self.advance_batch(&task, true).await
    }

    /// 丢弃处理期间被取消的任务的写入
    ///
    /// 条件写入落空说明任务已不在Processing状态，
    /// 不再发送通知，也不推进批处理计数
    fn discard_cancelled(&self, task: &Task) {
        counter!("nlp_tasks_processed_total", "task_type" => task.task_type.to_string(), "outcome" => "cancelled")
            .increment(1);
        info!(task_id = %task.id, "Task no longer processing, result discarded");
    }

    async fn handle_error(&self, task: Task, error: anyhow::Error) -> Result<()> {
        if task.attempt_count < task.max_retries {
            // 重试预算未耗尽，任务重新回到队列
            let mut retry = task;
            retry.status = TaskStatus::Pending;
            retry.lock_token = None;
            retry.lock_expires_at = None;
            retry.error = Some(error.to_string());
            let Some(retry) = self.task_repo.update_if_processing(&retry).await? else {
                self.discard_cancelled(&retry);
                return Ok(());
            };

            counter!("nlp_tasks_processed_total", "task_type" => retry.task_type.to_string(), "outcome" => "retried")
                .increment(1);
            warn!(
                task_id = %retry.id,
                attempt = retry.attempt_count,
                error = %error,
                "Task failed, requeued for retry"
            );
            return Ok(());
        }

        let task = task.fail(error.to_string())?;
        let Some(task) = self.task_repo.update_if_processing(&task).await? else {
            self.discard_cancelled(&task);
            return Ok(());
        };

        counter!("nlp_tasks_processed_total", "task_type" => task.task_type.to_string(), "outcome" => "failed")
            .increment(1);
        error!(task_id = %task.id, error = %error, "Task failed permanently");

        self.notifications
            .publish(
                WebhookEventType::TaskFailed,
                json!({
                    "task_id": task.id,
                    "task_type": task.task_type,
                    "status": task.status,
                    "error": task.error,
                }),
            )
            .await?;

        self.advance_batch(&task, false).await
    }

    /// 推进批处理作业的进度
    ///
    /// 任务到达终态时递增作业计数，所有任务结束后聚合结果、
    /// 关闭作业并发送批处理级通知。
    async fn advance_batch(&self, task: &Task, success: bool) -> Result<()> {
        let Some(batch_job_id) = task.batch_job_id else {
            return Ok(());
        };

        let mut job = if success {
            self.batch_repo.increment_completed(batch_job_id).await?
        } else {
            self.batch_repo.increment_failed(batch_job_id).await?
        };

        if job.status == BatchJobStatus::Pending {
            job.status = BatchJobStatus::Processing;
            job = self.batch_repo.update(&job).await?;
        }

        if !job.all_tasks_settled() || job.status.is_terminal() {
            return Ok(());
        }

        let results = self.collect_results(batch_job_id).await?;
        let job = job.settle(results.clone())?;
        let job = self.batch_repo.update(&job).await?;

        info!(
            batch_job_id = %job.id,
            completed = job.completed_tasks,
            failed = job.failed_tasks,
            "Batch job settled"
        );
        counter!("batch_jobs_settled_total", "status" => job.status.to_string()).increment(1);

        self.notify_batch(&job, results).await
    }

    async fn collect_results(&self, batch_job_id: Uuid) -> Result<Value> {
        let tasks = self.task_repo.find_by_batch_job_id(batch_job_id).await?;

        let mut map = Map::new();
        for task in tasks {
            let entry = match task.status {
                TaskStatus::Completed => json!({
                    "status": task.status,
                    "result": task.result,
                }),
                _ => json!({
                    "status": task.status,
                    "error": task.error,
                }),
            };
            map.insert(task.id.to_string(), entry);
        }

        Ok(Value::Object(map))
    }

    async fn notify_batch(&self, job: &BatchJob, results: Value) -> Result<()> {
        let event_type = if job.status == BatchJobStatus::Failed {
            WebhookEventType::BatchFailed
        } else {
            WebhookEventType::BatchCompleted
        };

        let payload = json!({
            "batch_job_id": job.id,
            "status": job.status.to_string(),
            "total_tasks": job.total_tasks,
            "completed_tasks": job.completed_tasks,
            "failed_tasks": job.failed_tasks,
            "results": results,
        });

        self.notifications
            .publish(event_type.clone(), payload.clone())
            .await?;

        // 作业附带的一次性回调URL不要求注册端点
        if let Some(url) = &job.webhook_url {
            self.notifications
                .publish_to_url(url.clone(), event_type, payload)
                .await?;
        }

        Ok(())
    }
}
