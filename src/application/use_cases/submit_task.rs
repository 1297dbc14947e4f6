// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::nlp_request::NlpSubmission;
use crate::domain::models::task::Task;
use crate::domain::models::webhook::WebhookEventType;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::notification_service::NotificationService;
use crate::infrastructure::cache::response_cache::ResponseCache;
use anyhow::Result;
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// NLP任务提交用例
///
/// 提交流程优先查询响应缓存：相同类型、相同文本的结果
/// 已缓存时，任务直接以完成状态落库，不进入工作队列。
/// 未命中时任务以待处理状态入队，由后台工作器处理。
pub struct SubmitTaskUseCase<T, W, E>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    task_repo: Arc<T>,
    cache: ResponseCache,
    notifications: Arc<NotificationService<W, E>>,
}

impl<T, W, E> SubmitTaskUseCase<T, W, E>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    pub fn new(
        task_repo: Arc<T>,
        cache: ResponseCache,
        notifications: Arc<NotificationService<W, E>>,
    ) -> Self {
        Self {
            task_repo,
            cache,
            notifications,
        }
    }

    pub async fn execute(&self, submission: NlpSubmission) -> Result<Task> {
        let task = Task::new(
            submission.task_type,
            submission.text,
            submission.parameters,
        );

        if let Some(cached) = self.cache.get(task.task_type, &task.input_hash).await {
            let task = task.start()?.complete(cached)?;
            let task = self.task_repo.create(&task).await?;

            counter!("tasks_submitted_total", "task_type" => task.task_type.to_string(), "source" => "cache")
                .increment(1);
            info!(task_id = %task.id, task_type = %task.task_type, "Task completed from cache");

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

            return Ok(task);
        }

        let task = self.task_repo.create(&task).await?;
        counter!("tasks_submitted_total", "task_type" => task.task_type.to_string(), "source" => "queue")
            .increment(1);
        info!(task_id = %task.id, task_type = %task.task_type, "Task queued for processing");

        Ok(task)
    }
}
