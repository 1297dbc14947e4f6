// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::batch_request::BatchSubmitRequestDto;
use crate::domain::models::batch_job::BatchJob;
use crate::domain::models::task::Task;
use crate::domain::repositories::batch_job_repository::BatchJobRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use anyhow::Result;
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 批处理作业提交用例
///
/// 创建作业记录并将其中的任务批量入队。任务的处理
/// 与单个提交走同一条工作器流水线。
pub struct SubmitBatchUseCase<T, B>
where
    T: TaskRepository,
    B: BatchJobRepository,
{
    task_repo: Arc<T>,
    batch_repo: Arc<B>,
}

impl<T, B> SubmitBatchUseCase<T, B>
where
    T: TaskRepository,
    B: BatchJobRepository,
{
    pub fn new(task_repo: Arc<T>, batch_repo: Arc<B>) -> Self {
        Self {
            task_repo,
            batch_repo,
        }
    }

    pub async fn execute(&self, request: BatchSubmitRequestDto) -> Result<BatchJob> {
        let job = BatchJob::new(request.tasks.len() as i32, request.webhook_url);
        let job = self.batch_repo.create(&job).await?;

        let tasks: Vec<Task> = request
            .tasks
            .into_iter()
            .map(|t| {
                let parameters = if t.parameters.is_null() {
                    json!({})
                } else {
                    t.parameters
                };
                Task::new_in_batch(t.task_type, t.text, parameters, job.id)
            })
            .collect();

        self.task_repo.create_many(&tasks).await?;

        counter!("batch_jobs_submitted_total").increment(1);
        info!(
            batch_job_id = %job.id,
            total_tasks = job.total_tasks,
            "Batch job submitted"
        );

        Ok(job)
    }
}
