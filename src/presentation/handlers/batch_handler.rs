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

use crate::application::dto::batch_request::BatchSubmitRequestDto;
use crate::application::dto::task_response::{BatchJobStatusDto, BatchResultsDto};
use crate::application::use_cases::submit_batch::SubmitBatchUseCase;
use crate::domain::models::task::DomainError;
use crate::domain::repositories::batch_job_repository::BatchJobRepository;
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::presentation::errors::AppError;
use axum::{extract::Path, http::StatusCode, Extension, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 提交批处理作业
pub async fn submit_batch<T, B>(
    Extension(use_case): Extension<Arc<SubmitBatchUseCase<T, B>>>,
    Json(payload): Json<BatchSubmitRequestDto>,
) -> Result<(StatusCode, Json<BatchJobStatusDto>), AppError>
where
    T: TaskRepository,
    B: BatchJobRepository,
{
    payload.validate()?;
    let job = use_case.execute(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(job.into())))
}

/// 查询批处理作业状态
pub async fn get_batch_status<B: BatchJobRepository>(
    Extension(repo): Extension<Arc<B>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchJobStatusDto>, AppError> {
    let job = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(job.into()))
}

/// 查询批处理作业的聚合结果
///
/// 仅当作业到达终态后结果可用
pub async fn get_batch_results<B: BatchJobRepository>(
    Extension(repo): Extension<Arc<B>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchResultsDto>, AppError> {
    let job = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    if !job.status.is_terminal() {
        return Err(DomainError::InvalidStateTransition.into());
    }

    Ok(Json(BatchResultsDto {
        id: job.id,
        status: job.status.to_string(),
        results: job.results.unwrap_or_else(|| json!({})),
    }))
}

/// 取消批处理作业
///
/// 作业中尚未结束的任务一并取消
pub async fn cancel_batch<T, B>(
    Extension(task_repo): Extension<Arc<T>>,
    Extension(batch_repo): Extension<Arc<B>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchJobStatusDto>, AppError>
where
    T: TaskRepository,
    B: BatchJobRepository,
{
    let job = batch_repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let cancelled = task_repo.cancel_tasks_by_batch_job_id(id).await?;
    let job = job.cancel()?;
    let job = batch_repo.update(&job).await?;

    info!(batch_job_id = %id, cancelled_tasks = cancelled, "Batch job cancelled");
    Ok(Json(job.into()))
}
