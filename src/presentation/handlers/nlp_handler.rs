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

use crate::application::dto::nlp_request::{
    ClassificationRequestDto, EntityExtractionRequestDto, SentimentAnalysisRequestDto,
    SummarizationRequestDto,
};
use crate::application::dto::task_response::TaskResponseDto;
use crate::application::use_cases::submit_task::SubmitTaskUseCase;
use crate::domain::models::task::{Task, TaskStatus};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::presentation::errors::AppError;
use axum::{extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 缓存命中的任务直接以完成状态返回200，其余返回202
fn submission_status(task: &Task) -> StatusCode {
    if task.status == TaskStatus::Completed {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    }
}

/// 提交文本分类任务
pub async fn classify<T, W, E>(
    Extension(use_case): Extension<Arc<SubmitTaskUseCase<T, W, E>>>,
    Json(payload): Json<ClassificationRequestDto>,
) -> Result<(StatusCode, Json<TaskResponseDto>), AppError>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    payload.validate()?;
    let task = use_case.execute(payload.into()).await?;
    let status = submission_status(&task);
    Ok((status, Json(task.into())))
}

/// 提交实体抽取任务
pub async fn extract_entities<T, W, E>(
    Extension(use_case): Extension<Arc<SubmitTaskUseCase<T, W, E>>>,
    Json(payload): Json<EntityExtractionRequestDto>,
) -> Result<(StatusCode, Json<TaskResponseDto>), AppError>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    payload.validate()?;
    let task = use_case.execute(payload.into()).await?;
    let status = submission_status(&task);
    Ok((status, Json(task.into())))
}

/// 提交摘要生成任务
pub async fn summarize<T, W, E>(
    Extension(use_case): Extension<Arc<SubmitTaskUseCase<T, W, E>>>,
    Json(payload): Json<SummarizationRequestDto>,
) -> Result<(StatusCode, Json<TaskResponseDto>), AppError>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    payload.validate()?;
    let task = use_case.execute(payload.into()).await?;
    let status = submission_status(&task);
    Ok((status, Json(task.into())))
}

/// 提交情感分析任务
pub async fn analyze_sentiment<T, W, E>(
    Extension(use_case): Extension<Arc<SubmitTaskUseCase<T, W, E>>>,
    Json(payload): Json<SentimentAnalysisRequestDto>,
) -> Result<(StatusCode, Json<TaskResponseDto>), AppError>
where
    T: TaskRepository,
    W: WebhookRepository,
    E: WebhookEventRepository,
{
    payload.validate()?;
    let task = use_case.execute(payload.into()).await?;
    let status = submission_status(&task);
    Ok((status, Json(task.into())))
}

/// 查询任务状态和结果
pub async fn get_task<T: TaskRepository>(
    Extension(repo): Extension<Arc<T>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponseDto>, AppError> {
    let task = repo
        .find_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(task.into()))
}
