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

use crate::domain::models::batch_job::BatchJob;
use crate::domain::models::task::{Task, TaskStatus, TaskType};
use crate::domain::models::webhook::Webhook;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 任务响应数据传输对象
#[derive(Debug, Serialize)]
pub struct TaskResponseDto {
    pub id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub processing_time: Option<f64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl From<Task> for TaskResponseDto {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            task_type: task.task_type,
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
            completed_at: task.completed_at,
            processing_time: task.processing_time,
            result: task.result,
            error: task.error,
        }
    }
}

/// 批处理作业状态响应数据传输对象
#[derive(Debug, Serialize)]
pub struct BatchJobStatusDto {
    pub id: Uuid,
    pub status: String,
    pub total_tasks: i32,
    pub completed_tasks: i32,
    pub failed_tasks: i32,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub processing_time: Option<f64>,
    pub error: Option<String>,
}

impl From<BatchJob> for BatchJobStatusDto {
    fn from(job: BatchJob) -> Self {
        Self {
            id: job.id,
            status: job.status.to_string(),
            total_tasks: job.total_tasks,
            completed_tasks: job.completed_tasks,
            failed_tasks: job.failed_tasks,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
            processing_time: job.processing_time,
            error: job.error,
        }
    }
}

/// 批处理作业结果响应数据传输对象
#[derive(Debug, Serialize)]
pub struct BatchResultsDto {
    pub id: Uuid,
    pub status: String,
    pub results: serde_json::Value,
}

/// Webhook响应数据传输对象
///
/// 列表和查询接口使用，不包含签名密钥
#[derive(Debug, Serialize)]
pub struct WebhookResponseDto {
    pub id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub failure_count: i32,
    pub last_triggered: Option<DateTime<Utc>>,
    pub last_status: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Webhook> for WebhookResponseDto {
    fn from(webhook: Webhook) -> Self {
        Self {
            id: webhook.id,
            url: webhook.url,
            events: webhook.events.iter().map(|e| e.to_string()).collect(),
            description: webhook.description,
            is_active: webhook.is_active,
            failure_count: webhook.failure_count,
            last_triggered: webhook.last_triggered,
            last_status: webhook.last_status,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// Webhook创建响应数据传输对象
///
/// 签名密钥仅在创建时返回一次
#[derive(Debug, Serialize)]
pub struct WebhookCreatedDto {
    #[serde(flatten)]
    pub webhook: WebhookResponseDto,
    pub secret: String,
}

impl From<Webhook> for WebhookCreatedDto {
    fn from(webhook: Webhook) -> Self {
        let secret = webhook.secret.clone();
        Self {
            webhook: webhook.into(),
            secret,
        }
    }
}
