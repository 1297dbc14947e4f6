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
use crate::domain::repositories::batch_job_repository::BatchJobRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::batch_job as batch_job_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, NotSet,
    Set, Statement,
};
use std::sync::Arc;
use uuid::Uuid;

/// 批处理作业仓库实现
///
/// 基于SeaORM实现的批处理作业数据访问层。
/// 进度计数通过数据库侧的原子递增维护，避免并发工作器
/// 之间的丢失更新。
#[derive(Clone)]
pub struct BatchJobRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl BatchJobRepositoryImpl {
    /// 创建新的批处理作业仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 原子递增进度计数
    ///
    /// 单条UPDATE .. RETURNING语句，返回的快照是本次递增后的
    /// 行状态。多个工作器并发结束各自的任务时，只有执行最后
    /// 一次递增的工作器能观察到计数满额，由它负责结算作业。
    async fn increment_counter(&self, id: Uuid, column: &str) -> Result<BatchJob, RepositoryError> {
        let stmt = Statement::from_sql_and_values(
            self.db.get_database_backend(),
            format!(
                "UPDATE batch_jobs SET {column} = {column} + 1, updated_at = CURRENT_TIMESTAMP \
                 WHERE id = $1 RETURNING *"
            ),
            [id.into()],
        );

        let model = batch_job_entity::Model::find_by_statement(stmt)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(model.into())
    }
}

impl From<batch_job_entity::Model> for BatchJob {
    fn from(model: batch_job_entity::Model) -> Self {
        Self {
            id: model.id,
            status: model.status.parse().unwrap_or_default(),
            total_tasks: model.total_tasks,
            completed_tasks: model.completed_tasks,
            failed_tasks: model.failed_tasks,
            webhook_url: model.webhook_url,
            results: model.results,
            error: model.error,
            processing_time: model.processing_time,
            created_at: model.created_at,
            completed_at: model.completed_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<BatchJob> for batch_job_entity::ActiveModel {
    fn from(job: BatchJob) -> Self {
        Self {
            id: Set(job.id),
            status: Set(job.status.to_string()),
            total_tasks: Set(job.total_tasks),
            completed_tasks: Set(job.completed_tasks),
            failed_tasks: Set(job.failed_tasks),
            webhook_url: Set(job.webhook_url.clone()),
            results: Set(job.results.clone()),
            error: Set(job.error.clone()),
            processing_time: Set(job.processing_time),
            created_at: Set(job.created_at),
            completed_at: Set(job.completed_at),
            updated_at: Set(job.updated_at),
        }
    }
}

#[async_trait]
impl BatchJobRepository for BatchJobRepositoryImpl {
    async fn create(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError> {
        let model: batch_job_entity::ActiveModel = job.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BatchJob>, RepositoryError> {
        let model = batch_job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError> {
        let mut model: batch_job_entity::ActiveModel = job.clone().into();

        model.status = Set(job.status.to_string());
        model.results = Set(job.results.clone());
        model.error = Set(job.error.clone());
        model.processing_time = Set(job.processing_time);
        model.completed_at = Set(job.completed_at);
        model.updated_at = Set(Utc::now().into());

        // 进度计数只通过原子递增变化，普通更新不回写快照值
        model.completed_tasks = NotSet;
        model.failed_tasks = NotSet;
        model.total_tasks = NotSet;

        let updated_model = model.update(self.db.as_ref()).await?;
        Ok(updated_model.into())
    }

    async fn increment_completed(&self, id: Uuid) -> Result<BatchJob, RepositoryError> {
        self.increment_counter(id, "completed_tasks").await
    }

    async fn increment_failed(&self, id: Uuid) -> Result<BatchJob, RepositoryError> {
        self.increment_counter(id, "failed_tasks").await
    }
}
