// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::Task;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 任务仓库特质
///
/// 定义任务数据访问接口
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, task: &Task) -> Result<Task, RepositoryError>;
    /// 批量创建任务
    async fn create_many(&self, tasks: &[Task]) -> Result<(), RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, RepositoryError>;
    /// 条件更新任务
    ///
    /// 仅当任务在数据库中仍处于Processing状态时写入，
    /// 返回`None`表示任务已被取消或回收，写入被放弃
    async fn update_if_processing(&self, task: &Task) -> Result<Option<Task>, RepositoryError>;
    /// 获取下一个待处理任务
    ///
    /// 使用行级锁跳过已被其他工作器持有的任务，
    /// 获取成功后任务进入Processing状态并持有锁定令牌
    async fn acquire_next(&self, worker_id: Uuid) -> Result<Option<Task>, RepositoryError>;
    /// 根据批处理作业ID查找所有任务
    async fn find_by_batch_job_id(&self, batch_job_id: Uuid) -> Result<Vec<Task>, RepositoryError>;
    /// 取消批处理作业中所有未结束的任务
    async fn cancel_tasks_by_batch_job_id(
        &self,
        batch_job_id: Uuid,
    ) -> Result<u64, RepositoryError>;
    /// 重置卡住的任务（锁定已过期但仍处于Processing状态）
    async fn reset_stuck_tasks(&self, timeout: chrono::Duration) -> Result<u64, RepositoryError>;
}
