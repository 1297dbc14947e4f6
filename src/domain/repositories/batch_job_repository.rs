// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::batch_job::BatchJob;
use async_trait::async_trait;
use uuid::Uuid;

/// 批处理作业仓库特质
///
/// 定义批处理作业数据访问接口
#[async_trait]
pub trait BatchJobRepository: Send + Sync {
    /// 创建批处理作业
    async fn create(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError>;
    /// 根据ID查找批处理作业
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BatchJob>, RepositoryError>;
    /// 更新批处理作业
    async fn update(&self, job: &BatchJob) -> Result<BatchJob, RepositoryError>;
    /// 原子递增完成计数
    ///
    /// 任务成功时调用，返回递增后的作业快照
    async fn increment_completed(&self, id: Uuid) -> Result<BatchJob, RepositoryError>;
    /// 原子递增失败计数
    ///
    /// 任务失败时调用，返回递增后的作业快照
    async fn increment_failed(&self, id: Uuid) -> Result<BatchJob, RepositoryError>;
}
