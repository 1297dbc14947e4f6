// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::domain::repositories::task_repository::TaskRepository;
use crate::utils::errors::WorkerError;
use crate::workers::Worker;

/// 卡死任务回收Worker
///
/// 工作器崩溃或处理超时会留下锁已过期的Processing任务，
/// 该Worker定期将其重置回Pending状态，使任务能被重新获取
pub struct ReaperWorker {
    task_repository: Arc<dyn TaskRepository>,
    scan_interval: Duration,
    stuck_timeout: chrono::Duration,
}

impl ReaperWorker {
    pub fn new(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            task_repository,
            scan_interval: Duration::from_secs(60),
            stuck_timeout: chrono::Duration::minutes(5),
        }
    }

    /// 回收卡死的任务
    async fn reap_stuck_tasks(&self) -> Result<(), WorkerError> {
        let reset = self
            .task_repository
            .reset_stuck_tasks(self.stuck_timeout)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;

        if reset > 0 {
            warn!("Reset {} stuck tasks back to pending", reset);
            counter!("nlp_tasks_reaped_total").increment(reset);
        }

        Ok(())
    }
}

#[async_trait]
impl Worker for ReaperWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Reaper worker started");

        let mut interval = interval(self.scan_interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.reap_stuck_tasks().await {
                error!("Error reaping stuck tasks: {}", e);
            }
        }
    }

    fn name(&self) -> &str {
        "reaper-worker"
    }
}
