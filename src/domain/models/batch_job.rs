// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::task::DomainError;

/// 批处理作业实体
///
/// 表示一组作为整体提交的NLP任务。作业跟踪其中任务的
/// 完成进度，当所有任务到达终态时聚合结果，并可选地
/// 向指定的回调URL发送完成通知。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 作业状态
    pub status: BatchJobStatus,
    /// 作业中的任务总数
    pub total_tasks: i32,
    /// 已成功完成的任务数
    pub completed_tasks: i32,
    /// 已失败的任务数
    pub failed_tasks: i32,
    /// 作业完成时通知的回调URL（可选）
    pub webhook_url: Option<String>,
    /// 聚合结果，任务ID到结果或错误的映射
    pub results: Option<serde_json::Value>,
    /// 作业级错误信息
    pub error: Option<String>,
    /// 处理耗时（秒）
    pub processing_time: Option<f64>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 完成时间
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 批处理作业状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    /// 待处理，作业已创建但任务尚未全部入队
    #[default]
    Pending,
    /// 处理中，至少一个任务已开始执行
    Processing,
    /// 已完成，所有任务到达终态且至少一个成功
    Completed,
    /// 已失败，所有任务均失败
    Failed,
    /// 已取消
    Cancelled,
}

impl BatchJobStatus {
    /// 判断状态是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchJobStatus::Completed | BatchJobStatus::Failed | BatchJobStatus::Cancelled
        )
    }
}

impl fmt::Display for BatchJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BatchJobStatus::Pending => write!(f, "pending"),
            BatchJobStatus::Processing => write!(f, "processing"),
            BatchJobStatus::Completed => write!(f, "completed"),
            BatchJobStatus::Failed => write!(f, "failed"),
            BatchJobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BatchJobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchJobStatus::Pending),
            "processing" => Ok(BatchJobStatus::Processing),
            "completed" => Ok(BatchJobStatus::Completed),
            "failed" => Ok(BatchJobStatus::Failed),
            "cancelled" => Ok(BatchJobStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl BatchJob {
    /// 创建一个新的批处理作业
    pub fn new(total_tasks: i32, webhook_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: BatchJobStatus::Pending,
            total_tasks,
            completed_tasks: 0,
            failed_tasks: 0,
            webhook_url,
            results: None,
            error: None,
            processing_time: None,
            created_at: Utc::now().into(),
            completed_at: None,
            updated_at: Utc::now().into(),
        }
    }

    /// 判断作业中的所有任务是否都已到达终态
    pub fn all_tasks_settled(&self) -> bool {
        self.completed_tasks + self.failed_tasks >= self.total_tasks
    }

    /// 根据任务计数推导作业的终态
    ///
    /// 所有任务失败时作业为Failed，否则为Completed。
    /// 仅当所有任务都已结束时才可调用。
    pub fn settle(mut self, results: serde_json::Value) -> Result<Self, DomainError> {
        if !self.all_tasks_settled() {
            return Err(DomainError::InvalidStateTransition);
        }
        let now: DateTime<FixedOffset> = Utc::now().into();
        self.status = if self.completed_tasks == 0 {
            BatchJobStatus::Failed
        } else {
            BatchJobStatus::Completed
        };
        self.results = Some(results);
        self.completed_at = Some(now);
        self.processing_time = Some((now - self.created_at).num_milliseconds() as f64 / 1000.0);
        Ok(self)
    }

    /// 取消作业
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        match self.status {
            BatchJobStatus::Pending | BatchJobStatus::Processing => {
                self.status = BatchJobStatus::Cancelled;
                self.completed_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }
}
