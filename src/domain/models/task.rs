// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::utils::hashing;

/// 任务实体
///
/// 表示系统中一个待处理的NLP工作单元，可以是文本分类、
/// 实体抽取、摘要生成或情感分析等不同类型的任务。
/// 任务具有状态、重试机制和锁定机制等属性。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务类型，决定调用UltraSafe API的哪个操作
    pub task_type: TaskType,
    /// 任务状态，跟踪任务在其生命周期中的当前阶段
    pub status: TaskStatus,
    /// 输入文本，任务要处理的原始文本
    pub input_text: String,
    /// 输入哈希，输入文本的SHA-256摘要，用于响应缓存
    pub input_hash: String,
    /// 任务参数，包含任务执行所需的类型特定配置
    pub parameters: serde_json::Value,
    /// 处理结果，UltraSafe API返回的JSON结果
    pub result: Option<serde_json::Value>,
    /// 错误信息，处理失败时的错误描述
    pub error: Option<String>,
    /// 所属批处理作业ID（可选）
    pub batch_job_id: Option<Uuid>,
    /// 已尝试次数，记录任务已经尝试执行的次数
    pub attempt_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 锁定令牌，用于分布式环境下的任务锁定
    pub lock_token: Option<Uuid>,
    /// 锁定过期时间，锁定自动释放的时间点
    pub lock_expires_at: Option<DateTime<FixedOffset>>,
    /// 处理耗时（秒），从创建到完成的时间
    pub processing_time: Option<f64>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
    /// 开始处理时间
    pub started_at: Option<DateTime<FixedOffset>>,
    /// 完成时间
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// 更新时间
    pub updated_at: DateTime<FixedOffset>,
}

/// 任务类型枚举
///
/// 定义了系统中支持的NLP操作类型，每种类型对应
/// UltraSafe API的一个端点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// 文本分类任务
    #[default]
    Classification,
    /// 实体抽取任务
    EntityExtraction,
    /// 摘要生成任务
    Summarization,
    /// 情感分析任务
    SentimentAnalysis,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskType::Classification => write!(f, "classification"),
            TaskType::EntityExtraction => write!(f, "entity_extraction"),
            TaskType::Summarization => write!(f, "summarization"),
            TaskType::SentimentAnalysis => write!(f, "sentiment_analysis"),
        }
    }
}

impl FromStr for TaskType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classification" => Ok(TaskType::Classification),
            "entity_extraction" => Ok(TaskType::EntityExtraction),
            "summarization" => Ok(TaskType::Summarization),
            "sentiment_analysis" => Ok(TaskType::SentimentAnalysis),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 表示任务在其生命周期中的不同状态。状态转换遵循以下流程：
/// Pending → Processing → Completed/Failed，
/// Pending/Processing → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 待处理，任务已创建但尚未开始执行
    #[default]
    Pending,
    /// 处理中，任务正在被工作器执行
    Processing,
    /// 已完成，任务成功执行完成
    Completed,
    /// 已失败，任务执行失败
    Failed,
    /// 已取消，任务被取消执行
    Cancelled,
}

impl TaskStatus {
    /// 判断状态是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
///
/// 表示在领域层可能发生的各种错误情况，包括状态转换错误
/// 和验证失败。
#[derive(Error, Debug)]
pub enum DomainError {
    /// 无效的状态转换，当任务状态转换不符合业务规则时发生
    #[error("Invalid state transition")]
    InvalidStateTransition,

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Task {
    /// 创建一个新的任务
    ///
    /// # 参数
    ///
    /// * `task_type` - 任务类型
    /// * `input_text` - 输入文本
    /// * `parameters` - 任务参数
    ///
    /// # 返回值
    ///
    /// 返回新创建的任务实例，输入哈希自动计算
    pub fn new(task_type: TaskType, input_text: String, parameters: serde_json::Value) -> Self {
        let input_hash = hashing::input_hash(&input_text);
        Self {
            id: Uuid::new_v4(),
            task_type,
            status: TaskStatus::Pending,
            input_text,
            input_hash,
            parameters,
            result: None,
            error: None,
            batch_job_id: None,
            attempt_count: 0,
            max_retries: 3,
            lock_token: None,
            lock_expires_at: None,
            processing_time: None,
            created_at: Utc::now().into(),
            started_at: None,
            completed_at: None,
            updated_at: Utc::now().into(),
        }
    }

    /// 创建属于批处理作业的任务
    pub fn new_in_batch(
        task_type: TaskType,
        input_text: String,
        parameters: serde_json::Value,
        batch_job_id: Uuid,
    ) -> Self {
        let mut task = Self::new(task_type, input_text, parameters);
        task.batch_job_id = Some(batch_job_id);
        task
    }

    /// 启动任务
    ///
    /// 将任务状态从Pending变更为Processing
    ///
    /// # 返回值
    ///
    /// * `Ok(Task)` - 成功启动的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::Processing;
                self.started_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 完成任务
    ///
    /// 将任务状态从Processing变更为Completed并记录结果与处理耗时
    ///
    /// # 返回值
    ///
    /// * `Ok(Task)` - 成功完成的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn complete(mut self, result: serde_json::Value) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Processing => {
                let now: DateTime<FixedOffset> = Utc::now().into();
                self.status = TaskStatus::Completed;
                self.result = Some(result);
                self.completed_at = Some(now);
                self.processing_time =
                    Some((now - self.created_at).num_milliseconds() as f64 / 1000.0);
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 标记任务失败
    ///
    /// 将任务状态从Processing变更为Failed并记录错误信息
    ///
    /// # 返回值
    ///
    /// * `Ok(Task)` - 失败的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn fail(mut self, error: String) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Processing => {
                self.status = TaskStatus::Failed;
                self.error = Some(error);
                self.completed_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 取消任务
    ///
    /// 将任务状态变更为Cancelled
    ///
    /// # 返回值
    ///
    /// * `Ok(Task)` - 已取消的任务
    /// * `Err(DomainError)` - 状态转换失败
    pub fn cancel(mut self) -> Result<Self, DomainError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Cancelled;
                self.completed_at = Some(Utc::now().into());
                Ok(self)
            }
            _ => Err(DomainError::InvalidStateTransition),
        }
    }

    /// 判断任务是否可以重试
    pub fn can_retry(&self) -> bool {
        self.status == TaskStatus::Failed && self.attempt_count < self.max_retries
    }
}
