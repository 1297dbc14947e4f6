// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::TaskType;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// NLP服务特质
///
/// 定义NLP处理提供商的抽象接口。具体实现由基础设施层提供，
/// 将任务类型映射到提供商的对应操作。
#[async_trait]
pub trait NlpService: Send + Sync {
    /// 处理一段文本
    ///
    /// # 参数
    ///
    /// * `task_type` - 任务类型，决定执行哪种NLP操作
    /// * `text` - 输入文本
    /// * `parameters` - 类型特定的参数
    ///
    /// # 返回值
    ///
    /// * `Ok(Value)` - 提供商返回的JSON结果
    /// * `Err(anyhow::Error)` - 处理失败
    async fn process(&self, task_type: TaskType, text: &str, parameters: &Value) -> Result<Value>;
}
