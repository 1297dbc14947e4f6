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

use crate::domain::models::task::TaskType;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 批处理作业中的单个任务
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct BatchTaskDto {
    /// 任务类型
    pub task_type: TaskType,
    /// 输入文本
    #[validate(length(min = 1))]
    pub text: String,
    /// 类型特定参数
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// 批处理作业提交请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct BatchSubmitRequestDto {
    /// 任务列表
    #[validate(length(min = 1), nested)]
    pub tasks: Vec<BatchTaskDto>,
    /// 作业完成后的回调URL（可选）
    #[validate(url)]
    pub webhook_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_task_list_fails_validation() {
        let dto = BatchSubmitRequestDto {
            tasks: vec![],
            webhook_url: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_invalid_webhook_url_fails_validation() {
        let dto = BatchSubmitRequestDto {
            tasks: vec![BatchTaskDto {
                task_type: TaskType::Classification,
                text: "hello".to_string(),
                parameters: json!({}),
            }],
            webhook_url: Some("not a url".to_string()),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_nested_empty_text_fails_validation() {
        let dto = BatchSubmitRequestDto {
            tasks: vec![BatchTaskDto {
                task_type: TaskType::Summarization,
                text: String::new(),
                parameters: json!({}),
            }],
            webhook_url: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_parameters_default_to_null() {
        let dto: BatchTaskDto = serde_json::from_value(json!({
            "task_type": "sentiment_analysis",
            "text": "ok"
        }))
        .unwrap();
        assert!(dto.parameters.is_null());
    }
}
