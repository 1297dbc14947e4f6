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
use serde_json::json;
use validator::Validate;

/// 文本分类请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ClassificationRequestDto {
    /// 待分类的文本
    #[validate(length(min = 1))]
    pub text: String,
    /// 候选分类列表
    #[validate(length(min = 1))]
    pub categories: Vec<String>,
    /// 附加上下文（可选，直接透传给提供商）
    pub context: Option<String>,
}

/// 实体抽取请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct EntityExtractionRequestDto {
    /// 待抽取的文本
    #[validate(length(min = 1))]
    pub text: String,
    /// 需要识别的实体类型列表
    #[validate(length(min = 1))]
    pub entity_types: Vec<String>,
    /// 附加上下文（可选）
    pub context: Option<String>,
}

/// 摘要生成请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SummarizationRequestDto {
    /// 待摘要的文本
    #[validate(length(min = 1))]
    pub text: String,
    /// 摘要最大长度
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// 附加上下文（可选）
    pub context: Option<String>,
}

fn default_max_length() -> u32 {
    150
}

/// 情感分析请求数据传输对象
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SentimentAnalysisRequestDto {
    /// 待分析的文本
    #[validate(length(min = 1))]
    pub text: String,
    /// 附加上下文（可选）
    pub context: Option<String>,
}

/// 经过校验的NLP任务提交请求
///
/// 各类型DTO统一转换成该结构，供提交用例消费
#[derive(Debug, Clone)]
pub struct NlpSubmission {
    pub task_type: TaskType,
    pub text: String,
    pub parameters: serde_json::Value,
}

impl From<ClassificationRequestDto> for NlpSubmission {
    fn from(dto: ClassificationRequestDto) -> Self {
        let mut parameters = json!({ "categories": dto.categories });
        if let Some(context) = dto.context {
            parameters["context"] = json!(context);
        }
        Self {
            task_type: TaskType::Classification,
            text: dto.text,
            parameters,
        }
    }
}

impl From<EntityExtractionRequestDto> for NlpSubmission {
    fn from(dto: EntityExtractionRequestDto) -> Self {
        let mut parameters = json!({ "entity_types": dto.entity_types });
        if let Some(context) = dto.context {
            parameters["context"] = json!(context);
        }
        Self {
            task_type: TaskType::EntityExtraction,
            text: dto.text,
            parameters,
        }
    }
}

impl From<SummarizationRequestDto> for NlpSubmission {
    fn from(dto: SummarizationRequestDto) -> Self {
        let mut parameters = json!({ "max_length": dto.max_length });
        if let Some(context) = dto.context {
            parameters["context"] = json!(context);
        }
        Self {
            task_type: TaskType::Summarization,
            text: dto.text,
            parameters,
        }
    }
}

impl From<SentimentAnalysisRequestDto> for NlpSubmission {
    fn from(dto: SentimentAnalysisRequestDto) -> Self {
        let mut parameters = json!({});
        if let Some(context) = dto.context {
            parameters["context"] = json!(context);
        }
        Self {
            task_type: TaskType::SentimentAnalysis,
            text: dto.text,
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_fails_validation() {
        let dto = SentimentAnalysisRequestDto {
            text: String::new(),
            context: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_classification_requires_categories() {
        let dto = ClassificationRequestDto {
            text: "hello".to_string(),
            categories: vec![],
            context: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_summarization_default_max_length() {
        let dto: SummarizationRequestDto =
            serde_json::from_value(json!({"text": "long article"})).unwrap();
        assert_eq!(dto.max_length, 150);
        let submission: NlpSubmission = dto.into();
        assert_eq!(submission.parameters["max_length"], 150);
    }

    #[test]
    fn test_context_is_passed_through() {
        let dto = ClassificationRequestDto {
            text: "hello".to_string(),
            categories: vec!["news".to_string()],
            context: Some("background".to_string()),
        };
        let submission: NlpSubmission = dto.into();
        assert_eq!(submission.parameters["context"], "background");
    }
}
