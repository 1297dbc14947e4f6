// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::UltraSafeSettings;
use crate::domain::models::task::TaskType;
use crate::domain::services::nlp_service::NlpService;
use crate::utils::retry_policy::{is_retryable_error, RetryPolicy};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// UltraSafe NLP API客户端
///
/// 封装对UltraSafe API的HTTP调用。每种任务类型映射到一个
/// API端点，请求携带Bearer认证。对限流和服务端错误
/// 采用指数退避重试。
#[derive(Clone)]
pub struct UltraSafeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    max_retries: u32,
    retry_policy: RetryPolicy,
}

impl UltraSafeClient {
    /// 根据配置创建客户端实例
    pub fn new(settings: &UltraSafeSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            max_retries: settings.max_retries,
            retry_policy: RetryPolicy::fast(),
        })
    }

    /// 任务类型对应的API端点路径
    fn endpoint(task_type: TaskType) -> &'static str {
        match task_type {
            TaskType::Classification => "classify",
            TaskType::EntityExtraction => "extract-entities",
            TaskType::Summarization => "summarize",
            TaskType::SentimentAnalysis => "analyze-sentiment",
        }
    }

    /// 构造请求体：文本加上类型特定参数
    fn build_body(text: &str, parameters: &Value) -> Value {
        let mut body = Map::new();
        body.insert("text".to_string(), Value::String(text.to_string()));
        if let Value::Object(params) = parameters {
            for (k, v) in params {
                body.insert(k.clone(), v.clone());
            }
        }
        Value::Object(body)
    }

    /// 判断响应状态是否值得重试
    fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn post_once(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .context("UltraSafe API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if Self::is_retryable_status(status) {
                return Err(anyhow!("UltraSafe API returned {}: {}", status, text));
            }
            return Err(anyhow!(
                "UltraSafe API rejected request with {}: {}",
                status,
                text
            ));
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse UltraSafe API response")
    }
}

#[async_trait]
impl NlpService for UltraSafeClient {
    async fn process(&self, task_type: TaskType, text: &str, parameters: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.api_url, Self::endpoint(task_type));
        let body = Self::build_body(text, parameters);

        let start = Instant::now();
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_policy.calculate_backoff(attempt);
                debug!(
                    url = %url,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying UltraSafe API call"
                );
                tokio::time::sleep(backoff).await;
            }

            match self.post_once(&url, &body).await {
                Ok(result) => {
                    counter!("ultrasafe_requests_total", "operation" => Self::endpoint(task_type), "outcome" => "success")
                        .increment(1);
                    histogram!("ultrasafe_request_duration_seconds", "operation" => Self::endpoint(task_type))
                        .record(start.elapsed().as_secs_f64());
                    return Ok(result);
                }
                Err(e) => {
                    warn!(url = %url, attempt, error = %e, "UltraSafe API call failed");
                    if !is_retryable_error(&e) {
                        counter!("ultrasafe_requests_total", "operation" => Self::endpoint(task_type), "outcome" => "rejected")
                            .increment(1);
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        counter!("ultrasafe_requests_total", "operation" => Self::endpoint(task_type), "outcome" => "error")
            .increment(1);
        Err(last_error.unwrap_or_else(|| anyhow!("UltraSafe API call failed")))
    }
}
