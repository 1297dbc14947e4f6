// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Webhook实体
///
/// 表示一个已注册的Webhook端点配置，用于接收系统事件通知。
/// Webhook允许外部系统订阅NLP任务和批处理作业的状态变化通知。
/// 每个端点持有独立的签名密钥，连续投递失败达到阈值后自动停用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Webhook唯一标识符
    pub id: Uuid,
    /// Webhook回调URL，接收通知的目标地址
    pub url: String,
    /// 订阅的事件类型列表
    pub events: Vec<WebhookEventType>,
    /// 描述信息（可选）
    pub description: Option<String>,
    /// 签名密钥，用于计算投递负载的HMAC签名
    pub secret: String,
    /// 是否启用，停用的端点不再接收任何事件
    pub is_active: bool,
    /// 连续失败次数，成功投递后清零
    pub failure_count: i32,
    /// 最后一次触发时间
    pub last_triggered: Option<DateTime<Utc>>,
    /// 最后一次投递的HTTP响应状态码
    pub last_status: Option<i32>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Webhook {
    /// 创建一个新的Webhook配置
    ///
    /// # 参数
    ///
    /// * `url` - Webhook回调URL
    /// * `events` - 订阅的事件类型列表
    /// * `description` - 描述信息
    /// * `secret` - 签名密钥
    ///
    /// # 返回值
    ///
    /// 返回一个新的启用状态的Webhook实例
    pub fn new(
        url: String,
        events: Vec<WebhookEventType>,
        description: Option<String>,
        secret: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            events,
            description,
            secret,
            is_active: true,
            failure_count: 0,
            last_triggered: None,
            last_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// 判断端点是否订阅了指定的事件类型
    pub fn subscribes_to(&self, event_type: &WebhookEventType) -> bool {
        self.is_active && self.events.contains(event_type)
    }

    /// 记录一次成功投递，清零连续失败计数
    pub fn record_success(&mut self, status: i32) {
        self.failure_count = 0;
        self.last_triggered = Some(Utc::now());
        self.last_status = Some(status);
        self.updated_at = Utc::now();
    }

    /// 记录一次失败投递
    ///
    /// 连续失败次数达到`max_failures`时停用端点
    pub fn record_failure(&mut self, status: Option<i32>, max_failures: i32) {
        self.failure_count += 1;
        self.last_triggered = Some(Utc::now());
        self.last_status = status;
        if self.failure_count >= max_failures {
            self.is_active = false;
        }
        self.updated_at = Utc::now();
    }
}

/// Webhook事件实体
///
/// 表示一个待发送的Webhook通知事件，包含事件类型、
/// 负载数据、发送状态和重试机制等信息。事件先写入数据库，
/// 再由后台工作器异步投递。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// 事件唯一标识符
    pub id: Uuid,
    /// 关联的Webhook ID，临时回调URL投递时为空
    pub webhook_id: Option<Uuid>,
    /// 事件类型，决定通知的内容和格式
    pub event_type: WebhookEventType,
    /// 事件负载数据，包含具体的通知内容
    pub payload: serde_json::Value,
    /// Webhook回调URL，事件发送的目标地址
    pub webhook_url: String,
    /// 事件状态，跟踪事件的发送进度
    pub status: WebhookStatus,
    /// 已重试次数，记录事件已经尝试发送的次数
    pub attempt_count: i32,
    /// 最大重试次数，事件发送失败时的最大重试限制
    pub max_retries: i32,
    /// 响应状态码，最后一次发送的HTTP响应状态
    pub response_status: Option<i32>,
    /// 错误信息，发送失败时的错误描述
    pub error_message: Option<String>,
    /// 下次重试时间，计划的下一次重试时间点
    pub next_retry_at: Option<DateTime<Utc>>,
    /// 创建时间，事件创建的时间戳
    pub created_at: DateTime<Utc>,
    /// 更新时间，事件状态最近一次变化的时间戳
    pub updated_at: DateTime<Utc>,
    /// 发送时间，事件成功发送的时间戳
    pub delivered_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    /// 创建发往已注册端点的事件
    pub fn for_webhook(
        webhook: &Webhook,
        event_type: WebhookEventType,
        payload: serde_json::Value,
        max_retries: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id: Some(webhook.id),
            event_type,
            payload,
            webhook_url: webhook.url.clone(),
            status: WebhookStatus::Pending,
            attempt_count: 0,
            max_retries,
            response_status: None,
            error_message: None,
            next_retry_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            delivered_at: None,
        }
    }

    /// 创建发往临时回调URL的事件
    ///
    /// 批处理作业提交时可附带一次性的回调URL，
    /// 该类事件不关联任何已注册端点。
    pub fn for_url(
        url: String,
        event_type: WebhookEventType,
        payload: serde_json::Value,
        max_retries: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id: None,
            event_type,
            payload,
            webhook_url: url,
            status: WebhookStatus::Pending,
            attempt_count: 0,
            max_retries,
            response_status: None,
            error_message: None,
            next_retry_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            delivered_at: None,
        }
    }
}

/// Webhook事件类型枚举
///
/// 定义了系统中支持的不同类型的Webhook事件，每种类型
/// 对应不同的业务场景和通知内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// 任务完成，当NLP任务成功完成时触发
    TaskCompleted,
    /// 任务失败，当NLP任务执行失败时触发
    TaskFailed,
    /// 批处理作业完成，当作业中所有任务结束且至少一个成功时触发
    BatchCompleted,
    /// 批处理作业失败，当作业中所有任务均失败时触发
    BatchFailed,
    /// 测试事件，验证端点连通性时触发
    Test,
}

impl fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookEventType::TaskCompleted => write!(f, "task.completed"),
            WebhookEventType::TaskFailed => write!(f, "task.failed"),
            WebhookEventType::BatchCompleted => write!(f, "batch.completed"),
            WebhookEventType::BatchFailed => write!(f, "batch.failed"),
            WebhookEventType::Test => write!(f, "test"),
        }
    }
}

impl FromStr for WebhookEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task.completed" => Ok(WebhookEventType::TaskCompleted),
            "task.failed" => Ok(WebhookEventType::TaskFailed),
            "batch.completed" => Ok(WebhookEventType::BatchCompleted),
            "batch.failed" => Ok(WebhookEventType::BatchFailed),
            "test" => Ok(WebhookEventType::Test),
            _ => Err(()),
        }
    }
}

/// Webhook状态枚举
///
/// 表示Webhook事件在其生命周期中的不同状态，用于跟踪
/// 事件的发送进度和结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// 待处理，事件已创建但尚未发送
    #[default]
    Pending,
    /// 已发送，事件已成功发送到目标URL
    Delivered,
    /// 发送失败，事件发送失败但仍在重试中
    Failed,
    /// 死信，事件发送失败且已达到最大重试次数
    Dead,
}

impl fmt::Display for WebhookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookStatus::Pending => write!(f, "pending"),
            WebhookStatus::Delivered => write!(f, "delivered"),
            WebhookStatus::Failed => write!(f, "failed"),
            WebhookStatus::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for WebhookStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WebhookStatus::Pending),
            "delivered" => Ok(WebhookStatus::Delivered),
            "failed" => Ok(WebhookStatus::Failed),
            "dead" => Ok(WebhookStatus::Dead),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_webhook() -> Webhook {
        Webhook::new(
            "https://example.com/hook".to_string(),
            vec![WebhookEventType::TaskCompleted, WebhookEventType::Test],
            Some("test endpoint".to_string()),
            "s3cr3t".to_string(),
        )
    }

    #[test]
    fn test_subscribes_to_respects_event_list_and_active_flag() {
        let mut webhook = sample_webhook();
        assert!(webhook.subscribes_to(&WebhookEventType::TaskCompleted));
        assert!(!webhook.subscribes_to(&WebhookEventType::BatchCompleted));

        webhook.is_active = false;
        assert!(!webhook.subscribes_to(&WebhookEventType::TaskCompleted));
    }

    #[test]
    fn test_record_failure_deactivates_at_threshold() {
        let mut webhook = sample_webhook();
        webhook.record_failure(Some(500), 3);
        webhook.record_failure(None, 3);
        assert!(webhook.is_active);

        webhook.record_failure(Some(502), 3);
        assert!(!webhook.is_active);
        assert_eq!(webhook.failure_count, 3);
    }

    #[test]
    fn test_record_success_resets_failure_count() {
        let mut webhook = sample_webhook();
        webhook.record_failure(Some(500), 3);
        webhook.record_success(200);
        assert_eq!(webhook.failure_count, 0);
        assert_eq!(webhook.last_status, Some(200));
        assert!(webhook.is_active);
    }

    #[test]
    fn test_event_for_url_has_no_webhook_id() {
        let event = WebhookEvent::for_url(
            "https://example.com/batch-hook".to_string(),
            WebhookEventType::BatchCompleted,
            serde_json::json!({"batch_job_id": "x"}),
            3,
        );
        assert!(event.webhook_id.is_none());
        assert_eq!(event.status, WebhookStatus::Pending);
    }

    #[test]
    fn test_event_type_round_trip() {
        for t in [
            WebhookEventType::TaskCompleted,
            WebhookEventType::TaskFailed,
            WebhookEventType::BatchCompleted,
            WebhookEventType::BatchFailed,
            WebhookEventType::Test,
        ] {
            assert_eq!(t.to_string().parse::<WebhookEventType>().unwrap(), t);
        }
    }
}
