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

use crate::domain::models::webhook::{Webhook, WebhookEvent, WebhookStatus};
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use chrono::Utc;
use futures::StreamExt;
use hmac::{Hmac, Mac};
use metrics::{counter, histogram};
use reqwest::{header, Client};

use sha2::Sha256;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Webhook工作器
///
/// 轮询待投递的Webhook事件，使用HMAC-SHA256签名后发送。
/// 绑定注册端点的事件使用端点自身的密钥签名，并维护端点的
/// 失败计数；临时回调URL使用全局密钥。
#[derive(Clone)]
pub struct WebhookWorker<R, W>
where
    R: WebhookEventRepository,
    W: WebhookRepository,
{
    /// 事件仓库
    repo: Arc<R>,
    /// 端点仓库
    webhook_repo: Arc<W>,
    /// 临时回调URL使用的全局签名密钥
    default_secret: String,
    /// 端点连续失败停用阈值
    max_endpoint_failures: i32,
    /// 投递超时时间
    timeout: Duration,
    /// HTTP客户端
    client: Client,
}

impl<R, W> WebhookWorker<R, W>
where
    R: WebhookEventRepository,
    W: WebhookRepository,
{
    /// 创建新的Webhook工作器实例
    ///
    /// # 参数
    ///
    /// * `repo` - 事件仓库
    /// * `webhook_repo` - 端点仓库
    /// * `default_secret` - 临时回调URL的签名密钥
    /// * `max_endpoint_failures` - 端点停用阈值
    /// * `timeout` - 投递超时时间
    ///
    /// # 返回值
    ///
    /// 返回新的Webhook工作器实例
    pub fn new(
        repo: Arc<R>,
        webhook_repo: Arc<W>,
        default_secret: String,
        max_endpoint_failures: i32,
        timeout: Duration,
    ) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Nlprs-Webhook/0.1.0"),
        );
        Self {
            repo,
            webhook_repo,
            default_secret,
            max_endpoint_failures,
            timeout,
            client: Client::builder().default_headers(headers).build().unwrap(),
        }
    }

    /// 运行Webhook工作器
    ///
    /// 启动Webhook处理循环，定期处理待处理的Webhook事件
    pub async fn run(&self) {
        info!("Webhook worker started");
        loop {
            if let Err(e) = self.process_pending_webhooks().await {
                error!("Error processing webhooks: {}", e);
            }
            sleep(Duration::from_secs(5)).await;
        }
    }

    /// 处理待处理的Webhook事件
    ///
    /// 从数据库中获取待处理的Webhook事件并发送
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 处理成功
    /// * `Err(anyhow::Error)` - 处理失败
    pub async fn process_pending_webhooks(&self) -> anyhow::Result<()> {
        // Batch size
        let batch_size = 50;

        let events = self.repo.find_pending(batch_size).await?;

        if events.is_empty() {
            return Ok(());
        }

        info!("Processing {} pending webhooks", events.len());

        // Process in parallel with bounded concurrency
        let worker = self;
        futures::stream::iter(events)
            .for_each_concurrent(10, |event| {
                let w = worker;
                async move {
                    if let Err(e) = w.deliver_webhook(event).await {
                        error!("Failed to deliver webhook: {}", e);
                    }
                }
            })
            .await;

        Ok(())
    }

    async fn deliver_webhook(&self, mut event: WebhookEvent) -> anyhow::Result<()> {
        // 绑定注册端点的事件用端点密钥签名；端点被停用或删除时
        // 事件直接进入死信状态
        let endpoint = match event.webhook_id {
            Some(webhook_id) => match self.webhook_repo.find_by_id(webhook_id).await? {
                Some(webhook) if webhook.is_active => Some(webhook),
                _ => {
                    warn!(
                        "Webhook {} targets inactive endpoint, moving to dead letter",
                        event.id
                    );
                    event.status = WebhookStatus::Dead;
                    event.updated_at = Utc::now();
                    self.repo.update(&event).await?;
                    counter!("webhook_dead_letter_total").increment(1);
                    return Ok(());
                }
            },
            None => None,
        };

        info!("Delivering webhook {} to {}", event.id, event.webhook_url);
        counter!("webhook_delivery_attempts_total").increment(1);

        let start = std::time::Instant::now();

        // Create signature
        let secret = endpoint
            .as_ref()
            .map(|w| w.secret.as_str())
            .unwrap_or(&self.default_secret);
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(event.payload.to_string().as_bytes());
        let signature_hex = hex::encode(mac.finalize().into_bytes());

        let response = self
            .client
            .post(&event.webhook_url)
            .header("X-Nlprs-Signature", signature_hex)
            .header("X-Nlprs-Event", event.event_type.to_string())
            .json(&event.payload)
            .timeout(self.timeout)
            .send()
            .await;

        let duration = start.elapsed();
        histogram!("webhook_delivery_duration_seconds").record(duration.as_secs_f64());

        match response {
            Ok(resp) => {
                // Record response status
                let status = resp.status().as_u16() as i32;
                event.response_status = Some(status);

                if resp.status().is_success() {
                    event.status = WebhookStatus::Delivered;
                    event.delivered_at = Some(Utc::now());
                    event.updated_at = Utc::now();

                    info!("Webhook {} delivered successfully", event.id);
                    self.repo.update(&event).await?;
                    counter!("webhook_delivery_success_total").increment(1);
                    self.record_endpoint_outcome(endpoint, Some(status), true)
                        .await?;
                } else {
                    // Non-success status code
                    error!(
                        "Webhook {} delivery failed with status: {}",
                        event.id,
                        resp.status()
                    );
                    self.handle_failure(event).await?;
                    counter!("webhook_delivery_failed_total", "reason" => "http_error")
                        .increment(1);
                    self.record_endpoint_outcome(endpoint, Some(status), false)
                        .await?;
                }
            }
            Err(e) => {
                // Network or other error
                error!("Webhook {} delivery failed with error: {}", event.id, e);
                event.error_message = Some(e.to_string());
                self.handle_failure(event).await?;
                counter!("webhook_delivery_failed_total", "reason" => "network_error").increment(1);
                self.record_endpoint_outcome(endpoint, None, false).await?;
            }
        }

        Ok(())
    }

    async fn handle_failure(&self, mut event: WebhookEvent) -> anyhow::Result<()> {
        // 死信事件同样记录真实的尝试次数
        event.attempt_count += 1;
        event.updated_at = Utc::now();

        if event.attempt_count >= event.max_retries {
            event.status = WebhookStatus::Dead; // Dead Letter Queue equivalent
            info!(
                "Webhook moved to dead letter state after {} attempts",
                event.attempt_count
            );
            counter!("webhook_dead_letter_total").increment(1);
        } else {
            event.status = WebhookStatus::Failed;

            // Exponential backoff with jitter
            let base_backoff = 2u64.pow(event.attempt_count as u32);
            let jitter = rand::random_range(0..base_backoff / 2 + 1);
            let backoff = base_backoff + jitter;

            event.next_retry_at = Some(Utc::now() + chrono::Duration::seconds(backoff as i64));
        }

        self.repo.update(&event).await?;
        Ok(())
    }

    /// 更新注册端点的健康状态
    ///
    /// 成功投递会清零失败计数；连续失败达到阈值时端点被停用，
    /// 后续事件不再向其投递。
    async fn record_endpoint_outcome(
        &self,
        endpoint: Option<Webhook>,
        status: Option<i32>,
        success: bool,
    ) -> anyhow::Result<()> {
        let Some(mut webhook) = endpoint else {
            return Ok(());
        };

        if success {
            webhook.record_success(status.unwrap_or(200));
        } else {
            webhook.record_failure(status, self.max_endpoint_failures);
            if !webhook.is_active {
                warn!(
                    "Webhook endpoint {} deactivated after {} consecutive failures",
                    webhook.id, webhook.failure_count
                );
                counter!("webhook_endpoints_deactivated_total").increment(1);
            }
        }

        self.webhook_repo.update(&webhook).await?;
        Ok(())
    }
}
