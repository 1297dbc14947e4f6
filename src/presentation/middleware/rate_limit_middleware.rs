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

use crate::infrastructure::cache::redis_client::RedisClient;
use thiserror::Error;

/// 速率限制错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// 请求过多错误
    #[error("Too many requests")]
    TooManyRequests,

    /// 内部服务器错误
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// 速率限制器
///
/// 基于Redis的固定窗口计数器，窗口为一分钟。
/// 每个API密钥可在数据库中配置专属限额，未配置时使用默认值。
pub struct RateLimiter {
    /// Redis客户端
    redis_client: RedisClient,

    /// 默认每分钟限制请求数
    default_limit_per_minute: u32,
}

impl RateLimiter {
    /// 创建新的速率限制器实例
    ///
    /// # 参数
    ///
    /// * `redis_client` - Redis客户端实例
    /// * `default_limit_per_minute` - 默认每分钟请求数限制
    ///
    /// # 返回值
    ///
    /// 返回新的速率限制器实例
    pub fn new(redis_client: RedisClient, default_limit_per_minute: u32) -> Self {
        Self {
            redis_client,
            default_limit_per_minute,
        }
    }

    /// 检查API密钥的请求速率是否超出限制
    ///
    /// # 参数
    ///
    /// * `api_key` - API密钥
    /// * `limit_override` - 密钥专属的限额（来自api_keys表）
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 请求未超出限制
    /// * `Err(RateLimitError)` - 请求超出限制或发生错误
    pub async fn check(
        &self,
        api_key: &str,
        limit_override: Option<u32>,
    ) -> Result<(), RateLimitError> {
        let key = format!("rate_limit:{}", api_key);
        let current_requests = self
            .redis_client
            .incr(&key)
            .await
            .map_err(|e| RateLimitError::InternalError(format!("Redis INCR failed: {}", e)))?;

        // Set expiry for the key if it's a new counter (i.e., current_requests == 1)
        // This ensures the key expires after one minute, resetting the rate limit.
        if current_requests == 1 {
            self.redis_client.expire(&key, 60).await.map_err(|e| {
                RateLimitError::InternalError(format!("Redis EXPIRE failed: {}", e))
            })?;
        }

        let limit = limit_override.unwrap_or(self.default_limit_per_minute);

        if current_requests > limit.into() {
            return Err(RateLimitError::TooManyRequests);
        }

        Ok(())
    }
}
