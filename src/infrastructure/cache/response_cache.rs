// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CacheSettings;
use crate::domain::models::task::TaskType;
use crate::infrastructure::cache::redis_client::RedisClient;
use metrics::counter;
use tracing::{debug, warn};

/// NLP响应缓存
///
/// 以输入文本哈希为键缓存提供商的处理结果。相同类型、
/// 相同文本的重复请求直接命中缓存，不再产生提供商调用。
/// 缓存故障不阻断请求处理，仅记录日志。
#[derive(Clone)]
pub struct ResponseCache {
    redis: RedisClient,
    enabled: bool,
    ttl_seconds: u64,
    prefix: String,
}

impl ResponseCache {
    /// 创建响应缓存实例
    pub fn new(redis: RedisClient, settings: &CacheSettings) -> Self {
        Self {
            redis,
            enabled: settings.enabled,
            ttl_seconds: settings.ttl_seconds,
            prefix: settings.prefix.clone(),
        }
    }

    /// 构造缓存键
    ///
    /// 格式为 `{prefix}:{task_type}:{input_hash}`
    pub fn cache_key(&self, task_type: TaskType, input_hash: &str) -> String {
        format!("{}:{}:{}", self.prefix, task_type, input_hash)
    }

    /// 查询缓存的处理结果
    pub async fn get(&self, task_type: TaskType, input_hash: &str) -> Option<serde_json::Value> {
        if !self.enabled {
            return None;
        }

        let key = self.cache_key(task_type, input_hash);
        match self.redis.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    counter!("nlp_cache_hits_total").increment(1);
                    debug!(key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached value is not valid JSON, ignoring");
                    None
                }
            },
            Ok(None) => {
                counter!("nlp_cache_misses_total").increment(1);
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    /// 写入处理结果
    pub async fn put(&self, task_type: TaskType, input_hash: &str, result: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let key = self.cache_key(task_type, input_hash);
        let raw = result.to_string();
        if let Err(e) = self.redis.set(&key, &raw, self.ttl_seconds as usize).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}
