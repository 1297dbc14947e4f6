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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Redis、服务器、速率限制、缓存、UltraSafe API
/// 和Webhook等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 响应缓存配置
    pub cache: CacheSettings,
    /// UltraSafe NLP API配置
    pub ultrasafe: UltraSafeSettings,
    /// Webhook 配置
    pub webhook: WebhookSettings,
    /// 工作器配置
    pub workers: WorkerSettings,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 速率限制配置设置
#[derive(Debug, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 默认每分钟请求数限制
    pub default_rpm: u32,
}

/// 响应缓存配置设置
#[derive(Debug, Deserialize)]
pub struct CacheSettings {
    /// 是否启用响应缓存
    pub enabled: bool,
    /// 缓存过期时间（秒）
    pub ttl_seconds: u64,
    /// 缓存键前缀
    pub prefix: String,
}

/// UltraSafe NLP API配置设置
#[derive(Debug, Deserialize)]
pub struct UltraSafeSettings {
    /// API基础URL
    pub api_url: String,
    /// API密钥
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout: u64,
    /// 最大重试次数
    pub max_retries: u32,
}

/// Webhook配置设置
#[derive(Debug, Deserialize)]
pub struct WebhookSettings {
    /// 临时回调URL使用的全局签名密钥
    pub secret: String,
    /// 注册端点连续失败多少次后停用
    pub max_failures: i32,
    /// 投递超时时间（秒）
    pub timeout: u64,
    /// 每个事件的最大投递重试次数
    pub max_retries: i32,
}

/// 工作器配置设置
#[derive(Debug, Deserialize)]
pub struct WorkerSettings {
    /// NLP工作器数量
    pub count: usize,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Default DB pool settings
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Rate Limiting settings
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.default_rpm", 100)?
            // Default Cache settings
            .set_default("cache.enabled", true)?
            .set_default("cache.ttl_seconds", 3600)?
            .set_default("cache.prefix", "nlprs")?
            // Default UltraSafe settings
            .set_default("ultrasafe.api_url", "https://api.ultrasafe.ai/v1")?
            .set_default("ultrasafe.api_key", "")?
            .set_default("ultrasafe.timeout", 30)?
            .set_default("ultrasafe.max_retries", 3)?
            // Default Webhook settings
            .set_default("webhook.secret", "your-secret-key")?
            .set_default("webhook.max_failures", 3)?
            .set_default("webhook.timeout", 10)?
            .set_default("webhook.max_retries", 3)?
            // Default Worker settings
            .set_default("workers.count", 5)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("NLPRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
