// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供缓存功能的实现
/// 包括Redis客户端和NLP响应缓存
pub mod redis_client;
pub mod response_cache;
