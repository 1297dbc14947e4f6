// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// NLP提供商模块
///
/// 提供UltraSafe NLP API的HTTP客户端实现
pub mod ultrasafe_client;
