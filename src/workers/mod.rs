// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台任务处理和工作器管理功能
/// 包括NLP任务执行、Webhook投递、卡死任务回收和生命周期管理
pub mod manager;
pub mod nlp_worker;
pub mod reaper_worker;
pub mod webhook_worker;
pub mod worker;

pub use worker::Worker;
