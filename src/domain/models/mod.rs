// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 批处理作业模型
pub mod batch_job;

/// 任务模型
pub mod task;

/// Webhook模型
pub mod webhook;
