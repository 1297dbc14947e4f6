// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 基于SeaORM提供领域仓库接口的具体实现
pub mod batch_job_repo_impl;
pub mod task_repo_impl;
pub mod webhook_event_repo_impl;
pub mod webhook_repo_impl;
