// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序用例模块
///
/// 编排领域对象、缓存和仓库，实现完整的请求处理流程
pub mod submit_batch;
pub mod submit_task;
