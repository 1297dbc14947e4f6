// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务仓库（task_repository）：管理NLP任务的调度和执行
/// - 批处理作业仓库（batch_job_repository）：管理批处理作业的进度聚合
/// - Webhook仓库（webhook_repository）：管理Webhook端点配置
/// - Webhook事件仓库（webhook_event_repository）：管理Webhook事件的发送
///
/// 这些接口确保了领域层不依赖于具体的数据存储技术，
/// 提高了系统的可测试性和可维护性.
pub mod batch_job_repository;
pub mod task_repository;
pub mod webhook_event_repository;
pub mod webhook_repository;
