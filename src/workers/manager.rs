// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::batch_job_repository::BatchJobRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::repositories::webhook_event_repository::WebhookEventRepository;
use crate::domain::repositories::webhook_repository::WebhookRepository;
use crate::domain::services::nlp_service::NlpService;
use crate::domain::services::notification_service::NotificationService;
use crate::infrastructure::cache::response_cache::ResponseCache;
use crate::queue::task_queue::TaskQueue;
use crate::workers::nlp_worker::NlpWorker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager<Q, T, B, W, E>
where
    Q: TaskQueue + 'static,
    T: TaskRepository + 'static,
    B: BatchJobRepository + 'static,
    W: WebhookRepository + 'static,
    E: WebhookEventRepository + 'static,
{
    queue: Arc<Q>,
    task_repository: Arc<T>,
    batch_repository: Arc<B>,
    notifications: Arc<NotificationService<W, E>>,
    nlp_service: Arc<dyn NlpService>,
    cache: ResponseCache,
    handles: Vec<JoinHandle<()>>,
}

impl<Q, T, B, W, E> WorkerManager<Q, T, B, W, E>
where
    Q: TaskQueue + Send + Sync + 'static,
    T: TaskRepository + Send + Sync + 'static,
    B: BatchJobRepository + Send + Sync + 'static,
    W: WebhookRepository + Send + Sync + 'static,
    E: WebhookEventRepository + Send + Sync + 'static,
{
    pub fn new(
        queue: Arc<Q>,
        task_repository: Arc<T>,
        batch_repository: Arc<B>,
        notifications: Arc<NotificationService<W, E>>,
        nlp_service: Arc<dyn NlpService>,
        cache: ResponseCache,
    ) -> Self {
        Self {
            queue,
            task_repository,
            batch_repository,
            notifications,
            nlp_service,
            cache,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub async fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = NlpWorker::new(
                self.task_repository.clone(),
                self.batch_repository.clone(),
                self.notifications.clone(),
                self.nlp_service.clone(),
                self.cache.clone(),
            );

            let queue = self.queue.clone();
            // We spawn the worker loop on a separate task to avoid blocking the main thread
            // or the loop that spawns workers.
            let handle = tokio::spawn(async move {
                worker.run(queue).await;
            });
            self.handles.push(handle);
        }
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
