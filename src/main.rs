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

use axum::Extension;
use nlprs::application::use_cases::submit_batch::SubmitBatchUseCase;
use nlprs::application::use_cases::submit_task::SubmitTaskUseCase;
use nlprs::config::settings::Settings;
use nlprs::domain::services::nlp_service::NlpService;
use nlprs::domain::services::notification_service::NotificationService;
use nlprs::infrastructure::cache::redis_client::RedisClient;
use nlprs::infrastructure::cache::response_cache::ResponseCache;
use nlprs::infrastructure::database::connection;
use nlprs::infrastructure::nlp::ultrasafe_client::UltraSafeClient;
use nlprs::infrastructure::repositories::batch_job_repo_impl::BatchJobRepositoryImpl;
use nlprs::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use nlprs::infrastructure::repositories::webhook_event_repo_impl::WebhookEventRepoImpl;
use nlprs::infrastructure::repositories::webhook_repo_impl::WebhookRepositoryImpl;
use nlprs::presentation::middleware::auth_middleware::AuthState;
use nlprs::presentation::middleware::rate_limit_middleware::RateLimiter;
use nlprs::presentation::routes;
use nlprs::queue::task_queue::PostgresTaskQueue;
use nlprs::workers::manager::WorkerManager;
use nlprs::workers::reaper_worker::ReaperWorker;
use nlprs::workers::webhook_worker::WebhookWorker;
use nlprs::workers::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use migration::{Migrator, MigratorTrait};
use nlprs::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting nlprs...");

    // Initialize Prometheus Metrics
    nlprs::infrastructure::metrics::init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Initialize Redis Client
    let redis_client = RedisClient::new(&settings.redis.url).await?;
    info!("Redis client initialized");

    // 5. Initialize Rate Limiter
    let rate_limiter = Arc::new(RateLimiter::new(
        redis_client.clone(),
        settings.rate_limiting.default_rpm,
    ));
    info!("Rate limiter initialized");

    // 6. Initialize Components
    let task_repo = Arc::new(TaskRepositoryImpl::new(db.clone()));
    let batch_repo = Arc::new(BatchJobRepositoryImpl::new(db.clone()));
    let webhook_repo = Arc::new(WebhookRepositoryImpl::new(db.clone()));
    let event_repo = Arc::new(WebhookEventRepoImpl::new(db.clone()));
    let queue = Arc::new(PostgresTaskQueue::new(task_repo.clone()));

    let cache = ResponseCache::new(redis_client.clone(), &settings.cache);
    let nlp_service: Arc<dyn NlpService> = Arc::new(UltraSafeClient::new(&settings.ultrasafe)?);
    let notifications = Arc::new(NotificationService::new(
        webhook_repo.clone(),
        event_repo.clone(),
        settings.webhook.max_retries,
    ));

    let submit_task_use_case = Arc::new(SubmitTaskUseCase::new(
        task_repo.clone(),
        cache.clone(),
        notifications.clone(),
    ));
    let submit_batch_use_case = Arc::new(SubmitBatchUseCase::new(
        task_repo.clone(),
        batch_repo.clone(),
    ));

    // 7. Start Workers
    let mut worker_manager = WorkerManager::new(
        queue.clone(),
        task_repo.clone(),
        batch_repo.clone(),
        notifications.clone(),
        nlp_service.clone(),
        cache.clone(),
    );
    worker_manager.start_workers(settings.workers.count).await;
    info!("Started {} NLP workers", settings.workers.count);

    let webhook_worker = WebhookWorker::new(
        event_repo.clone(),
        webhook_repo.clone(),
        settings.webhook.secret.clone(),
        settings.webhook.max_failures,
        Duration::from_secs(settings.webhook.timeout),
    );
    tokio::spawn(async move {
        webhook_worker.run().await;
    });

    let reaper = ReaperWorker::new(task_repo.clone());
    tokio::spawn(async move {
        if let Err(e) = reaper.run().await {
            error!("Reaper worker exited: {}", e);
        }
    });

    // 8. Setup Auth State
    let auth_state = AuthState { db: db.clone() };

    // 9. Start HTTP server
    let app = routes::routes(auth_state, settings.rate_limiting.enabled)
        .layer(Extension(rate_limiter))
        .layer(Extension(task_repo))
        .layer(Extension(batch_repo))
        .layer(Extension(webhook_repo))
        .layer(Extension(event_repo))
        .layer(Extension(submit_task_use_case))
        .layer(Extension(submit_batch_use_case))
        .layer(Extension(settings.clone()))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    tokio::select! {
        res = axum::serve(listener, app) => {
            res?;
        }
        _ = worker_manager.wait_for_shutdown() => {}
    }

    Ok(())
}
