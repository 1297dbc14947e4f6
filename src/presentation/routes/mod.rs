// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::batch_job_repo_impl::BatchJobRepositoryImpl;
use crate::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use crate::infrastructure::repositories::webhook_event_repo_impl::WebhookEventRepoImpl;
use crate::infrastructure::repositories::webhook_repo_impl::WebhookRepositoryImpl;
use crate::presentation::handlers::{batch_handler, nlp_handler, webhook_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use crate::presentation::middleware::distributed_rate_limit_middleware::distributed_rate_limit_middleware;
use axum::{
    routing::{delete, get, post},
    Router,
};

/// 创建应用路由
///
/// 认证和速率限制中间件仅套在受保护路由上，
/// 健康检查和版本端点保持公开
///
/// # 参数
///
/// * `auth_state` - 认证中间件状态
/// * `rate_limiting_enabled` - 是否启用速率限制
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(auth_state: AuthState, rate_limiting_enabled: bool) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let protected_routes = Router::new()
        .route(
            "/v1/nlp/classify",
            post(
                nlp_handler::classify::<
                    TaskRepositoryImpl,
                    WebhookRepositoryImpl,
                    WebhookEventRepoImpl,
                >,
            ),
        )
        .route(
            "/v1/nlp/extract-entities",
            post(
                nlp_handler::extract_entities::<
                    TaskRepositoryImpl,
                    WebhookRepositoryImpl,
                    WebhookEventRepoImpl,
                >,
            ),
        )
        .route(
            "/v1/nlp/summarize",
            post(
                nlp_handler::summarize::<
                    TaskRepositoryImpl,
                    WebhookRepositoryImpl,
                    WebhookEventRepoImpl,
                >,
            ),
        )
        .route(
            "/v1/nlp/analyze-sentiment",
            post(
                nlp_handler::analyze_sentiment::<
                    TaskRepositoryImpl,
                    WebhookRepositoryImpl,
                    WebhookEventRepoImpl,
                >,
            ),
        )
        .route(
            "/v1/nlp/task/{id}",
            get(nlp_handler::get_task::<TaskRepositoryImpl>),
        )
        .route(
            "/v1/batch/submit",
            post(batch_handler::submit_batch::<TaskRepositoryImpl, BatchJobRepositoryImpl>),
        )
        .route(
            "/v1/batch/{id}/status",
            get(batch_handler::get_batch_status::<BatchJobRepositoryImpl>),
        )
        .route(
            "/v1/batch/{id}/results",
            get(batch_handler::get_batch_results::<BatchJobRepositoryImpl>),
        )
        .route(
            "/v1/batch/{id}",
            delete(batch_handler::cancel_batch::<TaskRepositoryImpl, BatchJobRepositoryImpl>),
        )
        .route(
            "/v1/webhooks",
            post(webhook_handler::create_webhook::<WebhookRepositoryImpl>)
                .get(webhook_handler::list_webhooks::<WebhookRepositoryImpl>),
        )
        .route(
            "/v1/webhooks/{id}",
            delete(webhook_handler::delete_webhook::<WebhookRepositoryImpl>),
        )
        .route(
            "/v1/webhooks/{id}/test",
            post(webhook_handler::test_webhook::<WebhookRepositoryImpl, WebhookEventRepoImpl>),
        );

    let protected_routes = if rate_limiting_enabled {
        protected_routes.layer(axum::middleware::from_fn(distributed_rate_limit_middleware))
    } else {
        protected_routes
    };

    let protected_routes = protected_routes.layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
