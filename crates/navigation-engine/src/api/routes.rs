//! 路由配置模块

use axum::{
    Router, middleware,
    routing::{get, post},
};
use survey_shared::observability::middleware::http_tracing;

use crate::api::{handlers, state::AppState};

/// 问卷定义管理路由
fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys", get(handlers::list_surveys))
        .route(
            "/surveys/{id}",
            get(handlers::get_survey)
                .put(handlers::put_survey)
                .delete(handlers::delete_survey),
        )
}

/// 导航决策路由
fn navigation_routes() -> Router<AppState> {
    Router::new()
        .route("/surveys/{id}/next", post(handlers::next_target))
        .route("/surveys/{id}/next-block", post(handlers::next_block))
        .route("/navigate", post(handlers::navigate))
}

/// 构建完整的应用路由
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(survey_routes())
        .merge(navigation_routes());

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(middleware::from_fn(http_tracing))
        .with_state(state)
}
