//! 问卷导航服务
//!
//! 提供问卷定义管理与导航决策的 HTTP 接口。

use anyhow::Result;
use navigation_engine::api::{self, AppState};
use navigation_engine::{NavigationEngine, SurveyStore};
use std::time::Duration;
use survey_shared::config::AppConfig;
use survey_shared::observability::{self, metrics};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 统一加载配置：config/default.toml → config/{env}.toml → config/{service_name}.toml → NAV_ 环境变量
    let config = AppConfig::load("survey-navigation").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init(&config.service_name, &config.observability).await?;

    info!(
        environment = %config.environment,
        "Starting survey-navigation service..."
    );

    let store = SurveyStore::new();
    if let Some(dir) = &config.navigation.definitions_dir {
        match store.load_dir(dir) {
            Ok(count) => info!("Loaded {} survey definitions from {}", count, dir),
            Err(e) => warn!(
                "Failed to load survey definitions from {}: {}, starting with empty store",
                dir, e
            ),
        }
    }
    metrics::set_survey_definitions_loaded(store.len());

    let mut engine = NavigationEngine::new();
    if config.navigation.trace_enabled {
        engine = engine.with_trace();
        info!("Evaluation trace enabled");
    }

    let app = api::router(AppState::new(store, engine)).layer(TimeoutLayer::new(
        Duration::from_secs(config.server.request_timeout_seconds),
    ));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
