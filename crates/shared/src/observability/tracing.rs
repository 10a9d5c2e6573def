//! 日志初始化模块
//!
//! 基于 tracing-subscriber 构建日志输出，支持 pretty 与 json 两种格式。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 构建环境过滤器：优先使用 RUST_LOG，其次使用配置的日志级别
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化 tracing（日志）
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let fmt_layer = if config.log_format.eq_ignore_ascii_case("json") {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_log_level_falls_back() {
        let config = ObservabilityConfig {
            log_level: "not a [valid] directive".to_string(),
            ..Default::default()
        };
        // 无效级别不应 panic
        let _ = env_filter(&config);
    }

    #[test]
    fn test_init_twice_returns_error() {
        let config = ObservabilityConfig::default();
        let _ = init(&config);

        // 全局 subscriber 只能设置一次
        assert!(init(&config).is_err());
    }
}
