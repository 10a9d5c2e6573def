//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 单个请求的超时时间
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 10,
        }
    }
}

/// 导航引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// 启动时加载的问卷定义目录（*.json）
    pub definitions_dir: Option<String>,
    /// 是否在决策结果中返回评估追踪
    pub trace_enabled: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            definitions_dir: Some("surveys".to_string()),
            trace_enabled: false,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_port: 9090,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub navigation: NavigationConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "survey-navigation".to_string(),
            environment: "development".to_string(),
            server: ServerConfig::default(),
            navigation: NavigationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（NAV_ 前缀，双下划线分隔层级，如 NAV_SERVER__PORT -> server.port）
    /// 5. 服务特定端口环境变量（如 SURVEY_NAVIGATION_PORT）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(service_name, &config_dir)
    }

    /// 从指定配置目录加载，其余层级与 [`AppConfig::load`] 相同
    pub fn load_from(service_name: &str, config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("NAV_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            // 默认配置
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            // 加载默认配置文件
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            // 加载环境特定配置
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            // 加载服务特定配置
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            // 环境变量覆盖
            .add_source(
                Environment::with_prefix("NAV")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if let Some(port) = Self::get_service_port_from_env(service_name) {
            config.server.port = port;
        }

        Ok(config)
    }

    /// 服务特定端口环境变量
    ///
    /// 将 "survey-navigation" 转换为 "SURVEY_NAVIGATION_PORT"
    fn get_service_port_from_env(service_name: &str) -> Option<u16> {
        std::env::var(Self::port_env_var_name(service_name))
            .ok()
            .and_then(|v| v.parse().ok())
    }

    fn port_env_var_name(service_name: &str) -> String {
        format!("{}_PORT", service_name.to_uppercase().replace('-', "_"))
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
