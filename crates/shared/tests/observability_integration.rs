//! 可观测性与配置集成测试

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use survey_shared::observability::metrics::{
        record_http_request, record_navigation_decision, set_survey_definitions_loaded,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/health", 200, 0.0005);
        record_http_request("PUT", "/api/surveys/{id}", 200, 0.004);
        record_http_request("POST", "/api/surveys/{id}/next", 200, 0.001);
        record_http_request("POST", "/api/surveys/{id}/next", 404, 0.0002);
        record_http_request("POST", "/api/navigate", 422, 0.0003);
    }

    #[test]
    fn test_record_navigation_decision() {
        record_navigation_decision("rule", "block", 0.0001);
        record_navigation_decision("rule", "question", 0.0001);
        record_navigation_decision("rule", "end", 0.00005);
        record_navigation_decision("default", "question", 0.00002);
        record_navigation_decision("default", "end", 0.00002);
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        // 空字符串
        record_http_request("", "", 0, 0.0);

        // 超长路径
        let long_path = "/api/surveys/".to_string() + &"x".repeat(1000);
        record_http_request("POST", &long_path, 200, 0.01);

        // 极端持续时间
        record_navigation_decision("rule", "end", 999.99);
        record_navigation_decision("default", "block", 0.000001);

        set_survey_definitions_loaded(0);
        set_survey_definitions_loaded(10_000);
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use survey_shared::config::{AppConfig, ObservabilityConfig};

    #[test]
    fn test_observability_defaults() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, "pretty");
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = ::config::Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("navigation.trace_enabled", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.navigation.trace_enabled);
        assert_eq!(config.navigation.definitions_dir.as_deref(), Some("surveys"));
        assert_eq!(config.service_name, "survey-navigation");
    }
}
