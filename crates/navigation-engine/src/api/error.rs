//! HTTP 接口错误类型

use crate::error::NavigationError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("问卷未找到: {0}")]
    SurveyNotFound(String),

    #[error("问卷定义无效: {0}")]
    InvalidDefinition(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::SurveyNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidDefinition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::SurveyNotFound(_) => "SURVEY_NOT_FOUND",
            Self::InvalidDefinition(_) => "INVALID_DEFINITION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<NavigationError> for ApiError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::SurveyNotFound(id) => Self::SurveyNotFound(id),
            NavigationError::InvalidDefinition(msg) => Self::InvalidDefinition(msg),
            NavigationError::JsonError(e) => Self::InvalidDefinition(e.to_string()),
            NavigationError::ParseError(_) | NavigationError::TypeMismatch { .. } => {
                Self::Validation(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// 请求体解析失败
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
