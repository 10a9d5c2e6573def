//! 导航引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("解析失败: {0}")]
    ParseError(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("条件评估失败: {0}")]
    EvaluationError(String),

    #[error("问卷定义无效: {0}")]
    InvalidDefinition(String),

    #[error("问卷未找到: {0}")]
    SurveyNotFound(String),

    #[error("文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NavigationError>;
