//! HTTP 接口
//!
//! 对外暴露问卷定义管理与导航决策的 REST API，响应统一使用
//! `{success, code, message, data}` 包装。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
