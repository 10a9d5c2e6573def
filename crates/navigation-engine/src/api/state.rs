//! 应用状态定义

use crate::engine::NavigationEngine;
use crate::store::SurveyStore;
use std::sync::Arc;

/// Axum 应用共享状态
///
/// 问卷定义存储内部已是 `Arc` 共享，引擎本身无状态，两者在 handler 间廉价克隆。
#[derive(Clone)]
pub struct AppState {
    pub store: SurveyStore,
    pub engine: Arc<NavigationEngine>,
}

impl AppState {
    pub fn new(store: SurveyStore, engine: NavigationEngine) -> Self {
        Self {
            store,
            engine: Arc::new(engine),
        }
    }
}
