//! API 处理器
//!
//! 问卷定义管理（加载、查询、删除）与导航决策。

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use survey_shared::observability::metrics;
use tracing::{debug, instrument};

use crate::api::dto::{
    ApiResponse, HealthResponse, InlineNavigateRequest, LoadSurveyResponse, NextBlockRequest,
    NextTargetRequest, SurveyDetailDto, SurveySummaryDto,
};
use crate::api::error::{ApiError, Result};
use crate::api::state::AppState;
use crate::compiler::{CompiledSurvey, SurveyCompiler};
use crate::models::{
    DecisionSource, NavigationContext, NavigationDecision, NavigationOutcome, SurveyDefinition,
};
use std::sync::Arc;

/// 健康检查
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        surveys: state.store.len(),
    }))
}

/// 获取已加载问卷列表
///
/// GET /api/surveys
pub async fn list_surveys(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<SurveySummaryDto>>> {
    let items = state
        .store
        .list_ids()
        .iter()
        .filter_map(|id| state.store.get(id))
        .map(|survey| SurveySummaryDto::from(survey.as_ref()))
        .collect();

    Json(ApiResponse::success(items))
}

/// 获取问卷定义详情
///
/// GET /api/surveys/{id}
pub async fn get_survey(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<ApiResponse<SurveyDetailDto>>> {
    let survey = find_survey(&state, &survey_id)?;
    Ok(Json(ApiResponse::success(SurveyDetailDto::from(
        survey.as_ref(),
    ))))
}

/// 加载或替换问卷定义
///
/// PUT /api/surveys/{id}
///
/// 请求体中的 id 可省略，省略时取路径中的 id；两者不一致视为参数错误。
/// 规则配置问题不会拒绝加载，以告警列表返回。
#[instrument(skip_all, fields(survey_id = %survey_id))]
pub async fn put_survey(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    payload: std::result::Result<Json<SurveyDefinition>, JsonRejection>,
) -> Result<Json<ApiResponse<LoadSurveyResponse>>> {
    let Json(mut definition) = payload?;

    if definition.id.is_empty() {
        definition.id = survey_id.clone();
    } else if definition.id != survey_id {
        return Err(ApiError::Validation(format!(
            "路径中的问卷 ID '{}' 与请求体中的 '{}' 不一致",
            survey_id, definition.id
        )));
    }

    let compiled = state.store.load(definition)?;
    metrics::set_survey_definitions_loaded(state.store.len());

    Ok(Json(ApiResponse::success(LoadSurveyResponse::from(
        compiled.as_ref(),
    ))))
}

/// 删除问卷定义
///
/// DELETE /api/surveys/{id}
#[instrument(skip_all, fields(survey_id = %survey_id))]
pub async fn delete_survey(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.store.delete(&survey_id)?;
    metrics::set_survey_definitions_loaded(state.store.len());

    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 问题粒度导航
///
/// POST /api/surveys/{id}/next
pub async fn next_target(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    payload: std::result::Result<Json<NextTargetRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NavigationDecision>>> {
    let Json(req) = payload?;
    let survey = find_survey(&state, &survey_id)?;

    let start = Instant::now();
    let ctx = NavigationContext::new(
        &survey.definition.structure,
        &req.current_block_id,
        &req.current_question_id,
    );
    let decision = state.engine.decide(survey.rules(), &req.answers, &ctx);
    record_decision(&decision, start);

    Ok(Json(ApiResponse::success(decision)))
}

/// 区块粒度导航
///
/// POST /api/surveys/{id}/next-block
pub async fn next_block(
    State(state): State<AppState>,
    Path(survey_id): Path<String>,
    payload: std::result::Result<Json<NextBlockRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NavigationOutcome>>> {
    let Json(req) = payload?;
    let survey = find_survey(&state, &survey_id)?;

    let start = Instant::now();
    let ctx = NavigationContext::new(&survey.definition.structure, &req.current_block_id, "");
    let decision = state
        .engine
        .decide_block(survey.rules(), &req.answers, &ctx);
    record_decision(&decision, start);

    Ok(Json(ApiResponse::success(decision.outcome)))
}

/// 无状态导航，问卷定义随请求内联，不读写存储
///
/// POST /api/navigate
pub async fn navigate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InlineNavigateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NavigationDecision>>> {
    let Json(req) = payload?;

    // 与加载接口同样校验结构，但不缓存编译结果
    let compiled = SurveyCompiler::new().compile(req.definition)?;

    let start = Instant::now();
    let structure = &compiled.definition.structure;
    let decision = match req.current_question_id.as_deref() {
        Some(question_id) => {
            let ctx = NavigationContext::new(structure, &req.current_block_id, question_id);
            state.engine.decide(compiled.rules(), &req.answers, &ctx)
        }
        None => {
            let ctx = NavigationContext::new(structure, &req.current_block_id, "");
            state
                .engine
                .decide_block(compiled.rules(), &req.answers, &ctx)
        }
    };
    record_decision(&decision, start);

    debug!(
        survey_id = %compiled.id(),
        rule_id = ?decision.rule_id,
        "内联问卷导航完成"
    );

    Ok(Json(ApiResponse::success(decision)))
}

fn find_survey(state: &AppState, survey_id: &str) -> Result<Arc<CompiledSurvey>> {
    state
        .store
        .get(survey_id)
        .ok_or_else(|| ApiError::SurveyNotFound(survey_id.to_string()))
}

fn record_decision(decision: &NavigationDecision, start: Instant) {
    let source = match decision.source {
        DecisionSource::Rule => "rule",
        DecisionSource::Default => "default",
    };
    let outcome = match decision.outcome {
        NavigationOutcome::End => "end",
        NavigationOutcome::Block { .. } => "block",
        NavigationOutcome::Question { .. } => "question",
    };

    metrics::record_navigation_decision(source, outcome, start.elapsed().as_secs_f64());
}
