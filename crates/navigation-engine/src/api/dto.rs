//! 请求与响应 DTO

use crate::compiler::CompiledSurvey;
use crate::models::{Answers, SurveyDefinition};
use serde::{Deserialize, Serialize};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty() -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 问题粒度导航请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTargetRequest {
    #[serde(default)]
    pub answers: Answers,
    pub current_block_id: String,
    pub current_question_id: String,
}

/// 区块粒度导航请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBlockRequest {
    #[serde(default)]
    pub answers: Answers,
    pub current_block_id: String,
}

/// 无状态导航请求，问卷定义随请求内联
///
/// 省略 `currentQuestionId` 时按区块粒度决策。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineNavigateRequest {
    pub definition: SurveyDefinition,
    #[serde(default)]
    pub answers: Answers,
    pub current_block_id: String,
    #[serde(default)]
    pub current_question_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub surveys: usize,
}

/// 问卷列表项
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummaryDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rules: usize,
    pub blocks: usize,
    pub compile_version: u64,
}

impl From<&CompiledSurvey> for SurveySummaryDto {
    fn from(survey: &CompiledSurvey) -> Self {
        Self {
            id: survey.id().to_string(),
            name: survey.definition.name.clone(),
            rules: survey.rules().len(),
            blocks: survey.definition.structure.block_order.len(),
            compile_version: survey.compile_version,
        }
    }
}

/// 问卷详情
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetailDto {
    pub definition: SurveyDefinition,
    pub warnings: Vec<String>,
    pub compile_version: u64,
}

impl From<&CompiledSurvey> for SurveyDetailDto {
    fn from(survey: &CompiledSurvey) -> Self {
        Self {
            definition: survey.definition.clone(),
            warnings: survey.warnings.clone(),
            compile_version: survey.compile_version,
        }
    }
}

/// 加载问卷定义的结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSurveyResponse {
    pub id: String,
    pub compile_version: u64,
    pub warnings: Vec<String>,
}

impl From<&CompiledSurvey> for LoadSurveyResponse {
    fn from(survey: &CompiledSurvey) -> Self {
        Self {
            id: survey.id().to_string(),
            compile_version: survey.compile_version,
            warnings: survey.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["code"], "SUCCESS");
        assert_eq!(json["data"], 3);

        let json = serde_json::to_value(ApiResponse::<()>::success_empty()).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_next_target_request_camel_case() {
        let req: NextTargetRequest = serde_json::from_value(json!({
            "answers": {"Q1": 9},
            "currentBlockId": "B1",
            "currentQuestionId": "Q1"
        }))
        .unwrap();

        assert_eq!(req.current_block_id, "B1");
        assert_eq!(req.answers.get("Q1"), Some(&json!(9)));
    }

    #[test]
    fn test_inline_request_question_optional() {
        let req: InlineNavigateRequest = serde_json::from_value(json!({
            "definition": {"id": "s"},
            "currentBlockId": "B1"
        }))
        .unwrap();

        assert!(req.current_question_id.is_none());
        assert!(req.answers.is_empty());
    }
}
