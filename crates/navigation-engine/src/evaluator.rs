//! 条件评估器
//!
//! 实现各操作符的评估逻辑。对外的 `evaluate` 永不报错：
//! 无法解析的数据、未知操作符一律评估为 false，保证答题过程不被错误的规则配置中断。

use crate::error::{NavigationError, Result};
use crate::models::{Answers, Condition};
use crate::operators::Operator;
use serde_json::Value;
use tracing::debug;

/// 可插拔的条件评估接口
///
/// 扫描器以规则为单位捕获 `Err`，记录告警后将该规则视为未匹配。
pub trait Evaluate {
    fn try_evaluate(&self, condition: &Condition, answers: &Answers) -> Result<bool>;
}

/// 内置条件评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl Evaluate for ConditionEvaluator {
    fn try_evaluate(&self, condition: &Condition, answers: &Answers) -> Result<bool> {
        Ok(Self::evaluate(condition, answers))
    }
}

impl<E: Evaluate + ?Sized> Evaluate for &E {
    fn try_evaluate(&self, condition: &Condition, answers: &Answers) -> Result<bool> {
        (**self).try_evaluate(condition, answers)
    }
}

impl ConditionEvaluator {
    /// 评估条件，任何解析失败都返回 false
    pub fn evaluate(condition: &Condition, answers: &Answers) -> bool {
        let answer = answers.get(&condition.question_id);

        match Self::check(answer, condition) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(
                    question_id = %condition.question_id,
                    operator = %condition.operator,
                    error = %e,
                    "条件无法评估，按 false 处理"
                );
                false
            }
        }
    }

    /// 严格评估：类型不匹配或解析失败时返回具体错误
    ///
    /// # Arguments
    /// * `answer` - 答题快照中的答案，未作答时为 None
    /// * `condition` - 条件定义
    pub fn check(answer: Option<&Value>, condition: &Condition) -> Result<bool> {
        let answer = answer.unwrap_or(&Value::Null);
        let expected = condition.value.as_ref().unwrap_or(&Value::Null);

        match condition.operator {
            Operator::Equals => Ok(Self::eq(answer, expected)),
            Operator::NotEquals => Ok(!Self::eq(answer, expected)),
            Operator::GreaterThan => Self::compare(answer, expected, |a, b| a > b),
            Operator::LessThan => Self::compare(answer, expected, |a, b| a < b),
            Operator::Contains => Self::contains(answer, expected),
            Operator::NotContains => Self::contains(answer, expected).map(|r| !r),
            Operator::NpsIsPromoter => Self::nps_score(answer).map(|s| (9.0..=10.0).contains(&s)),
            Operator::NpsIsPassive => Self::nps_score(answer).map(|s| (7.0..9.0).contains(&s)),
            Operator::NpsIsDetractor => Self::nps_score(answer).map(|s| (0.0..7.0).contains(&s)),
            Operator::NpsGte => Self::compare(answer, expected, |a, b| a >= b),
            Operator::NpsLte => Self::compare(answer, expected, |a, b| a <= b),
            Operator::NpsBetween => Self::nps_between(answer, condition),
            Operator::Unknown => Err(NavigationError::ParseError(format!(
                "问题 '{}' 的条件使用了不支持的操作符",
                condition.question_id
            ))),
        }
    }

    /// 字符串相等比较（trim + 小写）
    fn eq(answer: &Value, expected: &Value) -> bool {
        Self::normalize(answer) == Self::normalize(expected)
    }

    /// 数值比较
    fn compare<F>(answer: &Value, expected: &Value, cmp: F) -> Result<bool>
    where
        F: Fn(f64, f64) -> bool,
    {
        let answer_num = Self::as_f64(answer)?;
        let expected_num = Self::as_f64(expected)?;

        Ok(cmp(answer_num, expected_num))
    }

    /// 数组包含检查，答案必须是数组
    fn contains(answer: &Value, expected: &Value) -> Result<bool> {
        let items = answer.as_array().ok_or_else(|| NavigationError::TypeMismatch {
            expected: "array".to_string(),
            actual: Self::type_name(answer).to_string(),
        })?;

        Ok(items.iter().any(|item| Self::same_item(item, expected)))
    }

    /// 数组元素比较：数值按浮点比较，其余按 JSON 相等
    fn same_item(item: &Value, expected: &Value) -> bool {
        match (item, expected) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            _ => item == expected,
        }
    }

    /// NPS 分值（0-10，不强制校验范围）
    fn nps_score(answer: &Value) -> Result<f64> {
        Self::as_f64(answer)
    }

    /// 分值区间检查，min/max 顺序颠倒时自动交换
    fn nps_between(answer: &Value, condition: &Condition) -> Result<bool> {
        let score = Self::nps_score(answer)?;

        let min = Self::as_f64(condition.min.as_ref().unwrap_or(&Value::Null))?;
        let max = Self::as_f64(condition.max.as_ref().unwrap_or(&Value::Null))?;
        let (low, high) = if min <= max { (min, max) } else { (max, min) };

        Ok(score >= low && score <= high)
    }

    /// 归一化为比较用字符串：null 为空串，数组以逗号拼接
    fn normalize(value: &Value) -> String {
        Self::stringify(value).trim().to_lowercase()
    }

    fn stringify(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => Self::stringify_number(n),
            Value::Array(items) => items
                .iter()
                .map(Self::stringify)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => value.to_string(),
        }
    }

    /// 没有小数部分的浮点数按整数输出，5.0 与 "5" 相等
    fn stringify_number(n: &serde_json::Number) -> String {
        match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        }
    }

    /// 尝试将 Value 转换为有限的 f64
    fn as_f64(value: &Value) -> Result<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed {
            Some(n) if n.is_finite() => Ok(n),
            _ => Err(NavigationError::TypeMismatch {
                expected: "finite number".to_string(),
                actual: Self::type_name(value).to_string(),
            }),
        }
    }

    /// 获取值的类型名称
    fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}
