//! 条件操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 无法识别的操作符反序列化为 `Unknown`，评估结果恒为 false。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // 字符串比较（trim + 小写后比较）
    Equals,
    NotEquals,

    // 数值比较
    GreaterThan,
    LessThan,

    // 数组包含检查
    Contains,
    NotContains,

    // NPS 分组
    NpsIsPromoter,
    NpsIsPassive,
    NpsIsDetractor,

    // NPS 分值比较
    NpsGte,
    NpsLte,
    NpsBetween,

    #[serde(other)]
    Unknown,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::NpsIsPromoter => "nps_is_promoter",
            Self::NpsIsPassive => "nps_is_passive",
            Self::NpsIsDetractor => "nps_is_detractor",
            Self::NpsGte => "nps_gte",
            Self::NpsLte => "nps_lte",
            Self::NpsBetween => "nps_between",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// 条件组合逻辑
///
/// 挂在每个条件上，决定该条件与之前累积结果的组合方式。
/// 缺省或无法识别的值按 AND 处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionLogic {
    #[serde(alias = "or")]
    Or,
    #[default]
    #[serde(other)]
    And,
}

impl ConditionLogic {
    /// 将当前条件结果与累积结果组合
    pub fn combine(self, acc: bool, current: bool) -> bool {
        match self {
            Self::And => acc && current,
            Self::Or => acc || current,
        }
    }
}

impl fmt::Display for ConditionLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}
