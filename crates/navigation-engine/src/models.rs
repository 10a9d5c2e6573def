//! 导航引擎领域模型

use crate::operators::{ConditionLogic, Operator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn default_priority() -> i32 {
    1
}

fn default_enabled() -> bool {
    true
}

/// 宽松反序列化：字段类型不符时取缺省值，不让单个字段拖垮整条规则
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// 非整数（含 null）按缺省优先级处理
    pub fn priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or_else(super::default_priority))
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// 只接受字符串数组，其他形态视为缺失
    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(None);
        };

        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }
}

/// 导航规则
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    /// 为空表示全局规则，否则只在该区块内生效
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    /// 越小越先评估
    #[serde(
        default = "default_priority",
        deserialize_with = "lenient::priority"
    )]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_id: None,
            priority: default_priority(),
            enabled: true,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn in_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// 规则是否适用于当前区块
    pub fn applies_to(&self, current_block_id: &str) -> bool {
        self.block_id
            .as_deref()
            .is_none_or(|block_id| block_id == current_block_id)
    }
}

/// 原子条件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub question_id: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_logic: Option<ConditionLogic>,
}

impl Condition {
    pub fn new(question_id: impl Into<String>, operator: Operator) -> Self {
        Self {
            question_id: question_id.into(),
            operator,
            value: None,
            min: None,
            max: None,
            condition_logic: None,
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn range(mut self, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        self.min = Some(min.into());
        self.max = Some(max.into());
        self
    }

    pub fn or(mut self) -> Self {
        self.condition_logic = Some(ConditionLogic::Or);
        self
    }

    pub fn and(mut self) -> Self {
        self.condition_logic = Some(ConditionLogic::And);
        self
    }

    /// 与累积结果的组合方式，缺省为 AND
    pub fn logic(&self) -> ConditionLogic {
        self.condition_logic.unwrap_or_default()
    }
}

/// 导航动作
///
/// 载荷字段在类型层面均为可选，缺少必需字段的动作视为不生效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ShowMessage {
        #[serde(
            default,
            deserialize_with = "lenient::string",
            skip_serializing_if = "Option::is_none"
        )]
        message: Option<String>,
    },
    End,
    #[serde(rename_all = "camelCase")]
    GotoBlock {
        #[serde(default, deserialize_with = "lenient::string")]
        block_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SkipBlock {
        #[serde(default, deserialize_with = "lenient::string_list")]
        block_ids: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    GotoQuestion {
        #[serde(default, deserialize_with = "lenient::string")]
        question_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SkipQuestions {
        #[serde(default, deserialize_with = "lenient::string_list")]
        question_ids: Option<Vec<String>>,
    },
    #[serde(rename_all = "camelCase")]
    GotoBlockQuestion {
        #[serde(default, deserialize_with = "lenient::string")]
        target_block_id: Option<String>,
        #[serde(default, deserialize_with = "lenient::string")]
        target_question_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn message(message: impl Into<String>) -> Self {
        Self::ShowMessage {
            message: Some(message.into()),
        }
    }

    pub fn goto_block(block_id: impl Into<String>) -> Self {
        Self::GotoBlock {
            block_id: Some(block_id.into()),
        }
    }

    pub fn goto_question(question_id: impl Into<String>) -> Self {
        Self::GotoQuestion {
            question_id: Some(question_id.into()),
        }
    }

    pub fn skip_blocks<I, S>(block_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SkipBlock {
            block_ids: Some(block_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn skip_questions<I, S>(question_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SkipQuestions {
            question_ids: Some(question_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn goto_block_question(
        block_id: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        Self::GotoBlockQuestion {
            target_block_id: Some(block_id.into()),
            target_question_id: Some(question_id.into()),
        }
    }

    /// 跳到目标区块的第一个问题
    pub fn goto_block_start(block_id: impl Into<String>) -> Self {
        Self::GotoBlockQuestion {
            target_block_id: Some(block_id.into()),
            target_question_id: None,
        }
    }

    /// 是否缺少产生决策所需的目标；空串等同缺失
    pub fn missing_target(&self) -> bool {
        fn blank(id: &Option<String>) -> bool {
            id.as_deref().is_none_or(str::is_empty)
        }

        match self {
            Self::GotoBlock { block_id } => blank(block_id),
            Self::GotoQuestion { question_id } => blank(question_id),
            Self::GotoBlockQuestion {
                target_block_id, ..
            } => blank(target_block_id),
            Self::SkipBlock { block_ids } => block_ids.is_none(),
            Self::SkipQuestions { question_ids } => question_ids.is_none(),
            Self::ShowMessage { .. } | Self::End | Self::Unknown => false,
        }
    }

    /// 动作类型名（用于日志与追踪）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShowMessage { .. } => "show_message",
            Self::End => "end",
            Self::GotoBlock { .. } => "goto_block",
            Self::SkipBlock { .. } => "skip_block",
            Self::GotoQuestion { .. } => "goto_question",
            Self::SkipQuestions { .. } => "skip_questions",
            Self::GotoBlockQuestion { .. } => "goto_block_question",
            Self::Unknown => "unknown",
        }
    }
}

/// 答题快照 - 每次调用时由答题运行时提供
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers {
    data: HashMap<String, Value>,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with(mut self, question_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(question_id.into(), value.into());
        self
    }

    pub fn insert(&mut self, question_id: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&Value> {
        self.data.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Answers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 问卷结构：区块顺序以及每个区块内的问题顺序
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStructure {
    #[serde(default)]
    pub block_order: Vec<String>,
    #[serde(default)]
    pub questions_by_block: HashMap<String, Vec<String>>,
}

impl SurveyStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个区块及其问题
    pub fn block<I, S>(mut self, block_id: impl Into<String>, questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let block_id = block_id.into();
        self.questions_by_block.insert(
            block_id.clone(),
            questions.into_iter().map(Into::into).collect(),
        );
        self.block_order.push(block_id);
        self
    }

    /// 区块内的问题顺序，未知区块返回空切片
    pub fn questions(&self, block_id: &str) -> &[String] {
        self.questions_by_block
            .get(block_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn first_question(&self, block_id: &str) -> Option<&str> {
        self.questions(block_id).first().map(String::as_str)
    }

    /// 区块顺序中当前区块之后的所有区块；当前区块未知时为空
    pub fn blocks_after(&self, block_id: &str) -> &[String] {
        successors(&self.block_order, block_id)
    }

    /// 区块内当前问题之后的所有问题；当前问题未知时为空
    pub fn questions_after(&self, block_id: &str, question_id: &str) -> &[String] {
        successors(self.questions(block_id), question_id)
    }
}

fn successors<'a>(order: &'a [String], current: &str) -> &'a [String] {
    order
        .iter()
        .position(|id| id == current)
        .map(|idx| &order[idx + 1..])
        .unwrap_or(&[])
}

/// 问卷定义（规则 + 结构）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDefinition {
    /// 通过 HTTP 加载时可省略，取路径中的 id
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub structure: SurveyStructure,
}

/// 导航结果
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationOutcome {
    End,
    #[serde(rename_all = "camelCase")]
    Block { block_id: String },
    #[serde(rename_all = "camelCase")]
    Question {
        block_id: String,
        question_id: String,
    },
}

impl NavigationOutcome {
    pub fn block(block_id: impl Into<String>) -> Self {
        Self::Block {
            block_id: block_id.into(),
        }
    }

    pub fn question(block_id: impl Into<String>, question_id: impl Into<String>) -> Self {
        Self::Question {
            block_id: block_id.into(),
            question_id: question_id.into(),
        }
    }

    /// 区块粒度视图：问题结果收敛为其所在区块
    pub fn to_block_level(self) -> Self {
        match self {
            Self::Question { block_id, .. } => Self::Block { block_id },
            other => other,
        }
    }
}

/// 导航上下文 - 当前位置与问卷结构的只读视图
#[derive(Debug, Clone, Copy)]
pub struct NavigationContext<'a> {
    pub current_block_id: &'a str,
    pub current_question_id: &'a str,
    pub structure: &'a SurveyStructure,
}

impl<'a> NavigationContext<'a> {
    pub fn new(
        structure: &'a SurveyStructure,
        current_block_id: &'a str,
        current_question_id: &'a str,
    ) -> Self {
        Self {
            current_block_id,
            current_question_id,
            structure,
        }
    }

    /// 当前区块之后的下一个区块
    pub fn next_block(&self) -> Option<&'a str> {
        self.structure
            .blocks_after(self.current_block_id)
            .first()
            .map(String::as_str)
    }
}

/// 决策来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Rule,
    Default,
}

/// 带追踪信息的导航决策
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDecision {
    pub outcome: NavigationOutcome,
    pub source: DecisionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

impl NavigationDecision {
    pub fn new(outcome: NavigationOutcome, source: DecisionSource) -> Self {
        Self {
            outcome,
            source,
            rule_id: None,
            messages: Vec::new(),
            evaluation_trace: Vec::new(),
        }
    }
}
