//! 问卷导航引擎
//!
//! 根据受访者已作答的答案和作者配置的条件规则，决定下一步展示哪个区块或问题：
//! - JSON 规则定义和解析
//! - 条件评估（比较、包含、NPS 分段）与左折叠组合
//! - 按优先级扫描规则，首条匹配生效
//! - 跳转动作解析与默认顺序推进
//! - 问卷定义的编译、校验与缓存
//! - HTTP 接口

pub mod advancer;
pub mod api;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod models;
pub mod operators;
pub mod resolver;
pub mod scanner;
pub mod store;

pub use advancer::DefaultAdvancer;
pub use compiler::{CompiledSurvey, SurveyCompiler};
pub use engine::{NavigationEngine, get_next_block, get_next_target};
pub use error::{NavigationError, Result};
pub use evaluator::{ConditionEvaluator, Evaluate};
pub use matcher::RuleMatcher;
pub use models::{
    Action, Answers, Condition, DecisionSource, NavigationContext, NavigationDecision,
    NavigationOutcome, Rule, SurveyDefinition, SurveyStructure,
};
pub use operators::{ConditionLogic, Operator};
pub use resolver::{ActionResolver, Granularity};
pub use scanner::{RuleScanner, scan};
pub use store::SurveyStore;
