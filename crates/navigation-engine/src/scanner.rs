//! 规则集扫描器
//!
//! 按优先级顺序扫描当前区块可用的规则，返回第一条匹配的规则（短路，只取一条）。

use crate::evaluator::{ConditionEvaluator, Evaluate};
use crate::matcher::RuleMatcher;
use crate::models::{Answers, Rule};
use tracing::warn;

/// 使用内置评估器扫描规则集
pub fn scan<'r>(rules: &'r [Rule], answers: &Answers, current_block_id: &str) -> Option<&'r Rule> {
    RuleScanner::new(&ConditionEvaluator).scan(rules, answers, current_block_id)
}

/// 规则集扫描器
pub struct RuleScanner<'e, E: ?Sized> {
    evaluator: &'e E,
}

impl<'e, E> RuleScanner<'e, E>
where
    E: Evaluate + ?Sized,
{
    pub fn new(evaluator: &'e E) -> Self {
        Self { evaluator }
    }

    /// 返回第一条匹配的规则
    pub fn scan<'r>(
        &self,
        rules: &'r [Rule],
        answers: &Answers,
        current_block_id: &str,
    ) -> Option<&'r Rule> {
        self.scan_traced(rules, answers, current_block_id, None)
    }

    pub(crate) fn scan_traced<'r>(
        &self,
        rules: &'r [Rule],
        answers: &Answers,
        current_block_id: &str,
        mut trace: Option<&mut Vec<String>>,
    ) -> Option<&'r Rule> {
        for rule in Self::ordered(rules) {
            if !rule.applies_to(current_block_id) {
                continue;
            }

            // 单条规则评估失败不影响后续规则
            match RuleMatcher::fold(rule, answers, self.evaluator, trace.as_deref_mut()) {
                Ok(true) => return Some(rule),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        rule_id = %rule.id,
                        block_id = %current_block_id,
                        error = %e,
                        "规则评估失败，按未匹配处理"
                    );
                    if let Some(trace) = trace.as_deref_mut() {
                        trace.push(format!("rule[{}]: 评估失败 ({}) => SKIPPED", rule.id, e));
                    }
                }
            }
        }

        None
    }

    /// 过滤禁用规则并按优先级稳定排序
    fn ordered(rules: &[Rule]) -> Vec<&Rule> {
        let mut enabled: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
        enabled.sort_by_key(|r| r.priority);
        enabled
    }
}
