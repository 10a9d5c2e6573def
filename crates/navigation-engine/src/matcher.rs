//! 规则匹配器
//!
//! 将规则的有序条件按从左到右的折叠方式合并为单一结论。
//! 组合逻辑挂在每个条件上（第二个条件起生效），没有括号与优先级：
//! `[c0, c1 OR, c2 AND]` 计算为 `(c0 || c1) && c2`。

use crate::error::Result;
use crate::evaluator::{ConditionEvaluator, Evaluate};
use crate::models::{Answers, Rule};

/// 规则匹配器
pub struct RuleMatcher;

impl RuleMatcher {
    /// 使用内置评估器判断规则是否匹配
    pub fn matches(rule: &Rule, answers: &Answers) -> bool {
        // 内置评估器不会返回错误
        Self::try_matches(rule, answers, &ConditionEvaluator).unwrap_or(false)
    }

    /// 使用指定评估器判断规则是否匹配，评估器错误向上传播
    pub fn try_matches<E>(rule: &Rule, answers: &Answers, evaluator: &E) -> Result<bool>
    where
        E: Evaluate + ?Sized,
    {
        Self::fold(rule, answers, evaluator, None)
    }

    /// 左折叠求值，可选记录逐条追踪
    pub(crate) fn fold<E>(
        rule: &Rule,
        answers: &Answers,
        evaluator: &E,
        mut trace: Option<&mut Vec<String>>,
    ) -> Result<bool>
    where
        E: Evaluate + ?Sized,
    {
        let mut conditions = rule.conditions.iter().enumerate();

        // 空条件列表永不匹配
        let Some((_, first)) = conditions.next() else {
            if let Some(trace) = trace.as_deref_mut() {
                trace.push(format!("rule[{}]: 无条件 => NOT_MATCHED", rule.id));
            }
            return Ok(false);
        };

        let mut acc = evaluator.try_evaluate(first, answers)?;
        if let Some(trace) = trace.as_deref_mut() {
            trace.push(format!(
                "rule[{}].conditions[0]: {} {} => {}",
                rule.id,
                first.question_id,
                first.operator,
                verdict(acc)
            ));
        }

        for (i, condition) in conditions {
            let current = evaluator.try_evaluate(condition, answers)?;
            let logic = condition.logic();
            acc = logic.combine(acc, current);

            if let Some(trace) = trace.as_deref_mut() {
                trace.push(format!(
                    "rule[{}].conditions[{}]: {} {} {} => {} (累积 {})",
                    rule.id,
                    i,
                    logic,
                    condition.question_id,
                    condition.operator,
                    verdict(current),
                    verdict(acc)
                ));
            }
        }

        Ok(acc)
    }
}

fn verdict(matched: bool) -> &'static str {
    if matched { "MATCHED" } else { "NOT_MATCHED" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;
    use crate::operators::Operator;

    fn answers() -> Answers {
        Answers::new().with("t", "yes").with("f", "no")
    }

    fn truthy() -> Condition {
        Condition::new("t", Operator::Equals).value("yes")
    }

    fn falsy() -> Condition {
        Condition::new("f", Operator::Equals).value("yes")
    }

    #[test]
    fn test_empty_conditions_never_match() {
        assert!(!RuleMatcher::matches(&Rule::new("r"), &answers()));
    }

    #[test]
    fn test_single_condition() {
        assert!(RuleMatcher::matches(&Rule::new("r").when(truthy()), &answers()));
        assert!(!RuleMatcher::matches(&Rule::new("r").when(falsy()), &answers()));
    }

    #[test]
    fn test_left_fold_or_then_and() {
        // acc = true; true OR false = true; true AND false = false
        let rule = Rule::new("r")
            .when(truthy())
            .when(falsy().or())
            .when(falsy().and());

        assert!(!RuleMatcher::matches(&rule, &answers()));
    }

    #[test]
    fn test_left_fold_and_then_or() {
        // acc = false; false AND false = false; false OR true = true
        let rule = Rule::new("r")
            .when(falsy())
            .when(falsy())
            .when(truthy().or());

        assert!(RuleMatcher::matches(&rule, &answers()));
    }

    #[test]
    fn test_no_precedence_grouping() {
        // 有优先级时 t OR (f AND f) = true；左折叠为 (t OR f) AND f = false
        let rule = Rule::new("r")
            .when(truthy())
            .when(falsy().or())
            .when(falsy());

        assert!(!RuleMatcher::matches(&rule, &answers()));
    }

    #[test]
    fn test_first_condition_logic_ignored() {
        let rule = Rule::new("r").when(truthy().or()).when(truthy());
        assert!(RuleMatcher::matches(&rule, &answers()));
    }

    #[test]
    fn test_fold_trace() {
        let rule = Rule::new("r").when(truthy()).when(falsy().or());
        let mut trace = Vec::new();
        let matched =
            RuleMatcher::fold(&rule, &answers(), &ConditionEvaluator, Some(&mut trace)).unwrap();

        assert!(matched);
        assert_eq!(trace.len(), 2);
        assert!(trace[1].contains("OR"));
    }
}
