//! 动作解析器
//!
//! 按顺序处理匹配规则的动作列表，第一个产生决策的动作立即返回，
//! 后续动作不再处理。`show_message`、缺少载荷的动作以及未知动作不产生决策。

use crate::models::{Action, NavigationContext, NavigationOutcome, Rule};
use std::collections::HashSet;

/// 解析粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// 可跳转到具体问题
    Question,
    /// 只做区块级路由，忽略问题级动作
    Block,
}

/// 动作解析器
pub struct ActionResolver;

impl ActionResolver {
    /// 解析规则动作，没有动作产生决策时返回 None
    pub fn resolve(rule: &Rule, ctx: &NavigationContext<'_>) -> Option<NavigationOutcome> {
        Self::resolve_collecting(rule, ctx, Granularity::Question, &mut Vec::new())
    }

    /// 解析规则动作，同时收集决策前遇到的 `show_message` 文案
    pub fn resolve_collecting(
        rule: &Rule,
        ctx: &NavigationContext<'_>,
        granularity: Granularity,
        messages: &mut Vec<String>,
    ) -> Option<NavigationOutcome> {
        for action in &rule.actions {
            if let Action::ShowMessage {
                message: Some(message),
            } = action
            {
                messages.push(message.clone());
            }

            let outcome = match granularity {
                Granularity::Question => Self::resolve_action(action, ctx),
                Granularity::Block => Self::resolve_block_action(action, ctx),
            };

            if outcome.is_some() {
                return outcome;
            }
        }

        None
    }

    fn resolve_action(action: &Action, ctx: &NavigationContext<'_>) -> Option<NavigationOutcome> {
        match action {
            Action::ShowMessage { .. } | Action::Unknown => None,
            Action::End => Some(NavigationOutcome::End),
            Action::GotoBlock { block_id } => non_blank(block_id).map(NavigationOutcome::block),
            Action::GotoBlockQuestion {
                target_block_id,
                target_question_id,
            } => {
                let block_id = non_blank(target_block_id)?;
                let question_id = non_blank(target_question_id)
                    .or_else(|| ctx.structure.first_question(block_id));

                Some(match question_id {
                    Some(question_id) => NavigationOutcome::question(block_id, question_id),
                    None => NavigationOutcome::block(block_id),
                })
            }
            Action::GotoQuestion { question_id } => non_blank(question_id)
                .map(|q| NavigationOutcome::question(ctx.current_block_id, q)),
            Action::SkipBlock { block_ids } => {
                block_ids.as_deref().map(|ids| Self::skip_blocks(ids, ctx))
            }
            Action::SkipQuestions { question_ids } => question_ids
                .as_deref()
                .map(|ids| Self::skip_questions(ids, ctx)),
        }
    }

    /// 区块粒度：问题级动作不产生决策，跳转到问题收敛为跳转到其区块
    fn resolve_block_action(
        action: &Action,
        ctx: &NavigationContext<'_>,
    ) -> Option<NavigationOutcome> {
        match action {
            Action::GotoQuestion { .. } | Action::SkipQuestions { .. } => None,
            Action::GotoBlockQuestion {
                target_block_id, ..
            } => non_blank(target_block_id).map(NavigationOutcome::block),
            other => Self::resolve_action(other, ctx),
        }
    }

    /// 从当前区块之后开始，返回第一个未被跳过的区块
    fn skip_blocks(block_ids: &[String], ctx: &NavigationContext<'_>) -> NavigationOutcome {
        let skipped: HashSet<&str> = block_ids.iter().map(String::as_str).collect();

        ctx.structure
            .blocks_after(ctx.current_block_id)
            .iter()
            .find(|id| !skipped.contains(id.as_str()))
            .map(NavigationOutcome::block)
            .unwrap_or(NavigationOutcome::End)
    }

    /// 从当前问题之后开始，返回区块内第一个未被跳过的问题；
    /// 区块内没有剩余问题时进入下一区块
    fn skip_questions(question_ids: &[String], ctx: &NavigationContext<'_>) -> NavigationOutcome {
        let skipped: HashSet<&str> = question_ids.iter().map(String::as_str).collect();

        let next_question = ctx
            .structure
            .questions_after(ctx.current_block_id, ctx.current_question_id)
            .iter()
            .find(|id| !skipped.contains(id.as_str()));

        match next_question {
            Some(question_id) => NavigationOutcome::question(ctx.current_block_id, question_id),
            None => ctx
                .next_block()
                .map(NavigationOutcome::block)
                .unwrap_or(NavigationOutcome::End),
        }
    }
}

/// 空串目标等同缺失
fn non_blank(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SurveyStructure;

    fn structure() -> SurveyStructure {
        SurveyStructure::new()
            .block("B1", ["Q1", "Q2", "Q3", "Q4"])
            .block("B2", ["Q5"])
            .block("B3", Vec::<String>::new())
            .block("B4", ["Q6", "Q7"])
    }

    fn rule(actions: Vec<Action>) -> Rule {
        actions.into_iter().fold(Rule::new("r"), Rule::then)
    }

    #[test]
    fn test_end() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");
        assert_eq!(
            ActionResolver::resolve(&rule(vec![Action::End]), &ctx),
            Some(NavigationOutcome::End)
        );
    }

    #[test]
    fn test_first_decisive_action_wins() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");
        let r = rule(vec![
            Action::message("hello"),
            Action::goto_block("B4"),
            Action::End,
        ]);

        let mut messages = Vec::new();
        let outcome =
            ActionResolver::resolve_collecting(&r, &ctx, Granularity::Question, &mut messages);

        assert_eq!(outcome, Some(NavigationOutcome::block("B4")));
        assert_eq!(messages, vec!["hello".to_string()]);
    }

    #[test]
    fn test_non_decisive_actions() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");
        let r = rule(vec![
            Action::message("only a message"),
            Action::GotoBlock { block_id: None },
            Action::Unknown,
            Action::SkipBlock { block_ids: None },
        ]);

        assert_eq!(ActionResolver::resolve(&r, &ctx), None);
    }

    #[test]
    fn test_missing_payload_falls_through_to_next_action() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");
        let r = rule(vec![
            Action::GotoQuestion { question_id: None },
            Action::goto_question("Q3"),
        ]);

        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::question("B1", "Q3"))
        );
    }

    #[test]
    fn test_blank_targets_are_not_decisive() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");

        let r = rule(vec![
            Action::goto_block(""),
            Action::goto_question(""),
            Action::goto_block_question("", "Q7"),
        ]);
        assert_eq!(ActionResolver::resolve(&r, &ctx), None);

        let r = rule(vec![Action::goto_block(""), Action::goto_block("B2")]);
        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::block("B2"))
        );

        // 空的目标问题回退到区块首题
        let r = rule(vec![Action::goto_block_question("B4", "")]);
        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::question("B4", "Q6"))
        );

        let r = rule(vec![Action::goto_block_question("", "Q7")]);
        let outcome =
            ActionResolver::resolve_collecting(&r, &ctx, Granularity::Block, &mut Vec::new());
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_goto_block_question() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "Q1");

        let explicit = rule(vec![Action::goto_block_question("B4", "Q7")]);
        assert_eq!(
            ActionResolver::resolve(&explicit, &ctx),
            Some(NavigationOutcome::question("B4", "Q7"))
        );

        let first = rule(vec![Action::goto_block_start("B4")]);
        assert_eq!(
            ActionResolver::resolve(&first, &ctx),
            Some(NavigationOutcome::question("B4", "Q6"))
        );

        let empty_block = rule(vec![Action::goto_block_start("B3")]);
        assert_eq!(
            ActionResolver::resolve(&empty_block, &ctx),
            Some(NavigationOutcome::block("B3"))
        );

        let no_target = rule(vec![Action::GotoBlockQuestion {
            target_block_id: None,
            target_question_id: Some("Q7".to_string()),
        }]);
        assert_eq!(ActionResolver::resolve(&no_target, &ctx), None);
    }

    #[test]
    fn test_skip_block() {
        let s = SurveyStructure::new()
            .block("B1", ["Q1"])
            .block("B2", ["Q2"])
            .block("B3", ["Q3"])
            .block("B4", ["Q4"]);
        let ctx = NavigationContext::new(&s, "B1", "Q1");

        let r = rule(vec![Action::skip_blocks(["B2", "B3"])]);
        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::block("B4"))
        );

        let all = rule(vec![Action::skip_blocks(["B2", "B3", "B4"])]);
        assert_eq!(ActionResolver::resolve(&all, &ctx), Some(NavigationOutcome::End));

        // 只向前查找，不会回到之前的区块
        let ctx = NavigationContext::new(&s, "B3", "Q3");
        let r = rule(vec![Action::skip_blocks(["B4"])]);
        assert_eq!(ActionResolver::resolve(&r, &ctx), Some(NavigationOutcome::End));
    }

    #[test]
    fn test_skip_questions() {
        let s = structure();

        let ctx = NavigationContext::new(&s, "B1", "Q1");
        let r = rule(vec![Action::skip_questions(["Q2", "Q3"])]);
        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::question("B1", "Q4"))
        );

        // 区块内没有剩余问题，进入下一区块
        let r = rule(vec![Action::skip_questions(["Q2", "Q3", "Q4"])]);
        assert_eq!(
            ActionResolver::resolve(&r, &ctx),
            Some(NavigationOutcome::block("B2"))
        );

        // 最后一个区块，结束
        let ctx = NavigationContext::new(&s, "B4", "Q6");
        let r = rule(vec![Action::skip_questions(["Q7"])]);
        assert_eq!(ActionResolver::resolve(&r, &ctx), Some(NavigationOutcome::End));
    }

    #[test]
    fn test_block_granularity_ignores_question_actions() {
        let s = structure();
        let ctx = NavigationContext::new(&s, "B1", "");

        let r = rule(vec![
            Action::goto_question("Q3"),
            Action::skip_questions(["Q2"]),
            Action::goto_block_question("B4", "Q7"),
        ]);

        let outcome =
            ActionResolver::resolve_collecting(&r, &ctx, Granularity::Block, &mut Vec::new());
        assert_eq!(outcome, Some(NavigationOutcome::block("B4")));
    }
}
