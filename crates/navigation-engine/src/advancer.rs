//! 默认推进器
//!
//! 没有规则产生决策时的自然推进：区块内下一题，否则下一区块，否则结束。

use crate::models::{NavigationContext, NavigationOutcome};

pub struct DefaultAdvancer;

impl DefaultAdvancer {
    /// 问题粒度推进；当前位置未知时视为没有后继
    pub fn advance(ctx: &NavigationContext<'_>) -> NavigationOutcome {
        let next_question = ctx
            .structure
            .questions_after(ctx.current_block_id, ctx.current_question_id)
            .first();

        match next_question {
            Some(question_id) => NavigationOutcome::question(ctx.current_block_id, question_id),
            None => Self::advance_block(ctx),
        }
    }

    /// 区块粒度推进
    pub fn advance_block(ctx: &NavigationContext<'_>) -> NavigationOutcome {
        ctx.next_block()
            .map(NavigationOutcome::block)
            .unwrap_or(NavigationOutcome::End)
    }
}
