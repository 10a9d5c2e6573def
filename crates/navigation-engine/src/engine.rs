//! 导航引擎
//!
//! 答题运行时每记录一个答案后调用的入口：扫描规则 → 解析动作 → 默认推进。
//! 引擎本身无状态，每次调用都是 (规则, 答案, 当前位置, 问卷结构) 的纯函数。

use crate::advancer::DefaultAdvancer;
use crate::evaluator::{ConditionEvaluator, Evaluate};
use crate::models::{
    Answers, DecisionSource, NavigationContext, NavigationDecision, NavigationOutcome, Rule,
    SurveyStructure,
};
use crate::resolver::{ActionResolver, Granularity};
use crate::scanner::RuleScanner;
use tracing::debug;

/// 计算下一个目标（问题粒度）
pub fn get_next_target(
    rules: &[Rule],
    answers: &Answers,
    current_block_id: &str,
    current_question_id: &str,
    structure: &SurveyStructure,
) -> NavigationOutcome {
    let ctx = NavigationContext::new(structure, current_block_id, current_question_id);
    NavigationEngine::new().next_target(rules, answers, &ctx)
}

/// 计算下一个区块（区块粒度，结果不会是具体问题）
pub fn get_next_block(
    rules: &[Rule],
    answers: &Answers,
    current_block_id: &str,
    structure: &SurveyStructure,
) -> NavigationOutcome {
    let ctx = NavigationContext::new(structure, current_block_id, "");
    NavigationEngine::new().next_block(rules, answers, &ctx)
}

/// 导航引擎
#[derive(Debug, Clone, Default)]
pub struct NavigationEngine<E = ConditionEvaluator> {
    evaluator: E,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl NavigationEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Evaluate> NavigationEngine<E> {
    /// 使用自定义条件评估器
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            evaluator,
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    pub fn next_target(
        &self,
        rules: &[Rule],
        answers: &Answers,
        ctx: &NavigationContext<'_>,
    ) -> NavigationOutcome {
        self.decide(rules, answers, ctx).outcome
    }

    pub fn next_block(
        &self,
        rules: &[Rule],
        answers: &Answers,
        ctx: &NavigationContext<'_>,
    ) -> NavigationOutcome {
        self.decide_block(rules, answers, ctx).outcome
    }

    /// 问题粒度决策，附带命中规则、提示文案与追踪信息
    pub fn decide(
        &self,
        rules: &[Rule],
        answers: &Answers,
        ctx: &NavigationContext<'_>,
    ) -> NavigationDecision {
        self.run(rules, answers, ctx, Granularity::Question)
    }

    /// 区块粒度决策
    pub fn decide_block(
        &self,
        rules: &[Rule],
        answers: &Answers,
        ctx: &NavigationContext<'_>,
    ) -> NavigationDecision {
        self.run(rules, answers, ctx, Granularity::Block)
    }

    fn run(
        &self,
        rules: &[Rule],
        answers: &Answers,
        ctx: &NavigationContext<'_>,
        granularity: Granularity,
    ) -> NavigationDecision {
        let mut trace = Vec::new();
        let mut messages = Vec::new();
        let trace_sink = self.trace_enabled.then_some(&mut trace);

        let matched = RuleScanner::new(&self.evaluator).scan_traced(
            rules,
            answers,
            ctx.current_block_id,
            trace_sink,
        );

        let ruled = matched.and_then(|rule| {
            ActionResolver::resolve_collecting(rule, ctx, granularity, &mut messages)
        });

        let mut decision = match ruled {
            Some(outcome) => NavigationDecision::new(outcome, DecisionSource::Rule),
            None => {
                if let (Some(rule), true) = (matched, self.trace_enabled) {
                    trace.push(format!("rule[{}]: 无有效动作，转默认推进", rule.id));
                }
                let outcome = match granularity {
                    Granularity::Question => DefaultAdvancer::advance(ctx),
                    Granularity::Block => DefaultAdvancer::advance_block(ctx),
                };
                NavigationDecision::new(outcome, DecisionSource::Default)
            }
        };

        decision.rule_id = matched.map(|rule| rule.id.clone());
        decision.messages = messages;
        decision.evaluation_trace = trace;

        debug!(
            block_id = %ctx.current_block_id,
            question_id = %ctx.current_question_id,
            rule_id = ?decision.rule_id,
            source = ?decision.source,
            outcome = ?decision.outcome,
            "导航决策完成"
        );

        decision
    }
}
