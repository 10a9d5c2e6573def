//! 问卷定义编译器
//!
//! 加载问卷定义时校验问卷结构，并对规则配置做静态检查。
//! 结构错误（重复区块、未知区块的问题表等）直接拒绝；
//! 规则配置问题只产生告警，运行时由引擎按“不生效”安全降级。

use crate::error::{NavigationError, Result};
use crate::models::{Action, Rule, SurveyDefinition};
use crate::operators::Operator;
use std::collections::HashSet;

/// 编译后的问卷定义
#[derive(Debug, Clone)]
pub struct CompiledSurvey {
    pub definition: SurveyDefinition,
    /// 规则条件中引用的所有问题 ID
    pub required_answers: HashSet<String>,
    /// 规则配置告警
    pub warnings: Vec<String>,
    /// 编译版本号
    pub compile_version: u64,
}

impl CompiledSurvey {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn rules(&self) -> &[Rule] {
        &self.definition.rules
    }
}

/// 问卷定义编译器
#[derive(Debug, Default)]
pub struct SurveyCompiler {
    compile_version: u64,
}

impl SurveyCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 字符串编译问卷定义
    pub fn compile_from_json(&mut self, json: &str) -> Result<CompiledSurvey> {
        let definition: SurveyDefinition = serde_json::from_str(json)?;
        self.compile(definition)
    }

    pub fn compile(&mut self, definition: SurveyDefinition) -> Result<CompiledSurvey> {
        self.validate_structure(&definition)?;

        let warnings = self.lint_rules(&definition)?;
        let required_answers = definition
            .rules
            .iter()
            .flat_map(|r| r.conditions.iter().map(|c| c.question_id.clone()))
            .collect();

        self.compile_version += 1;

        Ok(CompiledSurvey {
            definition,
            required_answers,
            warnings,
            compile_version: self.compile_version,
        })
    }

    /// 校验问卷结构
    fn validate_structure(&self, definition: &SurveyDefinition) -> Result<()> {
        if definition.id.trim().is_empty() {
            return Err(NavigationError::InvalidDefinition(
                "问卷 ID 不能为空".to_string(),
            ));
        }

        let structure = &definition.structure;
        let mut blocks = HashSet::new();
        for block_id in &structure.block_order {
            if block_id.is_empty() {
                return Err(NavigationError::InvalidDefinition(
                    "区块 ID 不能为空".to_string(),
                ));
            }
            if !blocks.insert(block_id.as_str()) {
                return Err(NavigationError::InvalidDefinition(format!(
                    "区块 '{}' 在 blockOrder 中重复出现",
                    block_id
                )));
            }
        }

        for (block_id, questions) in &structure.questions_by_block {
            if !blocks.contains(block_id.as_str()) {
                return Err(NavigationError::InvalidDefinition(format!(
                    "questionsByBlock 引用了不在 blockOrder 中的区块 '{}'",
                    block_id
                )));
            }

            let mut seen = HashSet::new();
            for question_id in questions {
                if !seen.insert(question_id.as_str()) {
                    return Err(NavigationError::InvalidDefinition(format!(
                        "区块 '{}' 中问题 '{}' 重复出现",
                        block_id, question_id
                    )));
                }
            }
        }

        Ok(())
    }

    /// 规则静态检查，返回告警列表
    fn lint_rules(&self, definition: &SurveyDefinition) -> Result<Vec<String>> {
        let blocks: HashSet<&str> = definition
            .structure
            .block_order
            .iter()
            .map(String::as_str)
            .collect();
        let mut rule_ids = HashSet::new();
        let mut warnings = Vec::new();

        for rule in &definition.rules {
            if rule.id.is_empty() {
                return Err(NavigationError::InvalidDefinition(
                    "规则 ID 不能为空".to_string(),
                ));
            }
            if !rule_ids.insert(rule.id.as_str()) {
                warnings.push(format!("规则 '{}' ID 重复", rule.id));
            }

            let path = format!("rule[{}]", rule.id);

            if let Some(block_id) = &rule.block_id {
                if !blocks.contains(block_id.as_str()) {
                    warnings.push(format!("{}: 作用区块 '{}' 不存在，规则不会生效", path, block_id));
                }
            }

            if rule.conditions.is_empty() {
                warnings.push(format!("{}: 没有条件，规则永不匹配", path));
            }

            for (i, condition) in rule.conditions.iter().enumerate() {
                let cond_path = format!("{}.conditions[{}]", path, i);
                match condition.operator {
                    Operator::Unknown => {
                        warnings.push(format!("{}: 不支持的操作符，恒为 false", cond_path));
                    }
                    Operator::NpsBetween if condition.min.is_none() || condition.max.is_none() => {
                        warnings.push(format!("{}: nps_between 缺少 min/max", cond_path));
                    }
                    Operator::Equals
                    | Operator::NotEquals
                    | Operator::GreaterThan
                    | Operator::LessThan
                    | Operator::NpsGte
                    | Operator::NpsLte
                        if condition.value.is_none() =>
                    {
                        warnings.push(format!("{}: {} 缺少 value", cond_path, condition.operator));
                    }
                    _ => {}
                }
            }

            self.lint_actions(rule, &path, &blocks, &mut warnings);
        }

        Ok(warnings)
    }

    fn lint_actions(
        &self,
        rule: &Rule,
        path: &str,
        blocks: &HashSet<&str>,
        warnings: &mut Vec<String>,
    ) {
        let mut decisive = false;

        for (i, action) in rule.actions.iter().enumerate() {
            let action_path = format!("{}.actions[{}]", path, i);
            let target_block = match action {
                Action::ShowMessage { .. } => None,
                Action::Unknown => {
                    warnings.push(format!("{}: 未知动作类型，将被忽略", action_path));
                    None
                }
                Action::End => {
                    decisive = true;
                    None
                }
                _ if action.missing_target() => {
                    warnings.push(format!(
                        "{}: {} 缺少目标字段，将被忽略",
                        action_path,
                        action.kind()
                    ));
                    None
                }
                Action::GotoBlock { block_id }
                | Action::GotoBlockQuestion {
                    target_block_id: block_id,
                    ..
                } => {
                    decisive = true;
                    block_id.as_deref()
                }
                Action::GotoQuestion { .. }
                | Action::SkipBlock { .. }
                | Action::SkipQuestions { .. } => {
                    decisive = true;
                    None
                }
            };

            if let Some(block_id) = target_block {
                if !blocks.contains(block_id) {
                    warnings.push(format!("{}: 目标区块 '{}' 不存在", action_path, block_id));
                }
            }
        }

        if !decisive {
            warnings.push(format!("{}: 没有可产生跳转的动作，命中后按默认顺序推进", path));
        }
    }
}
