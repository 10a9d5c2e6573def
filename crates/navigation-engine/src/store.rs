//! 问卷定义存储
//!
//! 使用 DashMap 提供线程安全的问卷定义缓存，支持定义的加载、替换、删除与目录批量加载。
//! 引擎只读取存储中的快照，同一问卷的并发会话共享同一个 `Arc`。

use crate::compiler::{CompiledSurvey, SurveyCompiler};
use crate::error::{NavigationError, Result};
use crate::models::SurveyDefinition;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 问卷定义存储
#[derive(Clone)]
pub struct SurveyStore {
    /// 编译后的问卷定义
    surveys: Arc<DashMap<String, Arc<CompiledSurvey>>>,
    /// 问卷编译器
    compiler: Arc<parking_lot::Mutex<SurveyCompiler>>,
}

impl SurveyStore {
    pub fn new() -> Self {
        Self {
            surveys: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(SurveyCompiler::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.surveys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surveys.is_empty()
    }

    /// 加载或替换问卷定义，返回编译结果
    #[instrument(skip(self, definition), fields(survey_id = %definition.id))]
    pub fn load(&self, definition: SurveyDefinition) -> Result<Arc<CompiledSurvey>> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile(definition)?
        };

        Ok(self.insert(compiled))
    }

    /// 从 JSON 字符串加载问卷定义
    #[instrument(skip(self, json))]
    pub fn load_from_json(&self, json: &str) -> Result<Arc<CompiledSurvey>> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile_from_json(json)?
        };

        Ok(self.insert(compiled))
    }

    fn insert(&self, compiled: CompiledSurvey) -> Arc<CompiledSurvey> {
        for warning in &compiled.warnings {
            warn!(survey_id = %compiled.id(), "{}", warning);
        }

        let compiled = Arc::new(compiled);
        let replaced = self
            .surveys
            .insert(compiled.id().to_string(), Arc::clone(&compiled))
            .is_some();

        info!(
            survey_id = %compiled.id(),
            rules = compiled.rules().len(),
            blocks = compiled.definition.structure.block_order.len(),
            replaced,
            "问卷定义已加载"
        );
        compiled
    }

    /// 加载目录下所有 `*.json` 问卷定义
    ///
    /// 单个文件失败只记录告警，不影响其他文件。返回成功加载的数量。
    #[instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let mut loaded = 0;

        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let result = std::fs::read_to_string(&path)
                .map_err(NavigationError::from)
                .and_then(|json| self.load_from_json(&json));

            match result {
                Ok(_) => loaded += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "问卷定义加载失败"),
            }
        }

        info!("目录加载完成: {} 个问卷定义", loaded);
        Ok(loaded)
    }

    /// 删除问卷定义
    #[instrument(skip(self))]
    pub fn delete(&self, survey_id: &str) -> Result<()> {
        if self.surveys.remove(survey_id).is_some() {
            info!("问卷定义已删除: {}", survey_id);
            Ok(())
        } else {
            warn!("删除不存在的问卷定义: {}", survey_id);
            Err(NavigationError::SurveyNotFound(survey_id.to_string()))
        }
    }

    pub fn get(&self, survey_id: &str) -> Option<Arc<CompiledSurvey>> {
        self.surveys.get(survey_id).map(|s| Arc::clone(s.value()))
    }

    pub fn contains(&self, survey_id: &str) -> bool {
        self.surveys.contains_key(survey_id)
    }

    /// 获取所有问卷 ID（按字典序）
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.surveys.iter().map(|s| s.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl Default for SurveyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, Condition, Rule, SurveyStructure};
    use crate::operators::Operator;

    fn sample_definition(id: &str) -> SurveyDefinition {
        SurveyDefinition {
            id: id.to_string(),
            name: Some("满意度调查".to_string()),
            rules: vec![
                Rule::new("promoter")
                    .when(Condition::new("nps", Operator::NpsIsPromoter))
                    .then(Action::goto_block("thanks")),
            ],
            structure: SurveyStructure::new()
                .block("score", ["nps"])
                .block("why", ["reason"])
                .block("thanks", ["bye"]),
        }
    }

    #[test]
    fn test_load_definition() {
        let store = SurveyStore::new();
        let compiled = store.load(sample_definition("s1")).unwrap();

        assert_eq!(compiled.compile_version, 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("s1"));
    }

    #[test]
    fn test_load_replaces_existing() {
        let store = SurveyStore::new();
        store.load(sample_definition("s1")).unwrap();

        let mut updated = sample_definition("s1");
        updated.rules.clear();
        store.load(updated).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.get("s1").unwrap().rules().is_empty());
    }

    #[test]
    fn test_load_invalid_definition() {
        let store = SurveyStore::new();
        let result = store.load_from_json(r#"{"id": "s", "structure": {"blockOrder": ["B", "B"]}}"#);

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete() {
        let store = SurveyStore::new();
        store.load(sample_definition("s1")).unwrap();

        store.delete("s1").unwrap();
        assert!(!store.contains("s1"));
        assert!(matches!(
            store.delete("s1"),
            Err(NavigationError::SurveyNotFound(_))
        ));
    }

    #[test]
    fn test_list_ids_sorted() {
        let store = SurveyStore::new();
        store.load(sample_definition("b")).unwrap();
        store.load(sample_definition("a")).unwrap();

        assert_eq!(store.list_ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_load_dir_skips_bad_files() {
        let dir = std::env::temp_dir().join(format!("survey-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("good.json"),
            serde_json::to_string(&sample_definition("good")).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let store = SurveyStore::new();
        let loaded = store.load_dir(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(loaded, 1);
        assert!(store.contains("good"));
    }

    #[test]
    fn test_load_dir_missing() {
        let store = SurveyStore::new();
        assert!(matches!(
            store.load_dir("/nonexistent/survey/definitions"),
            Err(NavigationError::Io(_))
        ));
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = SurveyStore::new();
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                store_clone
                    .load(sample_definition(&format!("survey-{}", i)))
                    .unwrap();
            }
        });

        for i in 100..200 {
            store
                .load(sample_definition(&format!("survey-{}", i)))
                .unwrap();
        }

        handle.join().unwrap();

        assert_eq!(store.len(), 200);
    }
}
