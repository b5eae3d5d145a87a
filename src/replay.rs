//! 操作脚本回放
//!
//! 从 JSON 脚本读取一组按实体 key 组织的历史操作，依次作用到 [`HistoryService`]，
//! 最后输出每个实体的历史树。单步失败（如无可撤销）记录在报告中，不中断回放。
//!
//! ```json
//! {
//!   "config": { "redoLimit": 50 },
//!   "steps": [
//!     { "op": "ensure", "key": "a.json", "state": {} },
//!     { "op": "commit", "key": "a.json", "summary": "add box", "state": {"boxes": 1}, "label": "v1" },
//!     { "op": "undo", "key": "a.json" },
//!     { "op": "checkout", "key": "a.json", "target": "root" }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::{HistoryConfig, HistoryError, HistoryProjection, HistoryService, NodeId};

/// 回放相关错误
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("脚本解析错误: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("未知的 checkout 目标: {0}")]
    UnknownTarget(String),
}

pub type ReplayResult<T> = Result<T, ReplayError>;

/// checkout 目标中表示根节点的保留名
pub const ROOT_TARGET: &str = "root";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    #[serde(default)]
    pub config: Option<HistoryConfig>,
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_json_str(content: &str) -> ReplayResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> ReplayResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// 单步操作
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReplayStep {
    Ensure {
        key: String,
        state: Value,
    },
    Commit {
        key: String,
        summary: String,
        state: Value,
        #[serde(default)]
        label: Option<String>,
    },
    /// `target` 可以是 `root`、之前步骤的 label 或节点 UUID
    Checkout {
        key: String,
        target: String,
        #[serde(default)]
        label: Option<String>,
    },
    Undo {
        key: String,
    },
    Redo {
        key: String,
    },
}

impl ReplayStep {
    pub fn key(&self) -> &str {
        match self {
            Self::Ensure { key, .. }
            | Self::Commit { key, .. }
            | Self::Checkout { key, .. }
            | Self::Undo { key }
            | Self::Redo { key } => key,
        }
    }
}

/// 回放结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub entities: BTreeMap<String, EntityReport>,
    pub failures: Vec<StepFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReport {
    pub head_state: Value,
    pub can_undo: bool,
    pub can_redo: bool,
    pub projection: HistoryProjection,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    /// 从 0 开始的步骤序号
    pub step: usize,
    pub key: String,
    pub error: String,
}

/// 回放器：持有服务和 label 表
pub struct Replayer {
    service: HistoryService<Value>,
    labels: HashMap<(String, String), NodeId>,
}

impl Replayer {
    pub fn new(config: Option<HistoryConfig>) -> ReplayResult<Self> {
        let service = match config {
            Some(config) => HistoryService::with_config(config)?,
            None => HistoryService::new(),
        };

        Ok(Self {
            service,
            labels: HashMap::new(),
        })
    }

    pub fn service(&self) -> &HistoryService<Value> {
        &self.service
    }

    pub fn apply(&mut self, step: &ReplayStep) -> ReplayResult<()> {
        match step {
            ReplayStep::Ensure { key, state } => {
                self.service.ensure(key, state.clone());
            }
            ReplayStep::Commit {
                key,
                summary,
                state,
                label,
            } => {
                let id = self.service.commit(key, summary, state.clone())?;
                self.remember(key, label.as_deref(), id);
            }
            ReplayStep::Checkout { key, target, label } => {
                let target = self.resolve(key, target)?;
                self.service.checkout(key, target)?;
                if let Some(graph) = self.service.snapshot(key) {
                    self.remember(key, label.as_deref(), graph.head());
                }
            }
            ReplayStep::Undo { key } => {
                self.service.undo(key)?;
            }
            ReplayStep::Redo { key } => {
                self.service.redo(key)?;
            }
        }
        Ok(())
    }

    pub fn report(&self, failures: Vec<StepFailure>) -> ReplayReport {
        let entities = self
            .service
            .keys()
            .into_iter()
            .filter_map(|key| {
                let graph = self.service.snapshot(&key)?;
                let entity = EntityReport {
                    head_state: graph.head_state().clone(),
                    can_undo: graph.can_undo(),
                    can_redo: graph.can_redo(),
                    projection: graph.project(),
                };
                Some((key, entity))
            })
            .collect();

        ReplayReport { entities, failures }
    }

    fn remember(&mut self, key: &str, label: Option<&str>, id: NodeId) {
        if let Some(label) = label {
            self.labels.insert((key.to_string(), label.to_string()), id);
        }
    }

    fn resolve(&self, key: &str, target: &str) -> ReplayResult<NodeId> {
        if target == ROOT_TARGET {
            return self
                .service
                .snapshot(key)
                .map(|graph| graph.root())
                .ok_or_else(|| HistoryError::UnknownEntity(key.to_string()).into());
        }

        if let Some(id) = self.labels.get(&(key.to_string(), target.to_string())) {
            return Ok(*id);
        }

        target
            .parse()
            .map_err(|_| ReplayError::UnknownTarget(target.to_string()))
    }
}

/// 回放整个脚本
pub fn run_script(script: &ReplayScript) -> ReplayResult<ReplayReport> {
    let mut replayer = Replayer::new(script.config.clone())?;
    let mut failures = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        if let Err(e) = replayer.apply(step) {
            tracing::warn!("Replay step {} on {} failed: {}", index, step.key(), e);
            failures.push(StepFailure {
                step: index,
                key: step.key().to_string(),
                error: e.to_string(),
            });
        }
    }

    tracing::info!(
        "Replayed {} steps, {} failed",
        script.steps.len(),
        failures.len()
    );

    Ok(replayer.report(failures))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    const SCRIPT: &str = r#"{
        "steps": [
            { "op": "ensure", "key": "a.json", "state": { "boxes": 0 } },
            { "op": "commit", "key": "a.json", "summary": "edit1", "state": { "boxes": 1 }, "label": "v1" },
            { "op": "commit", "key": "a.json", "summary": "edit2", "state": { "boxes": 2 } },
            { "op": "undo", "key": "a.json" },
            { "op": "redo", "key": "a.json" },
            { "op": "redo", "key": "a.json" },
            { "op": "checkout", "key": "a.json", "target": "v1", "label": "fork" },
            { "op": "ensure", "key": "b.json", "state": "blank" },
            { "op": "undo", "key": "b.json" },
            { "op": "checkout", "key": "b.json", "target": "v1" }
        ]
    }"#;

    #[test]
    fn test_run_script() {
        let script = ReplayScript::from_json_str(SCRIPT).unwrap();
        let report = run_script(&script).unwrap();

        let a = &report.entities["a.json"];
        assert_eq!(a.head_state, json!({ "boxes": 1 }));
        assert_eq!(a.projection.node_count(), 4);
        assert!(a.can_undo);
        assert!(!a.can_redo);

        let b = &report.entities["b.json"];
        assert_eq!(b.head_state, json!("blank"));
        assert_eq!(b.projection.node_count(), 1);

        let failed_steps: Vec<usize> = report.failures.iter().map(|f| f.step).collect();
        assert_eq!(failed_steps, vec![5, 8, 9]);
        assert_eq!(report.failures[0].error, "nothing to redo");
        assert_eq!(report.failures[2].error, "未知的 checkout 目标: v1");
    }

    #[test]
    fn test_checkout_by_root_and_uuid() {
        let mut replayer = Replayer::new(None).unwrap();
        replayer
            .apply(&ReplayStep::Ensure {
                key: "a.json".to_string(),
                state: json!(0),
            })
            .unwrap();
        replayer
            .apply(&ReplayStep::Commit {
                key: "a.json".to_string(),
                summary: "edit".to_string(),
                state: json!(1),
                label: None,
            })
            .unwrap();
        let edited = replayer.service().snapshot("a.json").unwrap().head();

        replayer
            .apply(&ReplayStep::Checkout {
                key: "a.json".to_string(),
                target: ROOT_TARGET.to_string(),
                label: None,
            })
            .unwrap();
        assert_eq!(replayer.service().head_state("a.json"), Some(json!(0)));

        replayer
            .apply(&ReplayStep::Checkout {
                key: "a.json".to_string(),
                target: edited.to_string(),
                label: None,
            })
            .unwrap();
        assert_eq!(replayer.service().head_state("a.json"), Some(json!(1)));
    }

    #[test]
    fn test_commit_on_unknown_entity_fails() {
        let mut replayer = Replayer::new(None).unwrap();
        let result = replayer.apply(&ReplayStep::Undo {
            key: "missing.json".to_string(),
        });

        assert!(matches!(
            result,
            Err(ReplayError::History(HistoryError::UnknownEntity(_)))
        ));
    }

    #[test]
    fn test_script_from_file_with_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "config": {{ "redoLimit": 1 }}, "steps": [
                {{ "op": "ensure", "key": "a.json", "state": 0 }},
                {{ "op": "commit", "key": "a.json", "summary": "a", "state": 1 }},
                {{ "op": "commit", "key": "a.json", "summary": "b", "state": 2 }},
                {{ "op": "undo", "key": "a.json" }},
                {{ "op": "undo", "key": "a.json" }},
                {{ "op": "redo", "key": "a.json" }},
                {{ "op": "redo", "key": "a.json" }}
            ] }}"#
        )
        .unwrap();

        let script = ReplayScript::from_path(file.path()).unwrap();
        assert_eq!(script.config.as_ref().unwrap().redo_limit, 1);

        let report = run_script(&script).unwrap();
        assert_eq!(report.entities["a.json"].head_state, json!(1));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, 6);
    }

    #[test]
    fn test_invalid_script_config() {
        let script =
            ReplayScript::from_json_str(r#"{ "config": { "redoLimit": 0 }, "steps": [] }"#)
                .unwrap();

        assert!(matches!(
            run_script(&script),
            Err(ReplayError::History(HistoryError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_malformed_script() {
        assert!(matches!(
            ReplayScript::from_json_str(r#"{ "steps": [ { "op": "merge" } ] }"#),
            Err(ReplayError::Parse(_))
        ));
    }
}
