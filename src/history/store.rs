//! VersionStore：按实体 key（文件路径）隔离的版本图集合

use std::collections::HashMap;
use std::sync::Arc;

use super::config::HistoryConfig;
use super::models::{HistoryGraph, HistoryResult};

/// 实体 key 到版本图的映射
///
/// 不同 key 的历史之间完全独立。store 只负责保存，变更操作由调用方在图上完成后
/// 通过 [`VersionStore::put`] 整体替换写回。
#[derive(Debug)]
pub struct VersionStore<T> {
    graphs: HashMap<String, HistoryGraph<T>>,
    config: Arc<HistoryConfig>,
}

impl<T> Default for VersionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionStore<T> {
    pub fn new() -> Self {
        Self {
            graphs: HashMap::new(),
            config: Arc::new(HistoryConfig::default()),
        }
    }

    pub fn with_config(config: HistoryConfig) -> HistoryResult<Self> {
        config.validate()?;
        Ok(Self {
            graphs: HashMap::new(),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// 返回 key 已有的图；不存在时以 `initial_state` 构造只有根节点的新图
    ///
    /// 本身不写入 store，调用方需自行 `put`。
    pub fn ensure(&self, key: &str, initial_state: T) -> HistoryGraph<T> {
        match self.graphs.get(key) {
            Some(graph) => graph.clone(),
            None => HistoryGraph::with_config(initial_state, Arc::clone(&self.config)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&HistoryGraph<T>> {
        self.graphs.get(key)
    }

    /// 整体替换 key 对应的图
    pub fn put(&mut self, key: impl Into<String>, graph: HistoryGraph<T>) {
        self.graphs.insert(key.into(), graph);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.graphs.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// 由调用方在工作流结束时清理
    pub fn remove(&mut self, key: &str) -> Option<HistoryGraph<T>> {
        self.graphs.remove(key)
    }
}
