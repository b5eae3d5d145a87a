//! HistoryService：可在多线程间共享的版本历史服务
//!
//! 同一 key 上的操作通过 DashMap 的条目锁串行执行，读-改-写期间整体持锁，
//! 完成后整体替换图；不同 key 之间互不协调。

use std::sync::Arc;

use dashmap::DashMap;

use super::config::HistoryConfig;
use super::models::{HistoryError, HistoryGraph, HistoryResult, NodeId};
use super::tree::HistoryProjection;

/// 版本历史服务
pub struct HistoryService<T> {
    graphs: DashMap<String, HistoryGraph<T>>,
    config: Arc<HistoryConfig>,
}

impl<T: Clone> Default for HistoryService<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> HistoryService<T> {
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
            config: Arc::new(HistoryConfig::default()),
        }
    }

    pub fn with_config(config: HistoryConfig) -> HistoryResult<Self> {
        config.validate()?;
        Ok(Self {
            graphs: DashMap::new(),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// 确保 key 存在历史记录，首次调用时以 `initial_state` 创建根节点并保存
    ///
    /// 返回当前图的快照。
    pub fn ensure(&self, key: &str, initial_state: T) -> HistoryGraph<T> {
        self.graphs
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::info!("HistoryService: created history for {}", key);
                HistoryGraph::with_config(initial_state, Arc::clone(&self.config))
            })
            .clone()
    }

    /// 提交新版本，返回新的 head ID
    pub fn commit(&self, key: &str, summary: &str, new_state: T) -> HistoryResult<NodeId> {
        self.update(key, |graph| {
            let next = graph.commit(summary, new_state);
            let head = next.head();
            Ok((next, head))
        })
    }

    pub fn checkout(&self, key: &str, target: NodeId) -> HistoryResult<T> {
        self.update(key, |graph| graph.checkout(target))
    }

    pub fn undo(&self, key: &str) -> HistoryResult<T> {
        self.update(key, HistoryGraph::undo)
    }

    pub fn redo(&self, key: &str) -> HistoryResult<T> {
        self.update(key, HistoryGraph::redo)
    }

    /// 未知 key 返回 false
    pub fn can_undo(&self, key: &str) -> bool {
        self.graphs.get(key).is_some_and(|graph| graph.can_undo())
    }

    /// 未知 key 返回 false
    pub fn can_redo(&self, key: &str) -> bool {
        self.graphs.get(key).is_some_and(|graph| graph.can_redo())
    }

    /// 未知 key 返回空投影
    pub fn project(&self, key: &str) -> HistoryProjection {
        self.graphs
            .get(key)
            .map(|graph| graph.project())
            .unwrap_or_default()
    }

    pub fn preview(&self, key: &str, id: NodeId) -> Option<T> {
        self.graphs
            .get(key)
            .and_then(|graph| graph.preview(id).cloned())
    }

    pub fn head_state(&self, key: &str) -> Option<T> {
        self.graphs.get(key).map(|graph| graph.head_state().clone())
    }

    pub fn snapshot(&self, key: &str) -> Option<HistoryGraph<T>> {
        self.graphs.get(key).map(|graph| graph.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.graphs.iter().map(|entry| entry.key().clone()).collect()
    }

    /// 由调用方在工作流结束时清理
    pub fn remove(&self, key: &str) -> Option<HistoryGraph<T>> {
        self.graphs.remove(key).map(|(_, graph)| graph)
    }

    /// 持有条目写锁完成一次读-改-写；操作失败时原图不变
    fn update<R>(
        &self,
        key: &str,
        op: impl FnOnce(&HistoryGraph<T>) -> HistoryResult<(HistoryGraph<T>, R)>,
    ) -> HistoryResult<R> {
        let mut entry = self
            .graphs
            .get_mut(key)
            .ok_or_else(|| HistoryError::UnknownEntity(key.to_string()))?;

        match op(entry.value()) {
            Ok((next, result)) => {
                *entry.value_mut() = next;
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("HistoryService: operation on {} rejected: {}", key, e);
                Err(e)
            }
        }
    }
}
