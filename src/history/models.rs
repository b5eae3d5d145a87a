//! 版本历史数据模型定义

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::HistoryConfig;

/// 版本历史相关错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("version not found: {0}")]
    NotFound(NodeId),

    #[error("nothing to undo: head is the root version")]
    AtRoot,

    #[error("nothing to redo")]
    NoRedo,

    #[error("no history for entity: {0}")]
    UnknownEntity(String),

    #[error("invalid history config: {0}")]
    InvalidConfig(String),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// 版本节点 ID（UUIDv4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// 版本节点：某个实体在某一时刻的完整状态快照，创建后不可修改
#[derive(Debug, Clone)]
pub struct HistoryNode<T> {
    pub id: NodeId,
    /// 仅根节点为 None
    pub parent_id: Option<NodeId>,
    pub timestamp: DateTime<Utc>,
    /// 在所属图中的插入序号，时间戳相同时用于排序
    pub seq: u64,
    pub summary: String,
    pub state: T,
}

impl<T> HistoryNode<T> {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// 用于记忆化投影结果的图签名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphSignature {
    pub head: NodeId,
    pub node_count: usize,
    pub redo_depth: usize,
    pub redo_top: Option<NodeId>,
}

/// 单个实体的版本图
///
/// 节点只追加不删除，通过 `parent_id` 回指父节点。所有变更操作都返回新的图，
/// 旧图保持不变；节点以 `Arc` 共享，因此新旧图之间不会复制状态快照。
#[derive(Debug)]
pub struct HistoryGraph<T> {
    pub(crate) nodes: HashMap<NodeId, Arc<HistoryNode<T>>>,
    pub(crate) root: NodeId,
    pub(crate) head: NodeId,
    pub(crate) redo_stack: Vec<NodeId>,
    pub(crate) config: Arc<HistoryConfig>,
}

impl<T> Clone for HistoryGraph<T> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            head: self.head,
            redo_stack: self.redo_stack.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> HistoryGraph<T> {
    /// 使用默认配置创建只有根节点的图
    pub fn new(initial_state: T) -> Self {
        Self::with_config(initial_state, Arc::new(HistoryConfig::default()))
    }

    /// 配置必须先通过 [`HistoryConfig::validate`]，否则 panic
    pub fn with_config(initial_state: T, config: Arc<HistoryConfig>) -> Self {
        if let Err(e) = config.validate() {
            panic!("history graph created with {e}");
        }

        let root = HistoryNode {
            id: NodeId::new(),
            parent_id: None,
            timestamp: Utc::now(),
            seq: 0,
            summary: config.initial_summary.clone(),
            state: initial_state,
        };
        let root_id = root.id;

        let mut nodes = HashMap::new();
        nodes.insert(root_id, Arc::new(root));

        Self {
            nodes,
            root: root_id,
            head: root_id,
            redo_stack: Vec::new(),
            config,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    /// 栈顶在末尾
    pub fn redo_stack(&self) -> &[NodeId] {
        &self.redo_stack
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 图创建后至少包含根节点，恒为 false
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&HistoryNode<T>> {
        self.nodes.get(&id).map(Arc::as_ref)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HistoryNode<T>> {
        self.nodes.values().map(Arc::as_ref)
    }

    pub fn head_node(&self) -> &HistoryNode<T> {
        self.expect_node(self.head)
    }

    pub fn head_state(&self) -> &T {
        &self.head_node().state
    }

    /// 悬停预览：直接读取节点状态，不移动 head
    pub fn preview(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(|node| &node.state)
    }

    /// 从 `id` 沿父指针走到根（包含两端）
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            graph: self,
            next: self.contains(id).then_some(id),
        }
    }

    pub fn signature(&self) -> GraphSignature {
        GraphSignature {
            head: self.head,
            node_count: self.nodes.len(),
            redo_depth: self.redo_stack.len(),
            redo_top: self.redo_stack.last().copied(),
        }
    }

    /// 不变量保证存在的节点；缺失说明变更引擎有 bug
    pub(crate) fn expect_node(&self, id: NodeId) -> &HistoryNode<T> {
        match self.nodes.get(&id) {
            Some(node) => Arc::as_ref(node),
            None => panic!("history graph invariant broken: node {id} is referenced but missing"),
        }
    }

    /// 在 `parent` 下追加新节点并返回其 ID，不修改 head 和 redo 栈
    pub(crate) fn push_node(&mut self, parent: NodeId, summary: String, state: T) -> NodeId {
        assert!(
            self.nodes.contains_key(&parent),
            "history graph invariant broken: parent {parent} is missing"
        );

        let node = HistoryNode {
            id: NodeId::new(),
            parent_id: Some(parent),
            timestamp: Utc::now(),
            seq: self.nodes.len() as u64,
            summary,
            state,
        };
        let id = node.id;

        let previous = self.nodes.insert(id, Arc::new(node));
        assert!(previous.is_none(), "node id {id} was generated twice");
        id
    }
}

/// 祖先迭代器，见 [`HistoryGraph::ancestors`]
pub struct Ancestors<'a, T> {
    graph: &'a HistoryGraph<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Ancestors<'a, T> {
    type Item = &'a HistoryNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.graph.expect_node(id);
        self.next = node.parent_id;
        Some(node)
    }
}
