//! 历史树投影：把版本图转换成前端可直接渲染的多叉树

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{HistoryGraph, HistoryNode, NodeId};

/// 渲染用树节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTreeNode {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub is_head: bool,
    /// 是否位于根到 head 的路径上，用于展开和高亮
    pub on_active_path: bool,
    /// 按时间戳升序，时间戳相同按插入顺序
    pub children: Vec<HistoryTreeNode>,
}

impl HistoryTreeNode {
    /// 以当前节点为根的子树节点数
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            total += 1;
            pending.extend(node.children.iter());
        }
        total
    }

    pub fn find(&self, id: NodeId) -> Option<&HistoryTreeNode> {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.id == id {
                return Some(node);
            }
            pending.extend(node.children.iter());
        }
        None
    }
}

/// 投影结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryProjection {
    pub tree: Option<HistoryTreeNode>,
    /// head 到根（包含两端）
    pub active_path: Vec<NodeId>,
}

impl HistoryProjection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.tree.as_ref().map_or(0, HistoryTreeNode::count)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tree.as_ref().and_then(|tree| tree.find(id)).is_some()
    }
}

/// 图不存在时返回空投影
pub fn project_graph<T>(graph: Option<&HistoryGraph<T>>) -> HistoryProjection {
    graph.map_or_else(HistoryProjection::empty, HistoryGraph::project)
}

impl<T> HistoryGraph<T> {
    pub fn active_path(&self) -> Vec<NodeId> {
        self.ancestors(self.head).map(|node| node.id).collect()
    }

    /// 生成渲染树和 active path；纯函数，可按 [`HistoryGraph::signature`] 记忆化
    pub fn project(&self) -> HistoryProjection {
        let active_path = self.active_path();
        let on_path: HashSet<NodeId> = active_path.iter().copied().collect();

        let mut children: HashMap<NodeId, Vec<&HistoryNode<T>>> = HashMap::new();
        for node in self.nodes() {
            if let Some(parent) = node.parent_id {
                children.entry(parent).or_default().push(node);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|node| (node.timestamp, node.seq));
        }

        // 先序遍历得到访问顺序，再逆序组装，避免深链递归
        let mut preorder = Vec::with_capacity(self.len());
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            preorder.push(id);
            if let Some(siblings) = children.get(&id) {
                pending.extend(siblings.iter().rev().map(|node| node.id));
            }
        }

        let mut built: HashMap<NodeId, HistoryTreeNode> = HashMap::with_capacity(preorder.len());
        for id in preorder.into_iter().rev() {
            let node = self.expect_node(id);
            let subtrees: Vec<HistoryTreeNode> = children
                .get(&id)
                .map(|siblings| {
                    siblings
                        .iter()
                        .map(|child| {
                            built
                                .remove(&child.id)
                                .expect("children are assembled before their parent")
                        })
                        .collect()
                })
                .unwrap_or_default();

            built.insert(
                id,
                HistoryTreeNode {
                    id,
                    parent_id: node.parent_id,
                    timestamp: node.timestamp,
                    summary: node.summary.clone(),
                    is_head: id == self.head,
                    on_active_path: on_path.contains(&id),
                    children: subtrees,
                },
            );
        }

        HistoryProjection {
            tree: built.remove(&self.root),
            active_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_graph_projects_empty() {
        let projection = project_graph::<String>(None);

        assert!(projection.tree.is_none());
        assert!(projection.active_path.is_empty());
        assert_eq!(projection.node_count(), 0);
    }

    #[test]
    fn test_single_root_projection() {
        let graph = HistoryGraph::new(0);
        let projection = project_graph(Some(&graph));

        let tree = projection.tree.as_ref().unwrap();
        assert_eq!(tree.id, graph.root());
        assert!(tree.is_head);
        assert!(tree.children.is_empty());
        assert_eq!(projection.active_path, vec![graph.root()]);
    }

    #[test]
    fn test_branches_sorted_by_creation() {
        let g = HistoryGraph::new(0);
        let root = g.root();
        let g = g.commit("first", 1);
        let first = g.head();
        let (g, _) = g.checkout(root).unwrap();
        let second = g.head();
        let (g, _) = g.checkout(root).unwrap();
        let third = g.head();

        let projection = g.project();
        let tree = projection.tree.unwrap();
        let order: Vec<NodeId> = tree.children.iter().map(|c| c.id).collect();
        assert_eq!(order, vec![first, second, third]);
        assert_eq!(projection.active_path, vec![third, root]);
        assert!(tree.on_active_path);
        assert!(!tree.children[0].on_active_path);
        assert!(tree.children[2].is_head);
    }

    #[test]
    fn test_equal_timestamps_ordered_by_insertion() {
        use std::sync::Arc;

        let g = HistoryGraph::new(0);
        let root = g.root();
        let mut g = g.commit("first", 1);
        let mut expected = vec![g.head()];
        for _ in 0..5 {
            let (next, _) = g.checkout(root).unwrap();
            expected.push(next.head());
            g = next;
        }

        // 所有兄弟节点共用同一时间戳，并按逆序重新插入
        let shared = g.node(root).unwrap().timestamp;
        for id in expected.iter().rev() {
            let mut node = g.nodes.remove(id).unwrap().as_ref().clone();
            node.timestamp = shared;
            g.nodes.insert(*id, Arc::new(node));
        }
        g.dbg_check();

        let tree = g.project().tree.unwrap();
        let order: Vec<NodeId> = tree.children.iter().map(|c| c.id).collect();
        assert_eq!(order, expected);
        assert!(tree.children.iter().all(|c| c.timestamp == shared));

        // 同一输入多次投影结果一致
        assert_eq!(g.project(), g.project());
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let mut graph = HistoryGraph::new(0usize);
        for i in 1..=2_000 {
            graph = graph.commit(format!("edit {i}"), i);
        }

        let projection = graph.project();
        assert_eq!(projection.node_count(), 2_001);
        assert_eq!(projection.active_path.len(), 2_001);
        assert_eq!(projection.active_path.first(), Some(&graph.head()));
        assert_eq!(projection.active_path.last(), Some(&graph.root()));
    }

    #[test]
    fn test_projection_wire_shape() {
        let graph = HistoryGraph::new(0).commit("edit1", 1);
        let value = serde_json::to_value(graph.project()).unwrap();

        let tree = &value["tree"];
        assert_eq!(tree["summary"], "initial version");
        assert!(tree["parentId"].is_null());
        assert_eq!(tree["isHead"], false);
        assert_eq!(tree["onActivePath"], true);
        assert_eq!(tree["children"][0]["summary"], "edit1");
        assert_eq!(tree["children"][0]["isHead"], true);
        assert_eq!(value["activePath"].as_array().unwrap().len(), 2);
    }
}
