//! 不变量校验

use std::collections::HashSet;

use super::models::HistoryGraph;

impl<T> HistoryGraph<T> {
    /// 校验图的全部不变量，遇到第一个违例即 panic
    ///
    /// 仅供测试和调试使用，变更引擎本身不会调用。
    pub fn dbg_check(&self) {
        assert!(!self.nodes.is_empty(), "graph has no nodes");

        let root = self.nodes.get(&self.root).expect("root is missing");
        assert!(root.parent_id.is_none(), "root has a parent");

        let roots = self.nodes.values().filter(|n| n.parent_id.is_none()).count();
        assert_eq!(roots, 1, "graph must have exactly one root");

        assert!(self.nodes.contains_key(&self.head), "head is missing");

        let mut seqs = HashSet::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter() {
            assert_eq!(*id, node.id, "node stored under the wrong key");
            assert!(seqs.insert(node.seq), "duplicate seq {}", node.seq);
            assert!((node.seq as usize) < self.nodes.len());

            if let Some(parent) = node.parent_id {
                let parent_node = self.nodes.get(&parent).expect("parent is missing");
                assert!(parent_node.seq < node.seq, "parent created after child");
            }

            // 每条父链都必须在 |nodes| 步内到达根
            let steps = self.ancestors(*id).take(self.nodes.len() + 1).count();
            assert!(steps <= self.nodes.len(), "parent chain from {id} does not terminate");
            let last = self.ancestors(*id).take(self.nodes.len()).last().map(|n| n.id);
            assert_eq!(last, Some(self.root));
        }

        assert!(self.redo_stack.len() <= self.config.redo_limit);
        for id in self.redo_stack.iter() {
            assert!(self.nodes.contains_key(id), "redo entry {id} is missing");
        }
    }
}
