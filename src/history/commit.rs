//! 提交：在 head 下追加新版本

use super::models::HistoryGraph;

impl<T> HistoryGraph<T> {
    /// 在当前 head 下创建新节点并将 head 前移到该节点，同时清空 redo 栈
    ///
    /// 原有节点（包括旧 head 下通过 checkout 产生的分支）全部保留。
    pub fn commit(&self, summary: impl Into<String>, new_state: T) -> Self {
        let parent = self.head;
        let mut next = self.clone();

        let id = next.push_node(parent, summary.into(), new_state);
        next.head = id;
        next.redo_stack.clear();

        tracing::debug!(
            "HistoryGraph: committed {} under {} (nodes={})",
            id,
            parent,
            next.nodes.len()
        );

        next
    }
}
