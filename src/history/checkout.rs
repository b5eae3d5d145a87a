//! Checkout：基于任意历史版本分叉出新的 head
//!
//! checkout 不会回退或改写历史。目标不是 head 时，会以目标为父节点创建一个
//! 状态相同的新节点，旧 head 到根的路径保持完整可浏览。

use super::models::{HistoryError, HistoryGraph, HistoryResult, NodeId};

impl<T: Clone> HistoryGraph<T> {
    /// 切换到 `target`，返回新图及目标状态
    ///
    /// - 目标不存在：`HistoryError::NotFound`，图不变
    /// - 目标即 head：无操作
    /// - 其它：在目标下分叉新节点作为 head，清空 redo 栈
    pub fn checkout(&self, target: NodeId) -> HistoryResult<(Self, T)> {
        let target_node = self.node(target).ok_or(HistoryError::NotFound(target))?;

        if target == self.head {
            tracing::debug!("HistoryGraph: checkout {} is current head, no-op", target);
            return Ok((self.clone(), target_node.state.clone()));
        }

        let summary = self.config.render_checkout_summary(&target_node.timestamp);
        let state = target_node.state.clone();

        let mut next = self.clone();
        let id = next.push_node(target, summary, state.clone());
        next.head = id;
        next.redo_stack.clear();

        tracing::debug!(
            "HistoryGraph: checkout forked {} from {} (previous head {})",
            id,
            target,
            self.head
        );

        Ok((next, state))
    }
}
