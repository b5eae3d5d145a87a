//! Undo / Redo：沿已有父指针移动 head
//!
//! | 操作 | 前置条件 | head | redo 栈 |
//! |------|----------|------|---------|
//! | undo | head 有父节点 | parent(head) | 压入旧 head |
//! | redo | redo 栈非空 | 栈顶 | 弹出栈顶 |

use super::models::{HistoryError, HistoryGraph, HistoryResult};

impl<T> HistoryGraph<T> {
    pub fn can_undo(&self) -> bool {
        !self.head_node().is_root()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl<T: Clone> HistoryGraph<T> {
    /// 回到 head 的父节点，旧 head 压入 redo 栈
    ///
    /// redo 栈超过 `redo_limit` 时丢弃栈底（最早）的记录。
    pub fn undo(&self) -> HistoryResult<(Self, T)> {
        let current = self.head_node();
        let parent = current.parent_id.ok_or(HistoryError::AtRoot)?;

        let mut next = self.clone();
        next.head = parent;
        next.redo_stack.push(current.id);

        let limit = next.config.redo_limit;
        if next.redo_stack.len() > limit {
            let overflow = next.redo_stack.len() - limit;
            next.redo_stack.drain(..overflow);
            tracing::debug!("HistoryGraph: redo stack trimmed by {}", overflow);
        }

        tracing::debug!(
            "HistoryGraph: undo {} -> {} (redo depth={})",
            current.id,
            parent,
            next.redo_stack.len()
        );

        let state = next.head_state().clone();
        Ok((next, state))
    }

    /// 跳转到 redo 栈顶记录的节点
    ///
    /// 只做跳转，不会根据当前分支重新推导路径。
    pub fn redo(&self) -> HistoryResult<(Self, T)> {
        let mut next = self.clone();
        let target = next.redo_stack.pop().ok_or(HistoryError::NoRedo)?;
        next.head = target;

        tracing::debug!(
            "HistoryGraph: redo {} -> {} (redo depth={})",
            self.head,
            target,
            next.redo_stack.len()
        );

        let state = next.head_state().clone();
        Ok((next, state))
    }
}
