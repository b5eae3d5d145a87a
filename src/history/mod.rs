//! 版本历史模块
//!
//! 为每个被编辑的实体（标注文件）维护类似 Git 的版本图，支持：
//! - 提交新版本
//! - 撤销 / 重做
//! - checkout 到任意历史版本（分叉，不删除历史）
//! - 生成可渲染的历史树

mod check;
mod checkout;
mod commit;
mod config;
mod models;
mod service;
mod store;
mod tree;
mod undo_redo;

pub use config::{HistoryConfig, TIMESTAMP_PLACEHOLDER};
pub use models::{
    Ancestors, GraphSignature, HistoryError, HistoryGraph, HistoryNode, HistoryResult, NodeId,
};
pub use service::HistoryService;
pub use store::VersionStore;
pub use tree::{project_graph, HistoryProjection, HistoryTreeNode};
