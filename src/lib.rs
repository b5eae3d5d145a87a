//! 标注工具版本历史引擎
//!
//! 为标注文件提供按实体隔离的版本图，主要功能包括：
//! - 提交、撤销、重做
//! - checkout 分叉
//! - 历史树投影
//! - 操作脚本回放

// 模块声明
pub mod history; // 版本历史核心模块
pub mod replay; // 操作脚本回放模块
pub mod utils; // 工具模块

pub use history::{
    project_graph, HistoryConfig, HistoryError, HistoryGraph, HistoryNode, HistoryProjection,
    HistoryResult, HistoryService, HistoryTreeNode, NodeId, VersionStore,
};
