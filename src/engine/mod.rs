// ==========================================
// 项目挣值管理系统 - 引擎层
// ==========================================
// 职责: 实现 EVM 计算规则与基线快照流程,不拼 SQL
// 红线: 计算函数为纯函数，控制日期始终显式传入
// ==========================================

pub mod actual_cost;
pub mod aggregation;
pub mod baseline_snapshot;
pub mod comparison;
pub mod cost_element;
pub mod earned_value;
pub mod evm;
pub mod forecast;
pub mod indices;
pub mod planned_value;
pub mod progression;
pub mod repositories;
pub mod visibility;

// 重导出核心引擎
pub use aggregation::{HierarchicalAggregator, LevelFigures};
pub use baseline_snapshot::BaselineSnapshotService;
pub use comparison::MetricsComparisonEngine;
pub use evm::{EvmEngine, ProjectEvmTree, WbeEvmNode};
pub use indices::EvmIndexCalculator;
pub use repositories::EvmRepositories;
pub use visibility::{is_visible, select_current, visible_records};
