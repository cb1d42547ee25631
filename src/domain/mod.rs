// ==========================================
// 项目挣值管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、原始记录、指标与基线类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod baseline;
pub mod comparison;
pub mod metrics;
pub mod project;
pub mod records;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use baseline::{Baseline, BaselineMetadata, BaselineSnapshotRow, BaselineSnapshotSet};
pub use comparison::{DeltaPresence, EntityDelta, IndexPair, MetricsComparison, TcpiPair};
pub use metrics::{
    quantize_money, quantize_ratio, EvmIndices, EvmMetrics, EvmTotals, IndexValue, TcpiValue,
};
pub use project::{CostElement, Project, Wbe};
pub use records::{
    CostElementRecordSet, CostRegistration, EarnedValueEntry, Forecast, ProjectRecordSet,
    ScheduleEntry, WbeRecordSet,
};
pub use types::{EacSource, EvmLevel, ProgressionType, RecordKind};
