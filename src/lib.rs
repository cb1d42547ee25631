// ==========================================
// 项目挣值管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按控制日期计算 EVM 指标，并冻结为不可变基线快照
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - EVM 计算与基线快照
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EacSource, EvmLevel, ProgressionType, RecordKind};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Baseline, BaselineSnapshotSet, CostElement, EvmMetrics, IndexValue,
    Project, TcpiValue, Wbe,
};

// 引擎
pub use engine::{BaselineSnapshotService, EvmEngine, HierarchicalAggregator, EvmIndexCalculator};

// API
pub use api::{ApiError, ApiResult, BaselineApi, EvmApi, EvmMetricsResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "项目挣值管理系统";
