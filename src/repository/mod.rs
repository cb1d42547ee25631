// ==========================================
// 项目挣值管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含 EVM 计算逻辑（快照生成由调用方传入的计算闭包完成）
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod baseline_repo;
pub mod error;
pub mod evm_record_repo;
pub mod project_repo;
pub mod row_codec;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use baseline_repo::{BaselineReplacement, BaselineRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use evm_record_repo::EvmRecordRepository;
pub use project_repo::ProjectRepository;
