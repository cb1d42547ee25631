// ==========================================
// 项目挣值管理系统 - API 层
// ==========================================
// 职责: 对外提供 EVM 查询与基线操作接口，负责入参解析与错误转换
// ==========================================

pub mod baseline_api;
pub mod error;
pub mod evm_api;

// 重导出核心类型
pub use baseline_api::BaselineApi;
pub use error::{parse_control_date, ApiError, ApiResult};
pub use evm_api::{EvmApi, EvmMetricsResponse, EvmTreeResponse, WbeTreeResponse};
