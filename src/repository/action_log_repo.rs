// ==========================================
// 项目挣值管理系统 - 操作日志数据仓储
// ==========================================
// 表: action_log
// 红线: 基线的创建 / 替换 / 作废都必须留痕
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;
