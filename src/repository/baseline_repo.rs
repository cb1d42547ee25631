// ==========================================
// 项目挣值管理系统 - 基线数据仓储
// ==========================================
// 表: baseline (元数据) / baseline_snapshot (快照行)
// 红线: 快照的读取源记录、计算、写入在同一个 IMMEDIATE 事务内完成
// 红线: 快照行只插入/整体删除，不更新（数据库触发器兜底）
// ==========================================

mod core;
mod queries;


pub use self::core::{BaselineReplacement, BaselineRepository};
