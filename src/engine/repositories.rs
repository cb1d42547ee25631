// ==========================================
// 项目挣值管理系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合 EVM 查询与基线快照所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{ActionLogRepository, BaselineRepository, EvmRecordRepository, ProjectRepository};

/// EVM 仓储集合
///
/// # 包含的仓储
/// - `project_repo`: 项目 / WBE / 成本要素
/// - `record_repo`: 进度计划、挣值、成本、预测四类时间切片记录
/// - `baseline_repo`: 基线元数据与快照行
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct EvmRepositories {
    pub project_repo: Arc<ProjectRepository>,
    pub record_repo: Arc<EvmRecordRepository>,
    pub baseline_repo: Arc<BaselineRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl EvmRepositories {
    /// 基于同一个共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            project_repo: Arc::new(ProjectRepository::new(conn.clone())),
            record_repo: Arc::new(EvmRecordRepository::new(conn.clone())),
            baseline_repo: Arc::new(BaselineRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn)),
        }
    }

    pub fn project_repo(&self) -> &Arc<ProjectRepository> {
        &self.project_repo
    }

    pub fn record_repo(&self) -> &Arc<EvmRecordRepository> {
        &self.record_repo
    }

    pub fn baseline_repo(&self) -> &Arc<BaselineRepository> {
        &self.baseline_repo
    }

    pub fn action_log_repo(&self) -> &Arc<ActionLogRepository> {
        &self.action_log_repo
    }
}
