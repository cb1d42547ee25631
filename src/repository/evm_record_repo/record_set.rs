use super::core::EvmRecordRepository;
use super::queries::{cost_registrations_for, earned_values_for, forecasts_for, schedules_for};
use crate::domain::project::{CostElement, Wbe};
use crate::domain::records::{CostElementRecordSet, ProjectRecordSet, WbeRecordSet};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::project_repo::{
    find_active_cost_element, find_active_project, find_active_wbe, list_active_cost_elements,
    list_active_wbes,
};
use rusqlite::Connection;

impl EvmRecordRepository {
    // ==========================================
    // 记录集加载（实体可见性 + 全部原始记录）
    // ==========================================
    // 同一次加载在单个连接锁内完成，避免读到半途写入

    /// 加载项目记录集
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 项目不存在或已软删除
    pub fn load_project_record_set(&self, project_id: &str) -> RepositoryResult<ProjectRecordSet> {
        let conn = self.get_conn()?;
        load_project_record_set(&conn, project_id)
    }

    /// 加载 WBE 记录集
    pub fn load_wbe_record_set(&self, wbe_id: &str) -> RepositoryResult<WbeRecordSet> {
        let conn = self.get_conn()?;
        let wbe = find_active_wbe(&conn, wbe_id)?.ok_or_else(|| RepositoryError::not_found("Wbe", wbe_id))?;
        load_wbe(&conn, wbe)
    }

    /// 加载成本要素记录集
    pub fn load_cost_element_record_set(&self, cost_element_id: &str) -> RepositoryResult<CostElementRecordSet> {
        let conn = self.get_conn()?;
        let ce = find_active_cost_element(&conn, cost_element_id)?
            .ok_or_else(|| RepositoryError::not_found("CostElement", cost_element_id))?;
        load_cost_element(&conn, ce)
    }
}

/// 在给定连接（或事务）上加载项目记录集
pub(crate) fn load_project_record_set(conn: &Connection, project_id: &str) -> RepositoryResult<ProjectRecordSet> {
    let project =
        find_active_project(conn, project_id)?.ok_or_else(|| RepositoryError::not_found("Project", project_id))?;

    let mut wbes = Vec::new();
    for wbe in list_active_wbes(conn, project_id)? {
        wbes.push(load_wbe(conn, wbe)?);
    }

    Ok(ProjectRecordSet { project, wbes })
}

fn load_wbe(conn: &Connection, wbe: Wbe) -> RepositoryResult<WbeRecordSet> {
    let mut cost_elements = Vec::new();
    for ce in list_active_cost_elements(conn, &wbe.wbe_id)? {
        cost_elements.push(load_cost_element(conn, ce)?);
    }
    Ok(WbeRecordSet { wbe, cost_elements })
}

fn load_cost_element(conn: &Connection, cost_element: CostElement) -> RepositoryResult<CostElementRecordSet> {
    let id = cost_element.cost_element_id.clone();
    let mut set = CostElementRecordSet::new(cost_element);
    set.schedules = schedules_for(conn, &id)?;
    set.earned_values = earned_values_for(conn, &id)?;
    set.cost_registrations = cost_registrations_for(conn, &id)?;
    set.forecasts = forecasts_for(conn, &id)?;
    Ok(set)
}
