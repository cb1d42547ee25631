// ==========================================
// 项目挣值管理系统 - 项目层级数据仓储
// ==========================================
// 实体: project / wbe / cost_element
// 可见性: 默认过滤软删除 (deleted_at IS NOT NULL) 的实体
// 说明: 实体维护由外部 CRUD 负责；insert_* 供初始化与测试使用
// ==========================================

use crate::domain::project::{CostElement, Project, Wbe};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_timestamp, parse_decimal, parse_optional_timestamp};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ProjectRepository - 项目层级仓储
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    pub fn insert_project(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO project (project_id, project_name, deleted_at) VALUES (?1, ?2, ?3)",
            params![
                project.project_id,
                project.project_name,
                project.deleted_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    pub fn insert_wbe(&self, wbe: &Wbe) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO wbe (wbe_id, project_id, wbe_name, deleted_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                wbe.wbe_id,
                wbe.project_id,
                wbe.wbe_name,
                wbe.deleted_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    pub fn insert_cost_element(&self, ce: &CostElement) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO cost_element (cost_element_id, wbe_id, cost_element_name, budget_bac, deleted_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                ce.cost_element_id,
                ce.wbe_id,
                ce.cost_element_name,
                ce.budget_bac.to_string(),
                ce.deleted_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    /// 软删除成本要素（已删除的不再更新删除时间）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 成本要素不存在或已删除
    pub fn soft_delete_cost_element(&self, cost_element_id: &str, deleted_at: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE cost_element SET deleted_at = ?1 WHERE cost_element_id = ?2 AND deleted_at IS NULL",
            params![format_timestamp(deleted_at), cost_element_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("CostElement", cost_element_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作（仅有效实体）
    // ==========================================

    /// 有效项目；层级内的 WBE / 成本要素经由记录集加载
    pub fn find_project(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        find_active_project(&conn, project_id)
    }
}

// ==========================================
// 连接级查询（可在事务内复用）
// ==========================================
// WBE 被软删除时，其下成本要素一并不可见；项目被软删除时整体不可见

pub(crate) fn find_active_project(conn: &Connection, project_id: &str) -> RepositoryResult<Option<Project>> {
    let project = conn
        .query_row(
            r#"SELECT project_id, project_name, deleted_at
               FROM project
               WHERE project_id = ?1 AND deleted_at IS NULL"#,
            params![project_id],
            map_project,
        )
        .optional()?;
    Ok(project)
}

pub(crate) fn find_active_wbe(conn: &Connection, wbe_id: &str) -> RepositoryResult<Option<Wbe>> {
    let wbe = conn
        .query_row(
            r#"SELECT w.wbe_id, w.project_id, w.wbe_name, w.deleted_at
               FROM wbe w
               JOIN project p ON p.project_id = w.project_id
               WHERE w.wbe_id = ?1 AND w.deleted_at IS NULL AND p.deleted_at IS NULL"#,
            params![wbe_id],
            map_wbe,
        )
        .optional()?;
    Ok(wbe)
}

pub(crate) fn find_active_cost_element(
    conn: &Connection,
    cost_element_id: &str,
) -> RepositoryResult<Option<CostElement>> {
    let ce = conn
        .query_row(
            r#"SELECT c.cost_element_id, c.wbe_id, c.cost_element_name, c.budget_bac, c.deleted_at
               FROM cost_element c
               JOIN wbe w ON w.wbe_id = c.wbe_id
               JOIN project p ON p.project_id = w.project_id
               WHERE c.cost_element_id = ?1
                 AND c.deleted_at IS NULL AND w.deleted_at IS NULL AND p.deleted_at IS NULL"#,
            params![cost_element_id],
            map_cost_element,
        )
        .optional()?;
    Ok(ce)
}

pub(crate) fn list_active_wbes(conn: &Connection, project_id: &str) -> RepositoryResult<Vec<Wbe>> {
    let mut stmt = conn.prepare(
        r#"SELECT wbe_id, project_id, wbe_name, deleted_at
           FROM wbe
           WHERE project_id = ?1 AND deleted_at IS NULL
           ORDER BY wbe_id"#,
    )?;
    let wbes = stmt
        .query_map(params![project_id], map_wbe)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(wbes)
}

pub(crate) fn list_active_cost_elements(conn: &Connection, wbe_id: &str) -> RepositoryResult<Vec<CostElement>> {
    let mut stmt = conn.prepare(
        r#"SELECT cost_element_id, wbe_id, cost_element_name, budget_bac, deleted_at
           FROM cost_element
           WHERE wbe_id = ?1 AND deleted_at IS NULL
           ORDER BY cost_element_id"#,
    )?;
    let ces = stmt
        .query_map(params![wbe_id], map_cost_element)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(ces)
}

fn map_project(row: &Row) -> SqliteResult<Project> {
    Ok(Project {
        project_id: row.get(0)?,
        project_name: row.get(1)?,
        deleted_at: parse_optional_timestamp(2, row.get(2)?)?,
    })
}

fn map_wbe(row: &Row) -> SqliteResult<Wbe> {
    Ok(Wbe {
        wbe_id: row.get(0)?,
        project_id: row.get(1)?,
        wbe_name: row.get(2)?,
        deleted_at: parse_optional_timestamp(3, row.get(3)?)?,
    })
}

fn map_cost_element(row: &Row) -> SqliteResult<CostElement> {
    let budget_raw: String = row.get(3)?;
    Ok(CostElement {
        cost_element_id: row.get(0)?,
        wbe_id: row.get(1)?,
        cost_element_name: row.get(2)?,
        budget_bac: parse_decimal(3, &budget_raw)?,
        deleted_at: parse_optional_timestamp(4, row.get(4)?)?,
    })
}
