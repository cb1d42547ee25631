use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use crate::repository::row_codec::parse_timestamp;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let log = conn
            .query_row(
                r#"
                SELECT action_id, project_id, baseline_id, action_type, action_ts,
                       actor, payload_json, detail
                FROM action_log
                WHERE action_id = ?
                "#,
                params![action_id],
                map_row,
            )
            .optional()?;

        Ok(log)
    }

    /// 查询指定基线的所有操作日志（按时间先后）
    pub fn find_by_baseline_id(&self, baseline_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, project_id, baseline_id, action_type, action_ts,
                   actor, payload_json, detail
            FROM action_log
            WHERE baseline_id = ?
            ORDER BY action_ts ASC, action_id ASC
            "#,
        )?;

        let logs = stmt
            .query_map(params![baseline_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定项目的操作日志（最新在前）
    pub fn find_by_project_id(&self, project_id: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, project_id, baseline_id, action_type, action_ts,
                   actor, payload_json, detail
            FROM action_log
            WHERE project_id = ?
            ORDER BY action_ts DESC, action_id DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![project_id, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, project_id, baseline_id, action_type, action_ts,
                   actor, payload_json, detail
            FROM action_log
            ORDER BY action_ts DESC, action_id DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计指定基线的操作总数
    pub fn count_by_baseline(&self, baseline_id: &str) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;

        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE baseline_id = ?",
            params![baseline_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}

// ==========================================
// 辅助方法
// ==========================================

/// 将数据库行映射为 ActionLog 实体
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let action_ts_str: String = row.get(4)?;
    let payload_json_str: Option<String> = row.get(6)?;

    // 解析 JSON 字段（损坏的 payload 不影响日志本身的读取）
    let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

    Ok(ActionLog {
        action_id: row.get(0)?,
        project_id: row.get(1)?,
        baseline_id: row.get(2)?,
        action_type: row.get(3)?,
        action_ts: parse_timestamp(4, &action_ts_str)?,
        actor: row.get(5)?,
        payload_json,
        detail: row.get(7)?,
    })
}
