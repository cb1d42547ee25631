use super::core::BaselineRepository;
use crate::domain::baseline::{Baseline, BaselineSnapshotRow, BaselineSnapshotSet};
use crate::domain::metrics::{EvmMetrics, IndexValue, TcpiValue};
use crate::domain::types::{EacSource, EvmLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    invalid_value, parse_date, parse_decimal, parse_optional_timestamp, parse_timestamp,
};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

const BASELINE_COLUMNS: &str = r#"
    baseline_id, project_id, control_date, description, created_by, created_at,
    revision, config_snapshot_json, cancelled_at, cancelled_by, cancel_reason
"#;

impl BaselineRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询基线（含已作废）
    pub fn find_by_id(&self, baseline_id: &str) -> RepositoryResult<Option<Baseline>> {
        let conn = self.get_conn()?;
        find_baseline(&conn, baseline_id)
    }

    /// 查询项目的基线列表（按创建时间倒序）
    pub fn list_by_project(&self, project_id: &str, include_cancelled: bool) -> RepositoryResult<Vec<Baseline>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"SELECT {} FROM baseline
               WHERE project_id = ?1 AND (?2 = 1 OR cancelled_at IS NULL)
               ORDER BY created_at DESC, baseline_id"#,
            BASELINE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let baselines = stmt
            .query_map(params![project_id, include_cancelled], map_baseline)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(baselines)
    }

    /// 查询基线的快照行
    ///
    /// 排序: 项目行 -> WBE 行 -> 成本要素行，同层按实体ID
    pub fn find_snapshot_rows(&self, baseline_id: &str) -> RepositoryResult<Vec<BaselineSnapshotRow>> {
        let conn = self.get_conn()?;
        snapshot_rows(&conn, baseline_id)
    }

    /// 查询基线及其完整快照（单个连接锁内读取，保证元数据与快照行一致）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 基线不存在
    pub fn find_snapshot_set(&self, baseline_id: &str) -> RepositoryResult<BaselineSnapshotSet> {
        let conn = self.get_conn()?;
        let baseline =
            find_baseline(&conn, baseline_id)?.ok_or_else(|| RepositoryError::not_found("Baseline", baseline_id))?;
        let rows = snapshot_rows(&conn, baseline_id)?;
        Ok(BaselineSnapshotSet { baseline, rows })
    }
}

pub(super) fn find_baseline(conn: &Connection, baseline_id: &str) -> RepositoryResult<Option<Baseline>> {
    let sql = format!("SELECT {} FROM baseline WHERE baseline_id = ?", BASELINE_COLUMNS);
    let baseline = conn
        .query_row(&sql, params![baseline_id], map_baseline)
        .optional()?;
    Ok(baseline)
}

fn snapshot_rows(conn: &Connection, baseline_id: &str) -> RepositoryResult<Vec<BaselineSnapshotRow>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT baseline_id, level, entity_id, parent_id, control_date,
               budget_bac, planned_value, earned_value, actual_cost, estimate_at_completion,
               cpi, spi, tcpi,
               cost_variance, schedule_variance, variance_at_completion,
               percent_planned, percent_complete, eac_source, created_at
        FROM baseline_snapshot
        WHERE baseline_id = ?
        ORDER BY CASE level
                     WHEN 'project' THEN 0
                     WHEN 'wbe' THEN 1
                     ELSE 2
                 END,
                 entity_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![baseline_id], map_snapshot_row)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

// ==========================================
// 行映射
// ==========================================

fn map_baseline(row: &Row) -> SqliteResult<Baseline> {
    let control_date: String = row.get(2)?;
    let created_at: String = row.get(5)?;

    Ok(Baseline {
        baseline_id: row.get(0)?,
        project_id: row.get(1)?,
        control_date: parse_date(2, &control_date)?,
        description: row.get(3)?,
        created_by: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
        revision: row.get(6)?,
        config_snapshot_json: row.get(7)?,
        cancelled_at: parse_optional_timestamp(8, row.get(8)?)?,
        cancelled_by: row.get(9)?,
        cancel_reason: row.get(10)?,
    })
}

fn decimal_col(row: &Row, idx: usize) -> SqliteResult<rust_decimal::Decimal> {
    let raw: String = row.get(idx)?;
    parse_decimal(idx, &raw)
}

fn map_snapshot_row(row: &Row) -> SqliteResult<BaselineSnapshotRow> {
    let level_raw: String = row.get(1)?;
    let level =
        EvmLevel::parse(&level_raw).ok_or_else(|| invalid_value(1, format!("未知的层级: {}", level_raw)))?;

    let control_date: String = row.get(4)?;

    let cpi_raw: Option<String> = row.get(10)?;
    let spi_raw: Option<String> = row.get(11)?;
    let tcpi_raw: Option<String> = row.get(12)?;
    let cpi = IndexValue::from_db_value(cpi_raw.as_deref()).map_err(|e| invalid_value(10, e))?;
    let spi = IndexValue::from_db_value(spi_raw.as_deref()).map_err(|e| invalid_value(11, e))?;
    let tcpi = TcpiValue::from_db_value(tcpi_raw.as_deref()).map_err(|e| invalid_value(12, e))?;

    let source_raw: String = row.get(18)?;
    let eac_source = EacSource::parse(&source_raw)
        .ok_or_else(|| invalid_value(18, format!("未知的EAC来源: {}", source_raw)))?;

    let created_at: String = row.get(19)?;

    Ok(BaselineSnapshotRow {
        baseline_id: row.get(0)?,
        metrics: EvmMetrics {
            entity_id: row.get(2)?,
            level,
            parent_id: row.get(3)?,
            control_date: parse_date(4, &control_date)?,
            budget_bac: decimal_col(row, 5)?,
            planned_value: decimal_col(row, 6)?,
            earned_value: decimal_col(row, 7)?,
            actual_cost: decimal_col(row, 8)?,
            estimate_at_completion: decimal_col(row, 9)?,
            cpi,
            spi,
            tcpi,
            cost_variance: decimal_col(row, 13)?,
            schedule_variance: decimal_col(row, 14)?,
            variance_at_completion: decimal_col(row, 15)?,
            percent_planned: decimal_col(row, 16)?,
            percent_complete: decimal_col(row, 17)?,
            eac_source,
        },
        created_at: parse_timestamp(19, &created_at)?,
    })
}
