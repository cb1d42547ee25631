use crate::domain::baseline::{Baseline, BaselineSnapshotRow, BaselineSnapshotSet};
use crate::domain::metrics::EvmMetrics;
use crate::domain::records::ProjectRecordSet;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::evm_record_repo::load_project_record_set;
use crate::repository::row_codec::{format_date, format_timestamp};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 整体替换请求
#[derive(Debug, Clone)]
pub struct BaselineReplacement {
    pub baseline_id: String,
    /// 调用方读取到的修订号；事务内不一致即为快照冲突
    pub expected_revision: i32,
    pub control_date: NaiveDate,
    pub description: Option<String>,
    pub config_snapshot_json: Option<String>,
    pub replaced_at: NaiveDateTime,
}

// ==========================================
// BaselineRepository - 基线仓储
// ==========================================
pub struct BaselineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BaselineRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建基线并写入快照
    ///
    /// # 参数
    /// - `baseline`: 基线元数据（revision 应为 0）
    /// - `build`: 由记录集计算全部层级指标（纯计算，在事务内调用）
    ///
    /// # 返回
    /// 已提交的基线与快照行
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 项目不存在
    /// - 任一步失败时事务整体回滚，不留下部分快照
    pub fn create_with_snapshot<F>(&self, baseline: &Baseline, build: F) -> RepositoryResult<BaselineSnapshotSet>
    where
        F: FnOnce(&ProjectRecordSet) -> Vec<EvmMetrics>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let records = load_project_record_set(&tx, &baseline.project_id)?;
        let metrics = build(&records);

        tx.execute(
            r#"
            INSERT INTO baseline (
                baseline_id, project_id, control_date, description, created_by,
                created_at, revision, config_snapshot_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                baseline.baseline_id,
                baseline.project_id,
                format_date(baseline.control_date),
                baseline.description,
                baseline.created_by,
                format_timestamp(baseline.created_at),
                baseline.revision,
                baseline.config_snapshot_json,
            ],
        )?;

        let rows = insert_snapshot_rows(&tx, &baseline.baseline_id, metrics, baseline.created_at)?;
        tx.commit()?;

        Ok(BaselineSnapshotSet {
            baseline: baseline.clone(),
            rows,
        })
    }

    /// 整体替换基线快照
    ///
    /// 删除旧快照行并重新生成，与修订号检查在同一事务内完成；
    /// 失败时旧快照保持原样。
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 基线不存在
    /// - `RepositoryError::BusinessRuleViolation`: 基线已作废
    /// - `RepositoryError::SnapshotConflict`: 修订号与调用方读取时不一致
    pub fn replace_with_snapshot<F>(
        &self,
        request: &BaselineReplacement,
        build: F,
    ) -> RepositoryResult<BaselineSnapshotSet>
    where
        F: FnOnce(&ProjectRecordSet) -> Vec<EvmMetrics>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = super::queries::find_baseline(&tx, &request.baseline_id)?
            .ok_or_else(|| RepositoryError::not_found("Baseline", &request.baseline_id))?;

        if current.is_cancelled() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "基线{}已作废，不能替换",
                request.baseline_id
            )));
        }
        if current.revision != request.expected_revision {
            return Err(RepositoryError::SnapshotConflict {
                baseline_id: request.baseline_id.clone(),
                expected: request.expected_revision,
                actual: current.revision,
            });
        }

        let records = load_project_record_set(&tx, &current.project_id)?;
        let metrics = build(&records);

        let updated = tx.execute(
            r#"UPDATE baseline
               SET control_date = ?, description = ?, config_snapshot_json = ?,
                   revision = revision + 1
               WHERE baseline_id = ? AND revision = ?"#,
            params![
                format_date(request.control_date),
                request.description,
                request.config_snapshot_json,
                request.baseline_id,
                request.expected_revision,
            ],
        )?;
        if updated != 1 {
            return Err(RepositoryError::SnapshotConflict {
                baseline_id: request.baseline_id.clone(),
                expected: request.expected_revision,
                actual: current.revision,
            });
        }

        tx.execute(
            "DELETE FROM baseline_snapshot WHERE baseline_id = ?",
            params![request.baseline_id],
        )?;
        let rows = insert_snapshot_rows(&tx, &request.baseline_id, metrics, request.replaced_at)?;
        tx.commit()?;

        Ok(BaselineSnapshotSet {
            baseline: Baseline {
                control_date: request.control_date,
                description: request.description.clone(),
                config_snapshot_json: request.config_snapshot_json.clone(),
                revision: current.revision + 1,
                ..current
            },
            rows,
        })
    }

    /// 作废基线（仅修改元数据，快照行保持不变）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 基线不存在
    /// - `RepositoryError::BusinessRuleViolation`: 基线已作废
    pub fn cancel(
        &self,
        baseline_id: &str,
        cancelled_by: &str,
        reason: Option<&str>,
        cancelled_at: NaiveDateTime,
    ) -> RepositoryResult<Baseline> {
        let conn = self.get_conn()?;

        let rows = conn.execute(
            r#"UPDATE baseline
               SET cancelled_at = ?, cancelled_by = ?, cancel_reason = ?
               WHERE baseline_id = ? AND cancelled_at IS NULL"#,
            params![format_timestamp(cancelled_at), cancelled_by, reason, baseline_id],
        )?;

        let baseline = super::queries::find_baseline(&conn, baseline_id)?
            .ok_or_else(|| RepositoryError::not_found("Baseline", baseline_id))?;

        if rows == 0 {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "基线{}已作废",
                baseline_id
            )));
        }
        Ok(baseline)
    }
}

/// 写入快照行（调用方负责事务）
///
/// 行按 (层级, 实体ID) 排序后写入并返回，与 `find_snapshot_rows` 的读取顺序一致
fn insert_snapshot_rows(
    tx: &Transaction<'_>,
    baseline_id: &str,
    mut metrics: Vec<EvmMetrics>,
    created_at: NaiveDateTime,
) -> RepositoryResult<Vec<BaselineSnapshotRow>> {
    metrics.sort_by(|a, b| (a.level, &a.entity_id).cmp(&(b.level, &b.entity_id)));

    let mut stmt = tx.prepare(
        r#"
        INSERT INTO baseline_snapshot (
            baseline_id, level, entity_id, parent_id, control_date,
            budget_bac, planned_value, earned_value, actual_cost, estimate_at_completion,
            cpi, spi, tcpi,
            cost_variance, schedule_variance, variance_at_completion,
            percent_planned, percent_complete, eac_source, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )?;

    let created_at_text = format_timestamp(created_at);
    let mut rows = Vec::with_capacity(metrics.len());
    for m in metrics {
        stmt.execute(params![
            baseline_id,
            m.level.to_db_str(),
            m.entity_id,
            m.parent_id,
            format_date(m.control_date),
            m.budget_bac.to_string(),
            m.planned_value.to_string(),
            m.earned_value.to_string(),
            m.actual_cost.to_string(),
            m.estimate_at_completion.to_string(),
            m.cpi.to_db_value(),
            m.spi.to_db_value(),
            m.tcpi.to_db_value(),
            m.cost_variance.to_string(),
            m.schedule_variance.to_string(),
            m.variance_at_completion.to_string(),
            m.percent_planned.to_string(),
            m.percent_complete.to_string(),
            m.eac_source.to_db_str(),
            created_at_text,
        ])?;
        rows.push(BaselineSnapshotRow {
            baseline_id: baseline_id.to_string(),
            metrics: m,
            created_at,
        });
    }

    Ok(rows)
}
