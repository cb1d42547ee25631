use super::core::EvmRecordRepository;
use crate::domain::records::{CostRegistration, EarnedValueEntry, Forecast, ScheduleEntry};
use crate::domain::types::ProgressionType;
use crate::repository::error::RepositoryResult;
use crate::repository::row_codec::{invalid_value, parse_date, parse_decimal, parse_timestamp};
use rusqlite::{params, Connection, Result as SqliteResult, Row};

impl EvmRecordRepository {
    // ==========================================
    // 查询操作（按成本要素）
    // ==========================================

    /// 成本要素的全部进度计划
    pub fn find_schedules_by_cost_element(&self, cost_element_id: &str) -> RepositoryResult<Vec<ScheduleEntry>> {
        let conn = self.get_conn()?;
        schedules_for(&conn, cost_element_id)
    }

    /// 成本要素的全部挣值登记
    pub fn find_earned_values_by_cost_element(
        &self,
        cost_element_id: &str,
    ) -> RepositoryResult<Vec<EarnedValueEntry>> {
        let conn = self.get_conn()?;
        earned_values_for(&conn, cost_element_id)
    }

    /// 成本要素的全部成本登记
    pub fn find_cost_registrations_by_cost_element(
        &self,
        cost_element_id: &str,
    ) -> RepositoryResult<Vec<CostRegistration>> {
        let conn = self.get_conn()?;
        cost_registrations_for(&conn, cost_element_id)
    }

    /// 成本要素的全部完工预测
    pub fn find_forecasts_by_cost_element(&self, cost_element_id: &str) -> RepositoryResult<Vec<Forecast>> {
        let conn = self.get_conn()?;
        forecasts_for(&conn, cost_element_id)
    }
}

// ==========================================
// 连接级查询（可在事务内复用）
// ==========================================
// 结果按 (生效日期, created_at, id) 排序，保证同输入同输出

pub(super) fn schedules_for(conn: &Connection, cost_element_id: &str) -> RepositoryResult<Vec<ScheduleEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT schedule_id, cost_element_id, registration_date, created_at,
               start_date, end_date, progression_type
        FROM schedule_entry
        WHERE cost_element_id = ?
        ORDER BY registration_date, created_at, schedule_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![cost_element_id], map_schedule)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

pub(super) fn earned_values_for(conn: &Connection, cost_element_id: &str) -> RepositoryResult<Vec<EarnedValueEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT earned_value_id, cost_element_id, completion_date, created_at, percent_complete
        FROM earned_value_entry
        WHERE cost_element_id = ?
        ORDER BY completion_date, created_at, earned_value_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![cost_element_id], map_earned_value)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

pub(super) fn cost_registrations_for(
    conn: &Connection,
    cost_element_id: &str,
) -> RepositoryResult<Vec<CostRegistration>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT cost_registration_id, cost_element_id, registration_date, created_at, amount
        FROM cost_registration
        WHERE cost_element_id = ?
        ORDER BY registration_date, created_at, cost_registration_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![cost_element_id], map_cost_registration)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

pub(super) fn forecasts_for(conn: &Connection, cost_element_id: &str) -> RepositoryResult<Vec<Forecast>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT forecast_id, cost_element_id, forecast_date, created_at, estimate_at_completion
        FROM forecast
        WHERE cost_element_id = ?
        ORDER BY forecast_date, created_at, forecast_id
        "#,
    )?;
    let rows = stmt
        .query_map(params![cost_element_id], map_forecast)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(rows)
}

// ==========================================
// 行映射
// ==========================================

fn map_schedule(row: &Row) -> SqliteResult<ScheduleEntry> {
    let registration_date: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let start_date: String = row.get(4)?;
    let end_date: String = row.get(5)?;
    let progression_raw: String = row.get(6)?;

    let progression_type = ProgressionType::parse(&progression_raw)
        .ok_or_else(|| invalid_value(6, format!("未知的进度曲线类型: {}", progression_raw)))?;

    Ok(ScheduleEntry {
        schedule_id: row.get(0)?,
        cost_element_id: row.get(1)?,
        registration_date: parse_date(2, &registration_date)?,
        created_at: parse_timestamp(3, &created_at)?,
        start_date: parse_date(4, &start_date)?,
        end_date: parse_date(5, &end_date)?,
        progression_type,
    })
}

fn map_earned_value(row: &Row) -> SqliteResult<EarnedValueEntry> {
    let completion_date: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let percent: String = row.get(4)?;

    Ok(EarnedValueEntry {
        earned_value_id: row.get(0)?,
        cost_element_id: row.get(1)?,
        completion_date: parse_date(2, &completion_date)?,
        created_at: parse_timestamp(3, &created_at)?,
        percent_complete: parse_decimal(4, &percent)?,
    })
}

fn map_cost_registration(row: &Row) -> SqliteResult<CostRegistration> {
    let registration_date: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let amount: String = row.get(4)?;

    Ok(CostRegistration {
        cost_registration_id: row.get(0)?,
        cost_element_id: row.get(1)?,
        registration_date: parse_date(2, &registration_date)?,
        created_at: parse_timestamp(3, &created_at)?,
        amount: parse_decimal(4, &amount)?,
    })
}

fn map_forecast(row: &Row) -> SqliteResult<Forecast> {
    let forecast_date: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let eac: String = row.get(4)?;

    Ok(Forecast {
        forecast_id: row.get(0)?,
        cost_element_id: row.get(1)?,
        forecast_date: parse_date(2, &forecast_date)?,
        created_at: parse_timestamp(3, &created_at)?,
        estimate_at_completion: parse_decimal(4, &eac)?,
    })
}
