use crate::domain::records::{CostRegistration, EarnedValueEntry, Forecast, ScheduleEntry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{format_date, format_timestamp};
use rust_decimal::Decimal;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// EvmRecordRepository - 时间切片记录仓储
// ==========================================
pub struct EvmRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EvmRecordRepository {
    /// 创建新的记录仓储
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
    // created_at 由调用方给出（录入时间），仓储不读取系统时钟

    /// 插入进度计划
    pub fn insert_schedule(&self, entry: &ScheduleEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO schedule_entry (
                schedule_id, cost_element_id, registration_date, created_at,
                start_date, end_date, progression_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.schedule_id,
                entry.cost_element_id,
                format_date(entry.registration_date),
                format_timestamp(entry.created_at),
                format_date(entry.start_date),
                format_date(entry.end_date),
                entry.progression_type.to_db_str(),
            ],
        )?;
        Ok(())
    }

    /// 插入挣值登记
    pub fn insert_earned_value(&self, entry: &EarnedValueEntry) -> RepositoryResult<()> {
        if entry.percent_complete < Decimal::ZERO || entry.percent_complete > Decimal::ONE_HUNDRED {
            return Err(RepositoryError::FieldValueError {
                field: "percent_complete".to_string(),
                message: format!("完成百分比 {} 超出 0..100", entry.percent_complete),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO earned_value_entry (
                earned_value_id, cost_element_id, completion_date, created_at, percent_complete
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                entry.earned_value_id,
                entry.cost_element_id,
                format_date(entry.completion_date),
                format_timestamp(entry.created_at),
                entry.percent_complete.to_string(),
            ],
        )?;
        Ok(())
    }

    /// 插入成本登记
    pub fn insert_cost_registration(&self, registration: &CostRegistration) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO cost_registration (
                cost_registration_id, cost_element_id, registration_date, created_at, amount
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                registration.cost_registration_id,
                registration.cost_element_id,
                format_date(registration.registration_date),
                format_timestamp(registration.created_at),
                registration.amount.to_string(),
            ],
        )?;
        Ok(())
    }

    /// 批量插入成本登记
    pub fn batch_insert_cost_registrations(
        &self,
        registrations: &[CostRegistration],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for registration in registrations {
            tx.execute(
                r#"
                INSERT INTO cost_registration (
                    cost_registration_id, cost_element_id, registration_date, created_at, amount
                ) VALUES (?, ?, ?, ?, ?)
                "#,
                params![
                    registration.cost_registration_id,
                    registration.cost_element_id,
                    format_date(registration.registration_date),
                    format_timestamp(registration.created_at),
                    registration.amount.to_string(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 插入完工预测
    pub fn insert_forecast(&self, forecast: &Forecast) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO forecast (
                forecast_id, cost_element_id, forecast_date, created_at, estimate_at_completion
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                forecast.forecast_id,
                forecast.cost_element_id,
                format_date(forecast.forecast_date),
                format_timestamp(forecast.created_at),
                forecast.estimate_at_completion.to_string(),
            ],
        )?;
        Ok(())
    }
}
