// ==========================================
// 项目挣值管理系统 - 计划值 (PV) 计算
// ==========================================
// 输入: 成本要素全部进度计划 + 控制日期 + BAC
// 输出: percent_planned (4 位) + PV (2 位)
// 规则: PV = BAC × p，p 使用未量化的曲线值
// ==========================================

use crate::domain::metrics::{quantize_money, quantize_ratio};
use crate::domain::records::ScheduleEntry;
use crate::engine::progression::planned_fraction;
use crate::engine::visibility::select_current;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 计划值计算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedValueResult {
    /// 采用的进度计划（None = 无可见计划）
    pub schedule_id: Option<String>,
    pub percent_planned: Decimal,
    pub planned_value: Decimal,
}

impl PlannedValueResult {
    fn none() -> Self {
        Self {
            schedule_id: None,
            percent_planned: quantize_ratio(Decimal::ZERO),
            planned_value: quantize_money(Decimal::ZERO),
        }
    }
}

/// 计算单个成本要素的计划值
///
/// # 参数
/// - `schedules`: 成本要素的全部进度计划（未过滤）
/// - `control_date`: 控制日期
/// - `budget_bac`: 完工预算
pub fn calculate_planned_value(
    schedules: &[ScheduleEntry],
    control_date: NaiveDate,
    budget_bac: Decimal,
) -> PlannedValueResult {
    let schedule = match select_current(schedules, control_date) {
        Some(s) => s,
        None => return PlannedValueResult::none(),
    };

    let fraction = planned_fraction(
        schedule.progression_type,
        schedule.start_date,
        schedule.end_date,
        control_date,
    );

    PlannedValueResult {
        schedule_id: Some(schedule.schedule_id.clone()),
        percent_planned: quantize_ratio(fraction),
        planned_value: quantize_money(budget_bac * fraction),
    }
}
