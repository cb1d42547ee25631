// ==========================================
// 项目挣值管理系统 - 成本要素计算
// ==========================================
// 对单个成本要素依次执行: PV → EV → AC → EAC
// 输出作为层级汇总的叶子输入
// ==========================================

use crate::domain::metrics::{quantize_money, EvmTotals};
use crate::domain::records::CostElementRecordSet;
use crate::domain::types::EvmLevel;
use crate::engine::actual_cost::calculate_actual_cost;
use crate::engine::aggregation::LevelFigures;
use crate::engine::earned_value::calculate_earned_value;
use crate::engine::forecast::resolve_estimate_at_completion;
use crate::engine::planned_value::calculate_planned_value;
use chrono::NaiveDate;

/// 单个成本要素的计算结果（附采用的记录，便于追溯）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostElementEvaluation {
    pub figures: LevelFigures,
    pub schedule_id: Option<String>,
    pub earned_value_id: Option<String>,
    pub forecast_id: Option<String>,
    pub registration_count: usize,
}

/// 计算单个成本要素在控制日期的金额与完成度
pub fn evaluate_cost_element(
    records: &CostElementRecordSet,
    control_date: NaiveDate,
) -> CostElementEvaluation {
    let ce = &records.cost_element;
    let bac = ce.budget_bac;

    let pv = calculate_planned_value(&records.schedules, control_date, bac);
    let ev = calculate_earned_value(&records.earned_values, control_date, bac);
    let ac = calculate_actual_cost(&records.cost_registrations, control_date);
    let eac = resolve_estimate_at_completion(&records.forecasts, control_date, bac);

    tracing::trace!(
        cost_element_id = %ce.cost_element_id,
        %control_date,
        pv = %pv.planned_value,
        ev = %ev.earned_value,
        ac = %ac.actual_cost,
        "成本要素计算完成"
    );

    CostElementEvaluation {
        figures: LevelFigures {
            entity_id: ce.cost_element_id.clone(),
            level: EvmLevel::CostElement,
            parent_id: Some(ce.wbe_id.clone()),
            totals: EvmTotals {
                budget_bac: quantize_money(bac),
                planned_value: pv.planned_value,
                earned_value: ev.earned_value,
                actual_cost: ac.actual_cost,
                estimate_at_completion: eac.estimate_at_completion,
            },
            percent_planned: pv.percent_planned,
            percent_complete: ev.percent_complete,
            eac_source: eac.source,
        },
        schedule_id: pv.schedule_id,
        earned_value_id: ev.earned_value_id,
        forecast_id: eac.forecast_id,
        registration_count: ac.registration_count,
    }
}
