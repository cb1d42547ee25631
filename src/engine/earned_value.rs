// ==========================================
// 项目挣值管理系统 - 挣值 (EV) 计算
// ==========================================
// 取控制日期可见的最新挣值登记，直接读取 percent_complete（0..100）
// EV = BAC × percent_complete / 100，量化到 2 位
// ==========================================

use crate::domain::metrics::{quantize_money, quantize_ratio};
use crate::domain::records::EarnedValueEntry;
use crate::engine::visibility::select_current;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 挣值计算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedValueResult {
    pub earned_value_id: Option<String>,
    /// 完成比例 (0..1, 4 位)
    pub percent_complete: Decimal,
    pub earned_value: Decimal,
}

/// 计算单个成本要素的挣值
pub fn calculate_earned_value(
    entries: &[EarnedValueEntry],
    control_date: NaiveDate,
    budget_bac: Decimal,
) -> EarnedValueResult {
    match select_current(entries, control_date) {
        None => EarnedValueResult {
            earned_value_id: None,
            percent_complete: quantize_ratio(Decimal::ZERO),
            earned_value: quantize_money(Decimal::ZERO),
        },
        Some(entry) => {
            let fraction = entry.percent_complete / Decimal::ONE_HUNDRED;
            EarnedValueResult {
                earned_value_id: Some(entry.earned_value_id.clone()),
                percent_complete: quantize_ratio(fraction),
                earned_value: quantize_money(budget_bac * fraction),
            }
        }
    }
}
