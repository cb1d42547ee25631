// ==========================================
// 项目挣值管理系统 - 实际成本 (AC) 汇总
// ==========================================
// AC = Σ 可见成本登记金额
// 红线: 先求和、后量化（只量化一次），避免逐笔舍入漂移
// ==========================================

use crate::domain::metrics::quantize_money;
use crate::domain::records::CostRegistration;
use crate::engine::visibility::visible_records;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// 实际成本汇总结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualCostResult {
    pub actual_cost: Decimal,
    pub registration_count: usize,
}

/// 汇总单个成本要素的实际成本
pub fn calculate_actual_cost(
    registrations: &[CostRegistration],
    control_date: NaiveDate,
) -> ActualCostResult {
    let (sum, count) = visible_records(registrations, control_date)
        .fold((Decimal::ZERO, 0usize), |(sum, count), r| (sum + r.amount, count + 1));

    ActualCostResult {
        actual_cost: quantize_money(sum),
        registration_count: count,
    }
}
