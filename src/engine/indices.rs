// ==========================================
// 项目挣值管理系统 - EVM 指数计算器
// ==========================================
// 输入: 任一层级的已汇总金额 (PV / EV / AC / BAC / EAC)
// 输出: CPI / SPI / TCPI / CV / SV / VAC
// 红线: 零分母不报错，返回哨兵；0 是合法指数值，不得充当哨兵
// ==========================================

use crate::domain::metrics::{quantize_money, EvmIndices, EvmTotals, IndexValue, TcpiValue};
use rust_decimal::Decimal;

// ==========================================
// EvmIndexCalculator - 指数计算器
// ==========================================
pub struct EvmIndexCalculator {
    // 无状态
}

impl EvmIndexCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算全部指数与偏差
    ///
    /// # 参数
    /// - `totals`: 汇总层产出的金额（已量化）
    pub fn calculate(&self, totals: &EvmTotals) -> EvmIndices {
        EvmIndices {
            cpi: Self::cost_performance_index(totals.earned_value, totals.actual_cost),
            spi: Self::schedule_performance_index(totals.earned_value, totals.planned_value),
            tcpi: Self::to_complete_performance_index(
                totals.budget_bac,
                totals.earned_value,
                totals.actual_cost,
            ),
            cost_variance: quantize_money(totals.earned_value - totals.actual_cost),
            schedule_variance: quantize_money(totals.earned_value - totals.planned_value),
            variance_at_completion: quantize_money(
                totals.budget_bac - totals.estimate_at_completion,
            ),
        }
    }

    /// CPI = EV / AC
    ///
    /// AC = 0 时不可计算（EV 为 0 亦然，不采用 CPI = 1 约定）
    pub fn cost_performance_index(earned_value: Decimal, actual_cost: Decimal) -> IndexValue {
        if actual_cost.is_zero() {
            return IndexValue::Unavailable;
        }
        IndexValue::from_ratio(earned_value / actual_cost)
    }

    /// SPI = EV / PV，PV = 0 时不可计算
    pub fn schedule_performance_index(earned_value: Decimal, planned_value: Decimal) -> IndexValue {
        if planned_value.is_zero() {
            return IndexValue::Unavailable;
        }
        IndexValue::from_ratio(earned_value / planned_value)
    }

    /// TCPI = (BAC - EV) / (BAC - AC)
    ///
    /// BAC ≤ AC（剩余预算耗尽或为负）统一判定为超支，在除法之前检查
    pub fn to_complete_performance_index(
        budget_bac: Decimal,
        earned_value: Decimal,
        actual_cost: Decimal,
    ) -> TcpiValue {
        if budget_bac <= actual_cost {
            return TcpiValue::Overrun;
        }
        TcpiValue::from_ratio((budget_bac - earned_value) / (budget_bac - actual_cost))
    }
}

impl Default for EvmIndexCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn totals(bac: &str, pv: &str, ev: &str, ac: &str) -> EvmTotals {
        EvmTotals {
            budget_bac: d(bac),
            planned_value: d(pv),
            earned_value: d(ev),
            actual_cost: d(ac),
            estimate_at_completion: d(bac),
        }
    }

    #[test]
    fn test_scenario_indices() {
        let calc = EvmIndexCalculator::new();
        let idx = calc.calculate(&totals("1000.00", "498.63", "400.00", "420.00"));

        assert_eq!(idx.cost_variance.to_string(), "-20.00");
        assert_eq!(idx.schedule_variance.to_string(), "-98.63");
        assert_eq!(idx.cpi, IndexValue::Value(d("0.9524")));
        assert_eq!(idx.spi, IndexValue::Value(d("0.8022")));
        // (1000 - 400) / (1000 - 420) = 1.034482...
        assert_eq!(idx.tcpi, TcpiValue::Value(d("1.0345")));
        assert_eq!(idx.variance_at_completion.to_string(), "0.00");
    }

    #[test]
    fn test_cpi_unavailable_without_cost() {
        assert_eq!(
            EvmIndexCalculator::cost_performance_index(d("50"), Decimal::ZERO),
            IndexValue::Unavailable
        );
        assert_eq!(
            EvmIndexCalculator::cost_performance_index(Decimal::ZERO, Decimal::ZERO),
            IndexValue::Unavailable
        );
        // EV = 0, AC > 0: CPI 为 0，而不是不可计算
        assert_eq!(
            EvmIndexCalculator::cost_performance_index(Decimal::ZERO, d("10")),
            IndexValue::Value(d("0.0000"))
        );
    }

    #[test]
    fn test_spi_unavailable_without_plan() {
        assert_eq!(
            EvmIndexCalculator::schedule_performance_index(d("80"), Decimal::ZERO),
            IndexValue::Unavailable
        );
    }

    #[test]
    fn test_tcpi_overrun_when_budget_exhausted() {
        assert_eq!(
            EvmIndexCalculator::to_complete_performance_index(d("100"), d("60"), d("100")),
            TcpiValue::Overrun
        );
        assert_eq!(
            EvmIndexCalculator::to_complete_performance_index(d("100"), d("60"), d("150")),
            TcpiValue::Overrun
        );
    }

    #[test]
    fn test_fully_spent_and_earned_element() {
        let idx = EvmIndexCalculator::new().calculate(&totals("500.00", "500.00", "500.00", "500.00"));
        assert!(idx.tcpi.is_overrun());
        assert_eq!(idx.cost_variance.to_string(), "0.00");
        assert_eq!(idx.cpi, IndexValue::Value(d("1.0000")));
    }

    #[test]
    fn test_variance_at_completion_uses_eac() {
        let mut t = totals("1000.00", "0.00", "0.00", "0.00");
        t.estimate_at_completion = d("1250.00");
        let idx = EvmIndexCalculator::new().calculate(&t);
        assert_eq!(idx.variance_at_completion.to_string(), "-250.00");
        assert_eq!(idx.tcpi, TcpiValue::Value(d("1.0000")));
    }
}
