// ==========================================
// 项目挣值管理系统 - 层级汇总器
// ==========================================
// 层级: 成本要素 → WBE → 项目
// 规则: 上级金额 = 下级已量化金额之和 (BAC / PV / EV / AC / EAC)
// 规则: 完成度 = EV / BAC，计划完成度 = PV / BAC（BAC > 0，否则为 0）
// 红线: 全系统只在此处求和；查询、快照、比对都消费本模块的输出
// ==========================================

use crate::domain::metrics::{quantize_money, quantize_ratio, EvmTotals};
use crate::domain::project::{Project, Wbe};
use crate::domain::types::{EacSource, EvmLevel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// LevelFigures - 单个实体的金额与完成度
// ==========================================
// 指数尚未计算；由 EvmIndexCalculator 在其上派生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFigures {
    pub entity_id: String,
    pub level: EvmLevel,
    pub parent_id: Option<String>,
    pub totals: EvmTotals,
    pub percent_planned: Decimal,
    pub percent_complete: Decimal,
    pub eac_source: EacSource,
}

// ==========================================
// HierarchicalAggregator - 层级汇总器
// ==========================================
pub struct HierarchicalAggregator {
    // 无状态
}

impl HierarchicalAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总 WBE
    ///
    /// # 参数
    /// - `wbe`: WBE 实体
    /// - `cost_elements`: 其下全部成本要素的计算结果
    pub fn aggregate_wbe(&self, wbe: &Wbe, cost_elements: &[LevelFigures]) -> LevelFigures {
        self.aggregate(
            &wbe.wbe_id,
            EvmLevel::Wbe,
            Some(wbe.project_id.clone()),
            cost_elements,
        )
    }

    /// 汇总项目（由 WBE 汇总结果再求和）
    pub fn aggregate_project(&self, project: &Project, wbes: &[LevelFigures]) -> LevelFigures {
        self.aggregate(&project.project_id, EvmLevel::Project, None, wbes)
    }

    /// 金额求和（唯一求和点）
    ///
    /// 从 0.00 起累加，结果保持 2 位小数
    pub fn sum_totals<'a, I>(&self, parts: I) -> EvmTotals
    where
        I: IntoIterator<Item = &'a EvmTotals>,
    {
        let sum = parts.into_iter().fold(EvmTotals::zero(), |acc, t| EvmTotals {
            budget_bac: acc.budget_bac + t.budget_bac,
            planned_value: acc.planned_value + t.planned_value,
            earned_value: acc.earned_value + t.earned_value,
            actual_cost: acc.actual_cost + t.actual_cost,
            estimate_at_completion: acc.estimate_at_completion + t.estimate_at_completion,
        });

        EvmTotals {
            budget_bac: quantize_money(sum.budget_bac),
            planned_value: quantize_money(sum.planned_value),
            earned_value: quantize_money(sum.earned_value),
            actual_cost: quantize_money(sum.actual_cost),
            estimate_at_completion: quantize_money(sum.estimate_at_completion),
        }
    }

    /// 按 BAC 折算的比例（BAC ≤ 0 时为 0）
    pub fn share_of_budget(value: Decimal, budget_bac: Decimal) -> Decimal {
        if budget_bac > Decimal::ZERO {
            quantize_ratio(value / budget_bac)
        } else {
            quantize_ratio(Decimal::ZERO)
        }
    }

    fn aggregate(
        &self,
        entity_id: &str,
        level: EvmLevel,
        parent_id: Option<String>,
        children: &[LevelFigures],
    ) -> LevelFigures {
        let totals = self.sum_totals(children.iter().map(|c| &c.totals));
        let eac_source = EacSource::combine(children.iter().map(|c| c.eac_source));

        tracing::debug!(
            entity_id = entity_id,
            level = %level,
            children = children.len(),
            "层级汇总完成"
        );

        LevelFigures {
            entity_id: entity_id.to_string(),
            level,
            parent_id,
            percent_planned: Self::share_of_budget(totals.planned_value, totals.budget_bac),
            percent_complete: Self::share_of_budget(totals.earned_value, totals.budget_bac),
            totals,
            eac_source,
        }
    }
}

impl Default for HierarchicalAggregator {
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

    fn ce(id: &str, bac: &str, pv: &str, ev: &str, ac: &str, source: EacSource) -> LevelFigures {
        LevelFigures {
            entity_id: id.to_string(),
            level: EvmLevel::CostElement,
            parent_id: Some("W1".to_string()),
            totals: EvmTotals {
                budget_bac: d(bac),
                planned_value: d(pv),
                earned_value: d(ev),
                actual_cost: d(ac),
                estimate_at_completion: d(bac),
            },
            percent_planned: Decimal::ZERO,
            percent_complete: Decimal::ZERO,
            eac_source: source,
        }
    }

    fn wbe(id: &str) -> Wbe {
        Wbe {
            wbe_id: id.to_string(),
            project_id: "P1".to_string(),
            wbe_name: id.to_string(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_wbe_sums_cost_elements() {
        let agg = HierarchicalAggregator::new();
        let children = vec![
            ce("CE1", "1000.00", "498.63", "400.00", "420.00", EacSource::BacFallback),
            ce("CE2", "500.00", "250.00", "125.00", "100.10", EacSource::Forecast),
        ];

        let result = agg.aggregate_wbe(&wbe("W1"), &children);

        assert_eq!(result.level, EvmLevel::Wbe);
        assert_eq!(result.parent_id.as_deref(), Some("P1"));
        assert_eq!(result.totals.budget_bac.to_string(), "1500.00");
        assert_eq!(result.totals.planned_value.to_string(), "748.63");
        assert_eq!(result.totals.earned_value.to_string(), "525.00");
        assert_eq!(result.totals.actual_cost.to_string(), "520.10");
        // 525 / 1500 = 0.35
        assert_eq!(result.percent_complete.to_string(), "0.3500");
        assert_eq!(result.eac_source, EacSource::Partial);
    }

    #[test]
    fn test_empty_wbe_is_zero_not_error() {
        let agg = HierarchicalAggregator::new();
        let result = agg.aggregate_wbe(&wbe("W-empty"), &[]);

        assert_eq!(result.totals, EvmTotals::zero());
        assert_eq!(result.totals.budget_bac.to_string(), "0.00");
        assert_eq!(result.percent_complete.to_string(), "0.0000");
        assert_eq!(result.percent_planned.to_string(), "0.0000");
        assert_eq!(result.eac_source, EacSource::BacFallback);
    }

    #[test]
    fn test_project_sums_wbes() {
        let agg = HierarchicalAggregator::new();
        let w1 = agg.aggregate_wbe(
            &wbe("W1"),
            &[ce("CE1", "100.00", "10.00", "5.00", "7.50", EacSource::Forecast)],
        );
        let w2 = agg.aggregate_wbe(
            &wbe("W2"),
            &[ce("CE2", "300.00", "30.00", "15.00", "2.50", EacSource::Forecast)],
        );

        let project = Project {
            project_id: "P1".to_string(),
            project_name: "Demo".to_string(),
            deleted_at: None,
        };
        let result = agg.aggregate_project(&project, &[w1, w2]);

        assert_eq!(result.parent_id, None);
        assert_eq!(result.totals.budget_bac.to_string(), "400.00");
        assert_eq!(result.totals.actual_cost.to_string(), "10.00");
        assert_eq!(result.percent_planned.to_string(), "0.1000");
        assert_eq!(result.eac_source, EacSource::Forecast);
    }
}
