// ==========================================
// 项目挣值管理系统 - 指标对比引擎
// ==========================================
// 输入: 两组同一项目的层级指标（基线快照行或实时计算结果）
// 输出: 逐实体差异（金额差 + 指数前后值）
// 红线: 无状态引擎,所有方法都是纯函数
// ==========================================

use crate::domain::comparison::{DeltaPresence, EntityDelta, IndexPair, TcpiPair};
use crate::domain::metrics::{quantize_money, EvmMetrics};
use crate::domain::types::EvmLevel;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub struct MetricsComparisonEngine;

impl MetricsComparisonEngine {
    pub fn new() -> Self {
        Self
    }

    /// 逐实体对比
    ///
    /// 以 (层级, 实体ID) 配对；只在一侧出现的实体也会输出，缺失一侧的金额按 0 计。
    pub fn compare(&self, before: &[EvmMetrics], after: &[EvmMetrics]) -> Vec<EntityDelta> {
        let mut paired: BTreeMap<(EvmLevel, &str), (Option<&EvmMetrics>, Option<&EvmMetrics>)> = BTreeMap::new();
        for m in before {
            paired.entry((m.level, m.entity_id.as_str())).or_default().0 = Some(m);
        }
        for m in after {
            paired.entry((m.level, m.entity_id.as_str())).or_default().1 = Some(m);
        }

        paired
            .into_iter()
            .filter_map(|((level, entity_id), (b, a))| {
                let presence = match (b, a) {
                    (Some(_), Some(_)) => DeltaPresence::Both,
                    (Some(_), None) => DeltaPresence::BeforeOnly,
                    (None, Some(_)) => DeltaPresence::AfterOnly,
                    (None, None) => return None,
                };
                Some(EntityDelta {
                    entity_id: entity_id.to_string(),
                    level,
                    presence,
                    budget_bac_delta: money_delta(b, a, |m| m.budget_bac),
                    planned_value_delta: money_delta(b, a, |m| m.planned_value),
                    earned_value_delta: money_delta(b, a, |m| m.earned_value),
                    actual_cost_delta: money_delta(b, a, |m| m.actual_cost),
                    estimate_at_completion_delta: money_delta(b, a, |m| m.estimate_at_completion),
                    cpi: IndexPair {
                        before: b.map(|m| m.cpi),
                        after: a.map(|m| m.cpi),
                    },
                    spi: IndexPair {
                        before: b.map(|m| m.spi),
                        after: a.map(|m| m.spi),
                    },
                    tcpi: TcpiPair {
                        before: b.map(|m| m.tcpi),
                        after: a.map(|m| m.tcpi),
                    },
                    eac_source_before: b.map(|m| m.eac_source),
                    eac_source_after: a.map(|m| m.eac_source),
                })
            })
            .collect()
    }
}

impl Default for MetricsComparisonEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn money_delta<F>(before: Option<&EvmMetrics>, after: Option<&EvmMetrics>, field: F) -> Decimal
where
    F: Fn(&EvmMetrics) -> Decimal,
{
    let b = before.map(&field).unwrap_or(Decimal::ZERO);
    let a = after.map(&field).unwrap_or(Decimal::ZERO);
    quantize_money(a - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{IndexValue, TcpiValue};
    use crate::domain::types::EacSource;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn metrics(level: EvmLevel, id: &str, pv: &str, ev: &str, ac: &str, cpi: IndexValue) -> EvmMetrics {
        EvmMetrics {
            entity_id: id.to_string(),
            level,
            parent_id: None,
            control_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            budget_bac: d("1000.00"),
            planned_value: d(pv),
            earned_value: d(ev),
            actual_cost: d(ac),
            estimate_at_completion: d("1000.00"),
            cpi,
            spi: IndexValue::Unavailable,
            tcpi: TcpiValue::Unavailable,
            cost_variance: Decimal::ZERO,
            schedule_variance: Decimal::ZERO,
            variance_at_completion: Decimal::ZERO,
            percent_planned: Decimal::ZERO,
            percent_complete: Decimal::ZERO,
            eac_source: EacSource::BacFallback,
        }
    }

    #[test]
    fn test_compare_pairs_by_level_and_entity() {
        let engine = MetricsComparisonEngine::new();
        let before = vec![
            metrics(EvmLevel::CostElement, "CE1", "100.00", "50.00", "0.00", IndexValue::Unavailable),
            metrics(EvmLevel::Project, "P1", "100.00", "50.00", "0.00", IndexValue::Unavailable),
            metrics(EvmLevel::CostElement, "CE2", "10.00", "0.00", "0.00", IndexValue::Unavailable),
        ];
        let after = vec![
            metrics(EvmLevel::Project, "P1", "300.00", "150.00", "160.00", IndexValue::Value(d("0.9375"))),
            metrics(EvmLevel::CostElement, "CE1", "300.00", "150.00", "160.00", IndexValue::Value(d("0.9375"))),
            metrics(EvmLevel::CostElement, "CE3", "5.00", "0.00", "0.00", IndexValue::Unavailable),
        ];

        let deltas = engine.compare(&before, &after);
        let keys: Vec<(EvmLevel, &str)> = deltas.iter().map(|x| (x.level, x.entity_id.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (EvmLevel::Project, "P1"),
                (EvmLevel::CostElement, "CE1"),
                (EvmLevel::CostElement, "CE2"),
                (EvmLevel::CostElement, "CE3"),
            ]
        );

        let p1 = &deltas[0];
        assert_eq!(p1.presence, DeltaPresence::Both);
        assert_eq!(p1.planned_value_delta, d("200.00"));
        assert_eq!(p1.actual_cost_delta, d("160.00"));
        assert_eq!(p1.cpi.before, Some(IndexValue::Unavailable));
        assert_eq!(p1.cpi.after, Some(IndexValue::Value(d("0.9375"))));

        let ce2 = &deltas[2];
        assert_eq!(ce2.presence, DeltaPresence::BeforeOnly);
        assert_eq!(ce2.budget_bac_delta, d("-1000.00"));
        assert_eq!(ce2.cpi.after, None);

        assert_eq!(deltas[3].presence, DeltaPresence::AfterOnly);
        assert_eq!(deltas[3].planned_value_delta, d("5.00"));
    }
}
