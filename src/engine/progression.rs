// ==========================================
// 项目挣值管理系统 - 进度曲线函数
// ==========================================
// 输入: 计划起止日期 + 控制日期
// 输出: 计划完成比例 p ∈ [0, 1]（未量化）
// 曲线:
// - LINEAR: p = t
// - GAUSSIAN: 以 t=0.5 为中心、σ=工期/6 的正态累积曲线，归一化到 p(0)=0, p(1)=1
// - LOGARITHMIC: p = log10(1 + 9t)，前期推进快、后期放缓
// 其中 t = 已过天数 / 总天数，截断到 [0, 1]
// ==========================================

use crate::domain::types::ProgressionType;
use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};

/// 正态曲线在 [0,1] 区间内覆盖的标准差个数（单侧）
const GAUSSIAN_HALF_SPAN_SIGMAS: i64 = 3;

/// 对数曲线系数: p = log10(1 + 9t)
const LOGARITHMIC_FACTOR: i64 = 9;

/// 已过工期比例 t，截断到 [0, 1]
///
/// 起止日期相同（或结束早于开始）视为里程碑：控制日期早于开始日期为 0，否则为 1
pub fn elapsed_fraction(start_date: NaiveDate, end_date: NaiveDate, control_date: NaiveDate) -> Decimal {
    if control_date < start_date {
        return Decimal::ZERO;
    }

    let total_days = (end_date - start_date).num_days();
    if total_days <= 0 || control_date >= end_date {
        return Decimal::ONE;
    }

    let elapsed_days = (control_date - start_date).num_days();
    clamp_unit(Decimal::from(elapsed_days) / Decimal::from(total_days))
}

/// 计划完成比例
///
/// # 参数
/// - `progression_type`: 曲线类型
/// - `start_date` / `end_date`: 计划起止日期
/// - `control_date`: 控制日期
///
/// # 返回
/// 未量化的比例，已截断到 [0, 1]
pub fn planned_fraction(
    progression_type: ProgressionType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    control_date: NaiveDate,
) -> Decimal {
    let t = elapsed_fraction(start_date, end_date, control_date);

    // 端点直接返回，避免曲线数值误差
    if t.is_zero() {
        return Decimal::ZERO;
    }
    if t == Decimal::ONE {
        return Decimal::ONE;
    }

    let p = match progression_type {
        ProgressionType::Linear => t,
        ProgressionType::Gaussian => gaussian_curve(t),
        ProgressionType::Logarithmic => logarithmic_curve(t),
    };
    clamp_unit(p)
}

fn gaussian_curve(t: Decimal) -> Decimal {
    let span = Decimal::from(GAUSSIAN_HALF_SPAN_SIGMAS);
    let half = Decimal::new(5, 1);
    // z ∈ [-span, span]
    let z = (t - half) * span * Decimal::TWO;

    let lower = (-span).norm_cdf();
    let upper = span.norm_cdf();
    let range = upper - lower;
    if range.is_zero() {
        return t;
    }
    (z.norm_cdf() - lower) / range
}

fn logarithmic_curve(t: Decimal) -> Decimal {
    let factor = Decimal::from(LOGARITHMIC_FACTOR);
    (Decimal::ONE + factor * t).log10()
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::quantize_ratio;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_linear_mid_year() {
        // 2024 为闰年: 1/1 → 7/1 共 182 天，1/1 → 12/31 共 365 天
        let p = planned_fraction(
            ProgressionType::Linear,
            date(2024, 1, 1),
            date(2024, 12, 31),
            date(2024, 7, 1),
        );
        assert_eq!(p, Decimal::from(182) / Decimal::from(365));
        assert_eq!(quantize_ratio(p).to_string(), "0.4986");
    }

    #[test]
    fn test_before_start_and_after_end() {
        for kind in [
            ProgressionType::Linear,
            ProgressionType::Gaussian,
            ProgressionType::Logarithmic,
        ] {
            let before = planned_fraction(kind, date(2024, 3, 1), date(2024, 6, 1), date(2024, 2, 1));
            let after = planned_fraction(kind, date(2024, 3, 1), date(2024, 6, 1), date(2024, 9, 1));
            assert_eq!(before, Decimal::ZERO);
            assert_eq!(after, Decimal::ONE);
        }
    }

    #[test]
    fn test_zero_duration_milestone() {
        let day = date(2024, 5, 10);
        assert_eq!(
            planned_fraction(ProgressionType::Linear, day, day, date(2024, 5, 9)),
            Decimal::ZERO
        );
        assert_eq!(
            planned_fraction(ProgressionType::Gaussian, day, day, day),
            Decimal::ONE
        );
    }

    #[test]
    fn test_gaussian_is_symmetric_s_curve() {
        let start = date(2024, 1, 1);
        let end = date(2024, 4, 10); // 共 100 天
        let mid = planned_fraction(ProgressionType::Gaussian, start, end, date(2024, 2, 20));
        // 2024-02-20 为第 50 天 → 正中点
        assert_eq!(quantize_ratio(mid).to_string(), "0.5000");

        let early = planned_fraction(ProgressionType::Gaussian, start, end, date(2024, 1, 21));
        let linear_early = planned_fraction(ProgressionType::Linear, start, end, date(2024, 1, 21));
        assert!(early < linear_early, "S 曲线前期应慢于线性");
    }

    #[test]
    fn test_logarithmic_is_front_loaded() {
        let start = date(2024, 1, 1);
        let end = date(2024, 4, 10); // 共 100 天
        let log_p = planned_fraction(ProgressionType::Logarithmic, start, end, date(2024, 1, 21));
        let lin_p = planned_fraction(ProgressionType::Linear, start, end, date(2024, 1, 21));
        assert!(log_p > lin_p);
        assert!(log_p <= Decimal::ONE);
    }

    #[test]
    fn test_curves_are_monotonic() {
        let start = date(2024, 1, 1);
        let end = date(2024, 4, 10);
        for kind in [ProgressionType::Gaussian, ProgressionType::Logarithmic] {
            let mut prev = Decimal::ZERO;
            let mut day = start;
            while day <= end {
                let p = planned_fraction(kind, start, end, day);
                assert!(p >= prev, "{:?} 在 {} 处非单调", kind, day);
                prev = p;
                day = day.succ_opt().unwrap();
            }
        }
    }
}
