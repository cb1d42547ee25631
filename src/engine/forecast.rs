// ==========================================
// 项目挣值管理系统 - 完工估算 (EAC) 取值
// ==========================================
// 规则: 取控制日期可见的最新预测；无可见预测时回退为 BAC
// 红线: 控制日期之后录入的预测不得参与历史视图
// ==========================================

use crate::domain::metrics::quantize_money;
use crate::domain::records::Forecast;
use crate::domain::types::EacSource;
use crate::engine::visibility::select_current;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// EAC 取值结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EacResult {
    pub forecast_id: Option<String>,
    pub estimate_at_completion: Decimal,
    pub source: EacSource,
}

/// 解析单个成本要素的 EAC
pub fn resolve_estimate_at_completion(
    forecasts: &[Forecast],
    control_date: NaiveDate,
    budget_bac: Decimal,
) -> EacResult {
    match select_current(forecasts, control_date) {
        Some(f) => EacResult {
            forecast_id: Some(f.forecast_id.clone()),
            estimate_at_completion: quantize_money(f.estimate_at_completion),
            source: EacSource::Forecast,
        },
        None => EacResult {
            forecast_id: None,
            estimate_at_completion: quantize_money(budget_bac),
            source: EacSource::BacFallback,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fallback_to_bac_ignores_future_forecast() {
        let forecasts = vec![Forecast {
            forecast_id: "F1".to_string(),
            cost_element_id: "CE1".to_string(),
            forecast_date: date(2024, 6, 1),
            // 控制日期之后才录入
            created_at: date(2024, 7, 10).and_hms_opt(9, 0, 0).unwrap(),
            estimate_at_completion: Decimal::from_str("1250").unwrap(),
        }];

        let result = resolve_estimate_at_completion(&forecasts, date(2024, 7, 1), Decimal::from(1000));
        assert_eq!(result.source, EacSource::BacFallback);
        assert_eq!(result.estimate_at_completion.to_string(), "1000.00");

        let result = resolve_estimate_at_completion(&forecasts, date(2024, 7, 10), Decimal::from(1000));
        assert_eq!(result.source, EacSource::Forecast);
        assert_eq!(result.forecast_id.as_deref(), Some("F1"));
        assert_eq!(result.estimate_at_completion.to_string(), "1250.00");
    }
}
