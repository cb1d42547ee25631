// ==========================================
// 项目挣值管理系统 - EVM 指标领域模型
// ==========================================
// 职责: 定点量化规则、指数哨兵类型、指标结果集
// 红线: 金额与比率一律使用 Decimal，禁止二进制浮点
// 红线: "不可计算" 与 0 是两种不同的结果，任何一层都不得混淆
// ==========================================

use crate::domain::types::{EacSource, EvmLevel};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number as JsonNumber, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// 金额小数位
pub const MONEY_SCALE: u32 = 2;

/// 比率/百分比小数位
pub const RATIO_SCALE: u32 = 4;

/// TCPI 超支哨兵的文本表示
pub const OVERRUN_LITERAL: &str = "overrun";

// ==========================================
// 量化（四舍五入：round half up）
// ==========================================

/// 按指定小数位四舍五入，并固定输出小数位
///
/// 例: 400 → "400.00"，0.952380 → "0.9524"
pub fn quantize(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// 金额量化（2 位）
pub fn quantize_money(value: Decimal) -> Decimal {
    quantize(value, MONEY_SCALE)
}

/// 比率量化（4 位）
pub fn quantize_ratio(value: Decimal) -> Decimal {
    quantize(value, RATIO_SCALE)
}

// ==========================================
// IndexValue - CPI / SPI 结果
// ==========================================
// 序列化: 数值 → 0.9524（JSON 数值，保留 4 位）；不可计算 → null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexValue {
    Value(Decimal),
    Unavailable,
}

impl IndexValue {
    /// 由比率构造（自动量化到 4 位）
    pub fn from_ratio(value: Decimal) -> Self {
        IndexValue::Value(quantize_ratio(value))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            IndexValue::Value(v) => Some(*v),
            IndexValue::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, IndexValue::Unavailable)
    }

    /// 数据库存储值（NULL 表示不可计算）
    pub fn to_db_value(&self) -> Option<String> {
        self.value().map(|v| v.to_string())
    }

    /// 从数据库存储值还原
    pub fn from_db_value(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            None => Ok(IndexValue::Unavailable),
            Some(s) => Decimal::from_str(s.trim())
                .map(IndexValue::Value)
                .map_err(|e| format!("无效的指数值 '{}': {}", s, e)),
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Value(v) => write!(f, "{}", v),
            IndexValue::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl Serialize for IndexValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IndexValue::Value(v) => fixed_scale_number(*v)
                .map_err(S::Error::custom)?
                .serialize(serializer),
            IndexValue::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for IndexValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<JsonValue>::deserialize(deserializer)? {
            None | Some(JsonValue::Null) => Ok(IndexValue::Unavailable),
            Some(JsonValue::Number(n)) => IndexValue::from_db_value(Some(&n.to_string())).map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!("无效的指数值: {}", other))),
        }
    }
}

// ==========================================
// TcpiValue - TCPI 结果（三态）
// ==========================================
// 序列化: 数值 → 1.2500；超支 → "overrun"；不可计算 → null
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpiValue {
    Value(Decimal),
    Unavailable,
    Overrun,
}

impl TcpiValue {
    pub fn from_ratio(value: Decimal) -> Self {
        TcpiValue::Value(quantize_ratio(value))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            TcpiValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_overrun(&self) -> bool {
        matches!(self, TcpiValue::Overrun)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, TcpiValue::Unavailable)
    }

    pub fn to_db_value(&self) -> Option<String> {
        match self {
            TcpiValue::Value(v) => Some(v.to_string()),
            TcpiValue::Overrun => Some(OVERRUN_LITERAL.to_string()),
            TcpiValue::Unavailable => None,
        }
    }

    pub fn from_db_value(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None => Ok(TcpiValue::Unavailable),
            Some(s) if s.eq_ignore_ascii_case(OVERRUN_LITERAL) => Ok(TcpiValue::Overrun),
            Some(s) => Decimal::from_str(s)
                .map(TcpiValue::Value)
                .map_err(|e| format!("无效的TCPI值 '{}': {}", s, e)),
        }
    }
}

impl fmt::Display for TcpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcpiValue::Value(v) => write!(f, "{}", v),
            TcpiValue::Unavailable => write!(f, "unavailable"),
            TcpiValue::Overrun => write!(f, "{}", OVERRUN_LITERAL),
        }
    }
}

impl Serialize for TcpiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TcpiValue::Value(v) => fixed_scale_number(*v)
                .map_err(S::Error::custom)?
                .serialize(serializer),
            TcpiValue::Overrun => serializer.serialize_str(OVERRUN_LITERAL),
            TcpiValue::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TcpiValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<JsonValue>::deserialize(deserializer)? {
            None | Some(JsonValue::Null) => Ok(TcpiValue::Unavailable),
            Some(JsonValue::Number(n)) => TcpiValue::from_db_value(Some(&n.to_string())).map_err(D::Error::custom),
            Some(JsonValue::String(s)) if s.eq_ignore_ascii_case(OVERRUN_LITERAL) => Ok(TcpiValue::Overrun),
            Some(other) => Err(D::Error::custom(format!("无效的TCPI值: {}", other))),
        }
    }
}

/// 指数的 JSON 数值形式，保留量化后的小数位（如 1.0000）
fn fixed_scale_number(value: Decimal) -> Result<JsonNumber, String> {
    JsonNumber::from_str(&value.to_string()).map_err(|e| format!("无法编码指数值 {}: {}", value, e))
}

// ==========================================
// EvmTotals - 可加总的金额量
// ==========================================
// 所有字段均已量化到 2 位；汇总层只对已量化值求和
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTotals {
    pub budget_bac: Decimal,
    pub planned_value: Decimal,
    pub earned_value: Decimal,
    pub actual_cost: Decimal,
    pub estimate_at_completion: Decimal,
}

impl EvmTotals {
    pub fn zero() -> Self {
        Self {
            budget_bac: quantize_money(Decimal::ZERO),
            planned_value: quantize_money(Decimal::ZERO),
            earned_value: quantize_money(Decimal::ZERO),
            actual_cost: quantize_money(Decimal::ZERO),
            estimate_at_completion: quantize_money(Decimal::ZERO),
        }
    }
}

// ==========================================
// EvmIndices - 指数与偏差
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmIndices {
    pub cpi: IndexValue,
    pub spi: IndexValue,
    pub tcpi: TcpiValue,
    pub cost_variance: Decimal,
    pub schedule_variance: Decimal,
    pub variance_at_completion: Decimal,
}

// ==========================================
// EvmMetrics - 单个实体在某控制日期的完整指标
// ==========================================
// 用途: 实时查询响应 / 基线快照行的字段集合（二者一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmMetrics {
    pub entity_id: String,
    pub level: EvmLevel,
    pub parent_id: Option<String>,
    pub control_date: NaiveDate,

    // ===== 金额（2 位） =====
    pub budget_bac: Decimal,
    pub planned_value: Decimal,
    pub earned_value: Decimal,
    pub actual_cost: Decimal,
    pub estimate_at_completion: Decimal,

    // ===== 指数（4 位 / 哨兵） =====
    pub cpi: IndexValue,
    pub spi: IndexValue,
    pub tcpi: TcpiValue,

    // ===== 偏差（2 位） =====
    pub cost_variance: Decimal,
    pub schedule_variance: Decimal,
    pub variance_at_completion: Decimal,

    // ===== 完成度（比例 0..1，4 位） =====
    pub percent_planned: Decimal,
    pub percent_complete: Decimal,

    /// EAC 来源（预测质量指示）
    pub eac_source: EacSource,
}

impl EvmMetrics {
    /// 取回可加总部分
    pub fn totals(&self) -> EvmTotals {
        EvmTotals {
            budget_bac: self.budget_bac,
            planned_value: self.planned_value,
            earned_value: self.earned_value,
            actual_cost: self.actual_cost,
            estimate_at_completion: self.estimate_at_completion,
        }
    }

    /// 取回指数部分
    pub fn indices(&self) -> EvmIndices {
        EvmIndices {
            cpi: self.cpi,
            spi: self.spi,
            tcpi: self.tcpi,
            cost_variance: self.cost_variance,
            schedule_variance: self.schedule_variance,
            variance_at_completion: self.variance_at_completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_quantize_round_half_up() {
        assert_eq!(quantize_money(d("498.625")).to_string(), "498.63");
        assert_eq!(quantize_money(d("-20.005")).to_string(), "-20.01");
        assert_eq!(quantize_money(d("400")).to_string(), "400.00");
        assert_eq!(quantize_ratio(d("0.95238095")).to_string(), "0.9524");
        assert_eq!(quantize_ratio(d("1")).to_string(), "1.0000");
    }

    #[test]
    fn test_index_value_serialization() {
        let v = IndexValue::from_ratio(d("0.952380"));
        assert_eq!(serde_json::to_string(&v).unwrap(), "0.9524");
        assert_eq!(
            serde_json::to_string(&IndexValue::Unavailable).unwrap(),
            "null"
        );

        // 0 是合法数值，不得被当作不可计算
        let zero = IndexValue::from_ratio(Decimal::ZERO);
        assert_eq!(serde_json::to_string(&zero).unwrap(), "0.0000");
        assert!(!zero.is_unavailable());
    }

    #[test]
    fn test_tcpi_value_three_states() {
        assert_eq!(
            serde_json::to_string(&TcpiValue::Overrun).unwrap(),
            "\"overrun\""
        );
        assert_eq!(
            serde_json::to_string(&TcpiValue::Unavailable).unwrap(),
            "null"
        );
        assert_eq!(
            serde_json::to_string(&TcpiValue::from_ratio(d("1.25"))).unwrap(),
            "1.2500"
        );

        let parsed: TcpiValue = serde_json::from_str("\"overrun\"").unwrap();
        assert_eq!(parsed, TcpiValue::Overrun);
        let parsed: TcpiValue = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, TcpiValue::Unavailable);
        let parsed: TcpiValue = serde_json::from_str("0.8000").unwrap();
        assert_eq!(parsed, TcpiValue::Value(d("0.8000")));
    }

    #[test]
    fn test_db_value_roundtrip_keeps_sentinels_distinct() {
        assert_eq!(IndexValue::Unavailable.to_db_value(), None);
        assert_eq!(
            IndexValue::from_db_value(None).unwrap(),
            IndexValue::Unavailable
        );
        assert_eq!(
            TcpiValue::from_db_value(Some("overrun")).unwrap(),
            TcpiValue::Overrun
        );
        assert!(TcpiValue::from_db_value(Some("abc")).is_err());
    }
}
