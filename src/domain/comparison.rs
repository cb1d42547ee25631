// ==========================================
// 项目挣值管理系统 - 对比结果
// ==========================================
// 用途: 基线 vs 实时 / 基线 vs 基线 的逐实体差异
// ==========================================

use crate::domain::metrics::{IndexValue, TcpiValue};
use crate::domain::types::{EacSource, EvmLevel};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 实体在两侧的出现情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaPresence {
    Both,
    /// 仅旧侧存在（实体在新侧已删除）
    BeforeOnly,
    /// 仅新侧存在（实体为新增）
    AfterOnly,
}

/// 指数前后值（缺失的一侧为 None）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPair {
    pub before: Option<IndexValue>,
    pub after: Option<IndexValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpiPair {
    pub before: Option<TcpiValue>,
    pub after: Option<TcpiValue>,
}

/// 单个实体的差异（金额差 = 新 - 旧，缺失一侧按 0 计）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDelta {
    pub entity_id: String,
    pub level: EvmLevel,
    pub presence: DeltaPresence,

    pub budget_bac_delta: Decimal,
    pub planned_value_delta: Decimal,
    pub earned_value_delta: Decimal,
    pub actual_cost_delta: Decimal,
    pub estimate_at_completion_delta: Decimal,

    pub cpi: IndexPair,
    pub spi: IndexPair,
    pub tcpi: TcpiPair,

    pub eac_source_before: Option<EacSource>,
    pub eac_source_after: Option<EacSource>,
}

/// 对比结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsComparison {
    /// 旧侧标识（基线ID）
    pub before_label: String,
    pub before_control_date: NaiveDate,
    /// 新侧标识（基线ID 或 "live"）
    pub after_label: String,
    pub after_control_date: NaiveDate,
    /// 排序: 项目 → WBE → 成本要素，同层按实体ID
    pub deltas: Vec<EntityDelta>,
}

impl MetricsComparison {
    pub fn find_delta(&self, level: EvmLevel, entity_id: &str) -> Option<&EntityDelta> {
        self.deltas
            .iter()
            .find(|d| d.level == level && d.entity_id == entity_id)
    }
}
