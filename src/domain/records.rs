// ==========================================
// 项目挣值管理系统 - 时间切片原始记录
// ==========================================
// 记录: 进度计划 / 挣值登记 / 成本登记 / 完工预测
// 双时间戳: 业务生效日期 + 系统录入时间 (created_at)
// 红线: 引擎只读这些记录，从不修改
// ==========================================

use crate::domain::project::{CostElement, Project, Wbe};
use crate::domain::types::ProgressionType;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleEntry - 进度计划
// ==========================================
// 生效日期 = registration_date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub schedule_id: String,
    pub cost_element_id: String,
    pub registration_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progression_type: ProgressionType,
}

// ==========================================
// EarnedValueEntry - 挣值登记（实物完成百分比）
// ==========================================
// 生效日期 = completion_date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedValueEntry {
    pub earned_value_id: String,
    pub cost_element_id: String,
    pub completion_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub percent_complete: Decimal, // 0..=100
}

// ==========================================
// CostRegistration - 成本登记（实际发生成本）
// ==========================================
// 累加语义，而不是“最新者胜出”
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRegistration {
    pub cost_registration_id: String,
    pub cost_element_id: String,
    pub registration_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub amount: Decimal,
}

// ==========================================
// Forecast - 完工预测 (EAC)
// ==========================================
// 生效日期 = forecast_date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub forecast_id: String,
    pub cost_element_id: String,
    pub forecast_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub estimate_at_completion: Decimal,
}

// ==========================================
// 记录集合（已完成拉取的数据，供纯计算使用）
// ==========================================

/// 单个成本要素及其全部原始记录
///
/// 记录不做预过滤，可见性由引擎按控制日期判定
#[derive(Debug, Clone, PartialEq)]
pub struct CostElementRecordSet {
    pub cost_element: CostElement,
    pub schedules: Vec<ScheduleEntry>,
    pub earned_values: Vec<EarnedValueEntry>,
    pub cost_registrations: Vec<CostRegistration>,
    pub forecasts: Vec<Forecast>,
}

impl CostElementRecordSet {
    pub fn new(cost_element: CostElement) -> Self {
        Self {
            cost_element,
            schedules: Vec::new(),
            earned_values: Vec::new(),
            cost_registrations: Vec::new(),
            forecasts: Vec::new(),
        }
    }
}

/// WBE 及其下属成本要素（按 cost_element_id 升序）
#[derive(Debug, Clone, PartialEq)]
pub struct WbeRecordSet {
    pub wbe: Wbe,
    pub cost_elements: Vec<CostElementRecordSet>,
}

/// 项目及其下属 WBE（按 wbe_id 升序）
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecordSet {
    pub project: Project,
    pub wbes: Vec<WbeRecordSet>,
}

impl ProjectRecordSet {
    /// 成本要素总数
    pub fn cost_element_count(&self) -> usize {
        self.wbes.iter().map(|w| w.cost_elements.len()).sum()
    }
}
