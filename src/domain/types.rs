// ==========================================
// 项目挣值管理系统 - 领域类型定义
// ==========================================
// 职责: 层级、进度曲线、记录种类、EAC 来源等枚举
// 存储: 统一使用 SCREAMING_SNAKE_CASE 字符串（与数据库一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 进度曲线类型 (Progression Type)
// ==========================================
// 用于由进度计划推导计划完成百分比
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressionType {
    Linear,      // 线性
    Gaussian,    // 正态累积 S 曲线
    Logarithmic, // 对数（前重后轻）
}

impl fmt::Display for ProgressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProgressionType {
    /// 从字符串解析进度曲线类型
    ///
    /// 未知取值返回 None，由仓储层转换为字段错误
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LINEAR" => Some(ProgressionType::Linear),
            "GAUSSIAN" => Some(ProgressionType::Gaussian),
            "LOGARITHMIC" => Some(ProgressionType::Logarithmic),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProgressionType::Linear => "LINEAR",
            ProgressionType::Gaussian => "GAUSSIAN",
            ProgressionType::Logarithmic => "LOGARITHMIC",
        }
    }
}

// ==========================================
// 层级 (EVM Level)
// ==========================================
// 对外序列化为 snake_case: project / wbe / cost_element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvmLevel {
    Project,
    Wbe,
    CostElement,
}

impl fmt::Display for EvmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EvmLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "project" => Some(EvmLevel::Project),
            "wbe" => Some(EvmLevel::Wbe),
            "cost_element" => Some(EvmLevel::CostElement),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EvmLevel::Project => "project",
            EvmLevel::Wbe => "wbe",
            EvmLevel::CostElement => "cost_element",
        }
    }
}

// ==========================================
// 记录种类 (Record Kind)
// ==========================================
// 可见性过滤器按记录种类参数化（仅用于日志与诊断）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Schedule,
    EarnedValue,
    CostRegistration,
    Forecast,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Schedule => write!(f, "SCHEDULE"),
            RecordKind::EarnedValue => write!(f, "EARNED_VALUE"),
            RecordKind::CostRegistration => write!(f, "COST_REGISTRATION"),
            RecordKind::Forecast => write!(f, "FORECAST"),
        }
    }
}

// ==========================================
// EAC 来源 (预测质量指示)
// ==========================================
// - Forecast: 全部成本要素均有可见预测
// - Partial: 部分成本要素使用预测，其余回退 BAC
// - BacFallback: 无任何可见预测，EAC = BAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EacSource {
    Forecast,
    Partial,
    BacFallback,
}

impl fmt::Display for EacSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EacSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FORECAST" => Some(EacSource::Forecast),
            "PARTIAL" => Some(EacSource::Partial),
            "BAC_FALLBACK" => Some(EacSource::BacFallback),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EacSource::Forecast => "FORECAST",
            EacSource::Partial => "PARTIAL",
            EacSource::BacFallback => "BAC_FALLBACK",
        }
    }

    /// 合并子级来源，得到上级来源
    ///
    /// 空集合视为 BacFallback（无预测可用）
    pub fn combine<I: IntoIterator<Item = EacSource>>(sources: I) -> EacSource {
        let mut any_forecast = false;
        let mut any_fallback = false;
        for source in sources {
            match source {
                EacSource::Forecast => any_forecast = true,
                EacSource::BacFallback => any_fallback = true,
                EacSource::Partial => return EacSource::Partial,
            }
        }

        match (any_forecast, any_fallback) {
            (true, false) => EacSource::Forecast,
            (true, true) => EacSource::Partial,
            _ => EacSource::BacFallback,
        }
    }
}
