// ==========================================
// 项目挣值管理系统 - 项目层级领域模型
// ==========================================
// 层级: Project → WBE → CostElement
// 说明: 实体的增删改由外部 CRUD 层负责，本系统只读
// ==========================================

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub project_name: String,
    pub deleted_at: Option<NaiveDateTime>, // 软删除时间（None = 有效）
}

// ==========================================
// Wbe - 工作分解单元
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wbe {
    pub wbe_id: String,
    pub project_id: String,
    pub wbe_name: String,
    pub deleted_at: Option<NaiveDateTime>,
}

// ==========================================
// CostElement - 成本要素（叶子预算单元）
// ==========================================
// 红线: 同一版本内 BAC 不可变，BAC 变更由外部版本机制产生新版本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostElement {
    pub cost_element_id: String,
    pub wbe_id: String,
    pub cost_element_name: String,
    pub budget_bac: Decimal, // 完工预算
    pub deleted_at: Option<NaiveDateTime>,
}
