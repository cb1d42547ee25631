// ==========================================
// 项目挣值管理系统 - 操作日志领域模型
// ==========================================
// 用途: 基线创建/替换/作废的审计追踪
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub project_id: Option<String>,
    pub baseline_id: Option<String>,
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime, // 操作时间戳
    pub actor: String,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateBaseline,  // 创建基线
    ReplaceBaseline, // 整体替换基线
    CancelBaseline,  // 作废基线
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateBaseline => "CreateBaseline",
            ActionType::ReplaceBaseline => "ReplaceBaseline",
            ActionType::CancelBaseline => "CancelBaseline",
        }
    }
}
