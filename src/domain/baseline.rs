// ==========================================
// 项目挣值管理系统 - 基线领域模型
// ==========================================
// 基线 = 某控制日期下全部层级 EVM 指标的不可变快照
// 红线: 快照行只写一次；之后仅基线元数据的作废字段/修订号可变
// ==========================================

use crate::domain::metrics::EvmMetrics;
use crate::domain::types::EvmLevel;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Baseline - 基线元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub baseline_id: String,
    pub project_id: String,
    pub control_date: NaiveDate,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub revision: i32,                         // 乐观锁：每次整体替换 +1
    pub config_snapshot_json: Option<String>,  // 生成时的配置快照
    pub cancelled_at: Option<NaiveDateTime>,   // 作废时间（软删除）
    pub cancelled_by: Option<String>,
    pub cancel_reason: Option<String>,
}

impl Baseline {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

/// 创建基线时由调用方提供的元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetadata {
    pub description: Option<String>,
    pub created_by: Option<String>,
}

// ==========================================
// BaselineSnapshotRow - 基线快照行
// ==========================================
// 主键: (baseline_id, level, entity_id)
// 字段集合与实时查询响应一致，另加不可变 created_at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshotRow {
    pub baseline_id: String,
    #[serde(flatten)]
    pub metrics: EvmMetrics,
    pub created_at: NaiveDateTime,
}

impl BaselineSnapshotRow {
    pub fn level(&self) -> EvmLevel {
        self.metrics.level
    }

    pub fn entity_id(&self) -> &str {
        &self.metrics.entity_id
    }
}

// ==========================================
// BaselineSnapshotSet - 一次基线生成的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshotSet {
    pub baseline: Baseline,
    pub rows: Vec<BaselineSnapshotRow>,
}

impl BaselineSnapshotSet {
    /// 项目级快照行
    pub fn project_row(&self) -> Option<&BaselineSnapshotRow> {
        self.rows.iter().find(|r| r.level() == EvmLevel::Project)
    }

    /// 查找指定层级与实体的快照行
    pub fn find_row(&self, level: EvmLevel, entity_id: &str) -> Option<&BaselineSnapshotRow> {
        self.rows
            .iter()
            .find(|r| r.level() == level && r.entity_id() == entity_id)
    }

    /// 按层级统计行数 (project, wbe, cost_element)
    pub fn count_by_level(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for row in &self.rows {
            match row.level() {
                EvmLevel::Project => counts.0 += 1,
                EvmLevel::Wbe => counts.1 += 1,
                EvmLevel::CostElement => counts.2 += 1,
            }
        }
        counts
    }
}
