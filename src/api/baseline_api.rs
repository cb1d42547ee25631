// ==========================================
// 项目挣值管理系统 - 基线 API
// ==========================================
// 职责: 基线创建 / 整体替换 / 作废 / 查询 / 对比
// 红线: 快照数值只能整体替换，作废仅写元数据
// ==========================================

use std::sync::Arc;

use crate::api::error::{parse_control_date, ApiError, ApiResult};
use crate::api::evm_api::{require_id, EvmApi};
use crate::domain::action_log::ActionLog;
use crate::domain::baseline::{Baseline, BaselineMetadata, BaselineSnapshotSet};
use crate::domain::comparison::MetricsComparison;
use crate::domain::metrics::EvmMetrics;
use crate::engine::baseline_snapshot::BaselineSnapshotService;
use crate::engine::comparison::MetricsComparisonEngine;

/// 与实时计算对比时，新侧的标识
pub const LIVE_LABEL: &str = "live";

// ==========================================
// BaselineApi
// ==========================================
pub struct BaselineApi {
    snapshot_service: Arc<BaselineSnapshotService>,
    evm_api: Arc<EvmApi>,
    comparison_engine: MetricsComparisonEngine,
}

impl BaselineApi {
    pub fn new(snapshot_service: Arc<BaselineSnapshotService>, evm_api: Arc<EvmApi>) -> Self {
        Self {
            snapshot_service,
            evm_api,
            comparison_engine: MetricsComparisonEngine::new(),
        }
    }

    /// 创建基线
    ///
    /// # 参数
    /// - `project_id`: 项目ID
    /// - `control_date`: 控制日期 (YYYY-MM-DD)
    /// - `description`: 描述（可选）
    /// - `created_by`: 创建人（缺省取配置 `default_created_by`）
    pub fn create_baseline(
        &self,
        project_id: &str,
        control_date: &str,
        description: Option<String>,
        created_by: Option<String>,
    ) -> ApiResult<BaselineSnapshotSet> {
        let control_date = parse_control_date(control_date)?;
        require_id("项目ID", project_id)?;

        let set = self.snapshot_service.create_snapshot(
            project_id,
            control_date,
            BaselineMetadata {
                description,
                created_by: created_by.filter(|s| !s.trim().is_empty()),
            },
        )?;
        Ok(set)
    }

    /// 整体替换基线（编辑流程）
    ///
    /// `control_date` 为 None 时沿用原控制日期。
    ///
    /// # 错误
    /// - `ApiError::SnapshotConflict`: 并发替换冲突且重试耗尽
    /// - `ApiError::BusinessRuleViolation`: 基线已作废
    pub fn replace_baseline(
        &self,
        baseline_id: &str,
        control_date: Option<&str>,
        description: Option<String>,
        actor: &str,
    ) -> ApiResult<BaselineSnapshotSet> {
        require_id("基线ID", baseline_id)?;
        require_id("操作人", actor)?;
        let control_date = control_date.map(parse_control_date).transpose()?;

        let set = self
            .snapshot_service
            .replace_snapshot(baseline_id, control_date, description, actor)?;
        Ok(set)
    }

    /// 作废基线
    pub fn cancel_baseline(&self, baseline_id: &str, actor: &str, reason: Option<&str>) -> ApiResult<Baseline> {
        require_id("基线ID", baseline_id)?;
        require_id("操作人", actor)?;
        Ok(self.snapshot_service.cancel_baseline(baseline_id, actor, reason)?)
    }

    /// 读取基线及其快照行
    pub fn get_baseline_snapshot(&self, baseline_id: &str) -> ApiResult<BaselineSnapshotSet> {
        require_id("基线ID", baseline_id)?;
        Ok(self.snapshot_service.get_snapshot(baseline_id)?)
    }

    /// 列出项目的基线（最新在前）
    pub fn list_baselines(&self, project_id: &str, include_cancelled: bool) -> ApiResult<Vec<Baseline>> {
        require_id("项目ID", project_id)?;
        Ok(self
            .snapshot_service
            .list_baselines(project_id, include_cancelled)?)
    }

    /// 项目的基线操作历史（最新在前）
    ///
    /// # 错误
    /// - `ApiError::NotFound`: 项目不存在或已删除
    pub fn list_project_actions(&self, project_id: &str, limit: usize) -> ApiResult<Vec<ActionLog>> {
        require_id("项目ID", project_id)?;
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        Ok(self.snapshot_service.list_actions(project_id, limit)?)
    }

    /// 基线 vs 实时计算
    ///
    /// 实时一侧按给定控制日期重新计算；快照一侧不变。
    pub fn compare_baseline_to_live(&self, baseline_id: &str, control_date: &str) -> ApiResult<MetricsComparison> {
        let control_date = parse_control_date(control_date)?;
        let snapshot = self.get_baseline_snapshot(baseline_id)?;

        let live = self
            .evm_api
            .evaluate_project_tree(&snapshot.baseline.project_id, control_date)?
            .flatten();

        let before = snapshot_metrics(&snapshot);
        Ok(MetricsComparison {
            before_label: snapshot.baseline.baseline_id.clone(),
            before_control_date: snapshot.baseline.control_date,
            after_label: LIVE_LABEL.to_string(),
            after_control_date: control_date,
            deltas: self.comparison_engine.compare(&before, &live),
        })
    }

    /// 基线 vs 基线（两者须属于同一项目）
    pub fn compare_baselines(&self, before_id: &str, after_id: &str) -> ApiResult<MetricsComparison> {
        let before = self.get_baseline_snapshot(before_id)?;
        let after = self.get_baseline_snapshot(after_id)?;

        if before.baseline.project_id != after.baseline.project_id {
            return Err(ApiError::InvalidInput(format!(
                "基线{}与{}不属于同一项目",
                before_id, after_id
            )));
        }

        Ok(MetricsComparison {
            before_label: before.baseline.baseline_id.clone(),
            before_control_date: before.baseline.control_date,
            after_label: after.baseline.baseline_id.clone(),
            after_control_date: after.baseline.control_date,
            deltas: self
                .comparison_engine
                .compare(&snapshot_metrics(&before), &snapshot_metrics(&after)),
        })
    }
}

fn snapshot_metrics(set: &BaselineSnapshotSet) -> Vec<EvmMetrics> {
    set.rows.iter().map(|r| r.metrics.clone()).collect()
}
