// ==========================================
// 项目挣值管理系统 - EVM 查询 API
// ==========================================
// 职责: 按层级查询某控制日期的 EVM 指标（只读，无副作用）
// 输入: 实体ID + 控制日期字符串 (YYYY-MM-DD)
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::error::{parse_control_date, ApiError, ApiResult};
use crate::domain::metrics::{EvmMetrics, IndexValue, TcpiValue};
use crate::domain::types::{EacSource, EvmLevel};
use crate::engine::evm::{EvmEngine, ProjectEvmTree, WbeEvmNode};
use crate::engine::repositories::EvmRepositories;

// ==========================================
// 响应类型
// ==========================================

/// 单个实体的 EVM 指标响应
///
/// JSON: 金额为 2 位小数字符串；cpi/spi 为 4 位小数字符串或 null；
/// tcpi 另有字面量 "overrun"。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmMetricsResponse {
    pub entity_id: String,
    pub level: EvmLevel,
    pub parent_id: Option<String>,
    pub control_date: NaiveDate,
    pub budget_bac: Decimal,
    pub planned_value: Decimal,
    pub earned_value: Decimal,
    pub actual_cost: Decimal,
    pub cpi: IndexValue,
    pub spi: IndexValue,
    pub tcpi: TcpiValue,
    pub cost_variance: Decimal,
    pub schedule_variance: Decimal,
    pub estimate_at_completion: Decimal,
    pub variance_at_completion: Decimal,
    pub percent_planned: Decimal,
    pub percent_complete: Decimal,
    pub eac_source: EacSource,
}

impl From<EvmMetrics> for EvmMetricsResponse {
    fn from(m: EvmMetrics) -> Self {
        Self {
            entity_id: m.entity_id,
            level: m.level,
            parent_id: m.parent_id,
            control_date: m.control_date,
            budget_bac: m.budget_bac,
            planned_value: m.planned_value,
            earned_value: m.earned_value,
            actual_cost: m.actual_cost,
            cpi: m.cpi,
            spi: m.spi,
            tcpi: m.tcpi,
            cost_variance: m.cost_variance,
            schedule_variance: m.schedule_variance,
            estimate_at_completion: m.estimate_at_completion,
            variance_at_completion: m.variance_at_completion,
            percent_planned: m.percent_planned,
            percent_complete: m.percent_complete,
            eac_source: m.eac_source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WbeTreeResponse {
    pub wbe: EvmMetricsResponse,
    pub cost_elements: Vec<EvmMetricsResponse>,
}

impl From<WbeEvmNode> for WbeTreeResponse {
    fn from(node: WbeEvmNode) -> Self {
        Self {
            wbe: node.metrics.into(),
            cost_elements: node.cost_elements.into_iter().map(Into::into).collect(),
        }
    }
}

/// 项目树响应（WBE、成本要素均按ID升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTreeResponse {
    pub project: EvmMetricsResponse,
    pub wbes: Vec<WbeTreeResponse>,
}

impl From<ProjectEvmTree> for EvmTreeResponse {
    fn from(tree: ProjectEvmTree) -> Self {
        Self {
            project: tree.project.into(),
            wbes: tree.wbes.into_iter().map(Into::into).collect(),
        }
    }
}

// ==========================================
// EvmApi
// ==========================================
pub struct EvmApi {
    repos: EvmRepositories,
    engine: EvmEngine,
}

impl EvmApi {
    pub fn new(repos: EvmRepositories) -> Self {
        Self {
            repos,
            engine: EvmEngine::new(),
        }
    }

    /// 查询项目级指标
    ///
    /// # 错误
    /// - `ApiError::InvalidControlDate`: 日期格式错误
    /// - `ApiError::NotFound`: 项目不存在或已删除
    pub fn get_project_evm(&self, project_id: &str, control_date: &str) -> ApiResult<EvmMetricsResponse> {
        let control_date = parse_control_date(control_date)?;
        let tree = self.evaluate_project_tree(project_id, control_date)?;
        Ok(tree.project.into())
    }

    /// 查询 WBE 级指标
    pub fn get_wbe_evm(&self, wbe_id: &str, control_date: &str) -> ApiResult<EvmMetricsResponse> {
        let control_date = parse_control_date(control_date)?;
        require_id("WBE ID", wbe_id)?;

        let records = self.repos.record_repo.load_wbe_record_set(wbe_id)?;
        let node = self.engine.evaluate_wbe(&records, control_date);
        tracing::debug!(wbe_id, %control_date, cost_elements = node.cost_elements.len(), "WBE 指标已计算");
        Ok(node.metrics.into())
    }

    /// 查询成本要素级指标
    pub fn get_cost_element_evm(&self, cost_element_id: &str, control_date: &str) -> ApiResult<EvmMetricsResponse> {
        let control_date = parse_control_date(control_date)?;
        require_id("成本要素ID", cost_element_id)?;

        let records = self
            .repos
            .record_repo
            .load_cost_element_record_set(cost_element_id)?;
        Ok(self.engine.evaluate_cost_element(&records, control_date).into())
    }

    /// 查询项目完整指标树
    pub fn get_project_evm_tree(&self, project_id: &str, control_date: &str) -> ApiResult<EvmTreeResponse> {
        let control_date = parse_control_date(control_date)?;
        Ok(self.evaluate_project_tree(project_id, control_date)?.into())
    }

    /// 计算项目树（供基线对比复用）
    pub(crate) fn evaluate_project_tree(&self, project_id: &str, control_date: NaiveDate) -> ApiResult<ProjectEvmTree> {
        require_id("项目ID", project_id)?;

        let records = self.repos.record_repo.load_project_record_set(project_id)?;
        let tree = self.engine.evaluate_project(&records, control_date);
        tracing::debug!(
            project_id,
            %control_date,
            wbes = tree.wbes.len(),
            cost_elements = tree.cost_element_count(),
            "项目指标已计算"
        );
        Ok(tree)
    }
}

pub(crate) fn require_id(label: &str, id: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", label)));
    }
    Ok(())
}
