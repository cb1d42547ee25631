// ==========================================
// 项目挣值管理系统 - EVM 计算引擎
// ==========================================
// 输入: 已拉取的记录集（项目 / WBE / 成本要素）+ 控制日期
// 输出: 各层级 EvmMetrics
// 流程: 成本要素计算 → 层级汇总 → 指数计算
// 红线: 纯计算，不访问数据库，不读取系统时钟
// ==========================================

use crate::domain::metrics::EvmMetrics;
use crate::domain::records::{CostElementRecordSet, ProjectRecordSet, WbeRecordSet};
use crate::engine::aggregation::{HierarchicalAggregator, LevelFigures};
use crate::engine::cost_element::evaluate_cost_element;
use crate::engine::indices::EvmIndexCalculator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// 计算结果树
// ==========================================

/// WBE 节点: WBE 指标 + 其下成本要素指标（按 ID 升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WbeEvmNode {
    pub metrics: EvmMetrics,
    pub cost_elements: Vec<EvmMetrics>,
}

/// 项目树: 项目指标 + WBE 节点（按 ID 升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEvmTree {
    pub project: EvmMetrics,
    pub wbes: Vec<WbeEvmNode>,
}

impl ProjectEvmTree {
    /// 按 项目 → (WBE → 其成本要素)* 的顺序展开
    pub fn flatten(&self) -> Vec<EvmMetrics> {
        let mut out = Vec::with_capacity(1 + self.wbes.len() + self.cost_element_count());
        out.push(self.project.clone());
        for wbe in &self.wbes {
            out.push(wbe.metrics.clone());
            out.extend(wbe.cost_elements.iter().cloned());
        }
        out
    }

    /// 成本要素总数
    pub fn cost_element_count(&self) -> usize {
        self.wbes.iter().map(|w| w.cost_elements.len()).sum()
    }
}

// ==========================================
// EvmEngine - EVM 计算引擎
// ==========================================
pub struct EvmEngine {
    aggregator: HierarchicalAggregator,
    index_calculator: EvmIndexCalculator,
}

impl EvmEngine {
    pub fn new() -> Self {
        Self {
            aggregator: HierarchicalAggregator::new(),
            index_calculator: EvmIndexCalculator::new(),
        }
    }

    /// 计算单个成本要素
    pub fn evaluate_cost_element(
        &self,
        records: &CostElementRecordSet,
        control_date: NaiveDate,
    ) -> EvmMetrics {
        let evaluation = evaluate_cost_element(records, control_date);
        self.to_metrics(evaluation.figures, control_date)
    }

    /// 计算 WBE（含其下成本要素）
    pub fn evaluate_wbe(&self, records: &WbeRecordSet, control_date: NaiveDate) -> WbeEvmNode {
        let (figures, cost_elements) = self.wbe_figures(records, control_date);
        WbeEvmNode {
            metrics: self.to_metrics(figures, control_date),
            cost_elements: cost_elements
                .into_iter()
                .map(|f| self.to_metrics(f, control_date))
                .collect(),
        }
    }

    /// 计算整个项目树
    pub fn evaluate_project(&self, records: &ProjectRecordSet, control_date: NaiveDate) -> ProjectEvmTree {
        let mut wbes: Vec<&WbeRecordSet> = records.wbes.iter().collect();
        wbes.sort_by(|a, b| a.wbe.wbe_id.cmp(&b.wbe.wbe_id));

        let mut wbe_figures = Vec::with_capacity(wbes.len());
        let mut nodes = Vec::with_capacity(wbes.len());
        for wbe in wbes {
            let (figures, cost_elements) = self.wbe_figures(wbe, control_date);
            nodes.push(WbeEvmNode {
                metrics: self.to_metrics(figures.clone(), control_date),
                cost_elements: cost_elements
                    .into_iter()
                    .map(|f| self.to_metrics(f, control_date))
                    .collect(),
            });
            wbe_figures.push(figures);
        }

        let project_figures = self.aggregator.aggregate_project(&records.project, &wbe_figures);

        tracing::debug!(
            project_id = %records.project.project_id,
            %control_date,
            wbe_count = nodes.len(),
            cost_element_count = records.cost_element_count(),
            "项目 EVM 计算完成"
        );

        ProjectEvmTree {
            project: self.to_metrics(project_figures, control_date),
            wbes: nodes,
        }
    }

    fn wbe_figures(
        &self,
        records: &WbeRecordSet,
        control_date: NaiveDate,
    ) -> (LevelFigures, Vec<LevelFigures>) {
        let mut cost_elements: Vec<LevelFigures> = records
            .cost_elements
            .iter()
            .map(|ce| evaluate_cost_element(ce, control_date).figures)
            .collect();
        cost_elements.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        let figures = self.aggregator.aggregate_wbe(&records.wbe, &cost_elements);
        (figures, cost_elements)
    }

    fn to_metrics(&self, figures: LevelFigures, control_date: NaiveDate) -> EvmMetrics {
        let indices = self.index_calculator.calculate(&figures.totals);
        EvmMetrics {
            entity_id: figures.entity_id,
            level: figures.level,
            parent_id: figures.parent_id,
            control_date,
            budget_bac: figures.totals.budget_bac,
            planned_value: figures.totals.planned_value,
            earned_value: figures.totals.earned_value,
            actual_cost: figures.totals.actual_cost,
            estimate_at_completion: figures.totals.estimate_at_completion,
            cpi: indices.cpi,
            spi: indices.spi,
            tcpi: indices.tcpi,
            cost_variance: indices.cost_variance,
            schedule_variance: indices.schedule_variance,
            variance_at_completion: indices.variance_at_completion,
            percent_planned: figures.percent_planned,
            percent_complete: figures.percent_complete,
            eac_source: figures.eac_source,
        }
    }
}

impl Default for EvmEngine {
    fn default() -> Self {
        Self::new()
    }
}
