// ==========================================
// 项目挣值管理系统 - 基线快照服务
// ==========================================
// 职责: 冻结某控制日期下全部层级的 EVM 指标
// 流程: 读取记录集 → EvmEngine 计算 → 写入快照行（同一事务）
// 并发: 进程内按基线加锁 + 数据库 revision 乐观锁；冲突按配置重试
// 红线: 快照行一经写入不可修改，只能整体替换
// ==========================================

use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::baseline::{Baseline, BaselineMetadata, BaselineSnapshotSet};
use crate::engine::evm::EvmEngine;
use crate::engine::repositories::EvmRepositories;
use crate::repository::{BaselineReplacement, RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// BaselineSnapshotService
// ==========================================
pub struct BaselineSnapshotService {
    repos: EvmRepositories,
    engine: EvmEngine,
    config_manager: Arc<ConfigManager>,
    // 每个基线一把锁；不同基线互不阻塞
    baseline_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BaselineSnapshotService {
    pub fn new(repos: EvmRepositories, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            repos,
            engine: EvmEngine::new(),
            config_manager,
            baseline_locks: Mutex::new(HashMap::new()),
        }
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建基线快照
    ///
    /// # 参数
    /// - `project_id`: 项目ID
    /// - `control_date`: 控制日期（快照内全部指标按此日期计算）
    /// - `metadata`: 描述与创建人（创建人缺省取配置 `default_created_by`）
    ///
    /// # 返回
    /// 已提交的基线与快照行（项目 1 行 + 每个 WBE 1 行 + 每个成本要素 1 行）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 项目不存在或已软删除
    #[instrument(skip(self, metadata), fields(project_id = %project_id, control_date = %control_date))]
    pub fn create_snapshot(
        &self,
        project_id: &str,
        control_date: NaiveDate,
        metadata: BaselineMetadata,
    ) -> RepositoryResult<BaselineSnapshotSet> {
        let created_by = match metadata.created_by {
            Some(actor) => actor,
            None => self
                .config_manager
                .get_default_created_by()
                .map_err(|e| RepositoryError::InternalError(format!("读取默认创建人失败: {}", e)))?,
        };

        let baseline = Baseline {
            baseline_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            control_date,
            description: metadata.description,
            created_by,
            created_at: now(),
            revision: 0,
            config_snapshot_json: Some(self.config_snapshot()?),
            cancelled_at: None,
            cancelled_by: None,
            cancel_reason: None,
        };

        let engine = &self.engine;
        let set = self
            .repos
            .baseline_repo
            .create_with_snapshot(&baseline, |records| {
                engine.evaluate_project(records, control_date).flatten()
            })?;

        let (projects, wbes, cost_elements) = set.count_by_level();
        tracing::info!(
            baseline_id = %set.baseline.baseline_id,
            projects,
            wbes,
            cost_elements,
            "基线快照已创建"
        );

        self.record_action(
            ActionType::CreateBaseline,
            &set.baseline,
            &set.baseline.created_by,
            json!({
                "control_date": control_date.to_string(),
                "revision": set.baseline.revision,
                "row_count": set.rows.len(),
            }),
            set.baseline.description.clone(),
        );

        Ok(set)
    }

    /// 整体替换基线快照（编辑流程）
    ///
    /// `control_date` / `description` 为 None 时沿用基线当前值。
    /// 同一基线的并发替换在进程内串行；跨连接的冲突由 revision 检测，
    /// 按 `snapshot_conflict_max_retries` 重试后仍冲突则返回 `SnapshotConflict`。
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 基线不存在
    /// - `RepositoryError::BusinessRuleViolation`: 基线已作废
    /// - `RepositoryError::SnapshotConflict`: 重试耗尽
    #[instrument(skip(self, description), fields(baseline_id = %baseline_id))]
    pub fn replace_snapshot(
        &self,
        baseline_id: &str,
        control_date: Option<NaiveDate>,
        description: Option<String>,
        actor: &str,
    ) -> RepositoryResult<BaselineSnapshotSet> {
        self.with_baseline_lock(baseline_id, || {
            self.replace_with_retries(baseline_id, control_date, description, actor, |_| {})
        })
    }

    /// 替换重试循环；`before_attempt` 在每次读取修订号之后、写事务之前调用
    fn replace_with_retries(
        &self,
        baseline_id: &str,
        control_date: Option<NaiveDate>,
        description: Option<String>,
        actor: &str,
        mut before_attempt: impl FnMut(u32),
    ) -> RepositoryResult<BaselineSnapshotSet> {
        let max_retries = self
            .config_manager
            .get_snapshot_conflict_max_retries()
            .map_err(|e| RepositoryError::InternalError(format!("读取冲突重试次数失败: {}", e)))?;
        let config_snapshot_json = self.config_snapshot()?;

        let mut attempt: u32 = 0;
        loop {
            let current = self
                .repos
                .baseline_repo
                .find_by_id(baseline_id)?
                .ok_or_else(|| RepositoryError::not_found("Baseline", baseline_id))?;

            let request = BaselineReplacement {
                baseline_id: baseline_id.to_string(),
                expected_revision: current.revision,
                control_date: control_date.unwrap_or(current.control_date),
                description: description.clone().or_else(|| current.description.clone()),
                config_snapshot_json: Some(config_snapshot_json.clone()),
                replaced_at: now(),
            };
            before_attempt(attempt);

            let engine = &self.engine;
            let target_date = request.control_date;
            let result = self
                .repos
                .baseline_repo
                .replace_with_snapshot(&request, |records| {
                    engine.evaluate_project(records, target_date).flatten()
                });

            match result {
                Ok(set) => {
                    tracing::info!(
                        revision = set.baseline.revision,
                        control_date = %set.baseline.control_date,
                        rows = set.rows.len(),
                        "基线快照已替换"
                    );
                    self.record_action(
                        ActionType::ReplaceBaseline,
                        &set.baseline,
                        actor,
                        json!({
                            "control_date": set.baseline.control_date.to_string(),
                            "previous_control_date": current.control_date.to_string(),
                            "revision": set.baseline.revision,
                            "row_count": set.rows.len(),
                            "attempts": attempt + 1,
                        }),
                        set.baseline.description.clone(),
                    );
                    return Ok(set);
                }
                Err(e) if e.is_snapshot_conflict() && attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, max_retries, error = %e, "基线快照冲突，使用新事务重试");
                }
                Err(e) => {
                    if e.is_snapshot_conflict() {
                        tracing::warn!(error = %e, "基线快照冲突，重试次数已用尽");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// 作废基线
    ///
    /// 仅写入作废元数据，快照数值不变；作废后的基线不能再替换。
    #[instrument(skip(self, reason), fields(baseline_id = %baseline_id, actor = %actor))]
    pub fn cancel_baseline(&self, baseline_id: &str, actor: &str, reason: Option<&str>) -> RepositoryResult<Baseline> {
        let baseline = self.with_baseline_lock(baseline_id, || {
            self.repos
                .baseline_repo
                .cancel(baseline_id, actor, reason, now())
        })?;
        tracing::info!("基线已作废");

        self.record_action(
            ActionType::CancelBaseline,
            &baseline,
            actor,
            json!({ "reason": reason, "revision": baseline.revision }),
            reason.map(|r| r.to_string()),
        );

        Ok(baseline)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn get_snapshot(&self, baseline_id: &str) -> RepositoryResult<BaselineSnapshotSet> {
        self.repos.baseline_repo.find_snapshot_set(baseline_id)
    }

    pub fn list_baselines(&self, project_id: &str, include_cancelled: bool) -> RepositoryResult<Vec<Baseline>> {
        self.repos
            .baseline_repo
            .list_by_project(project_id, include_cancelled)
    }

    /// 项目的基线操作日志（最新在前，最多 `limit` 条）
    ///
    /// # 错误
    /// - `RepositoryError::NotFound`: 项目不存在或已软删除
    pub fn list_actions(&self, project_id: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        if self.repos.project_repo.find_project(project_id)?.is_none() {
            return Err(RepositoryError::not_found("Project", project_id));
        }
        self.repos
            .action_log_repo
            .find_by_project_id(project_id, limit)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 持有基线锁执行 `f`；结束后若无其他持有者则移除该锁
    fn with_baseline_lock<T>(
        &self,
        baseline_id: &str,
        f: impl FnOnce() -> RepositoryResult<T>,
    ) -> RepositoryResult<T> {
        let lock = self.baseline_lock(baseline_id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(e) => Err(RepositoryError::LockError(e.to_string())),
        };
        drop(lock);
        self.release_baseline_lock(baseline_id);
        result
    }

    fn baseline_lock(&self, baseline_id: &str) -> RepositoryResult<Arc<Mutex<()>>> {
        let mut locks = self
            .baseline_locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(locks
            .entry(baseline_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // 引用计数只在 map 锁内增加，计数为 1 时只剩 map 自身持有
    fn release_baseline_lock(&self, baseline_id: &str) {
        match self.baseline_locks.lock() {
            Ok(mut locks) => {
                if locks
                    .get(baseline_id)
                    .is_some_and(|lock| Arc::strong_count(lock) == 1)
                {
                    locks.remove(baseline_id);
                }
            }
            Err(e) => tracing::warn!("释放基线锁失败: {}", e),
        }
    }

    fn config_snapshot(&self) -> RepositoryResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| RepositoryError::InternalError(format!("读取配置快照失败: {}", e)))
    }

    /// 写操作日志（快照已提交，日志失败只告警）
    fn record_action(
        &self,
        action_type: ActionType,
        baseline: &Baseline,
        actor: &str,
        payload: serde_json::Value,
        detail: Option<String>,
    ) {
        let log = ActionLog {
            action_id: Uuid::new_v4().to_string(),
            project_id: Some(baseline.project_id.clone()),
            baseline_id: Some(baseline.baseline_id.clone()),
            action_type: action_type.as_str().to_string(),
            action_ts: now(),
            actor: actor.to_string(),
            payload_json: Some(payload),
            detail,
        };
        if let Err(e) = self.repos.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}, 继续执行", e);
        }
    }
}

/// 当前 UTC 时间，截断到微秒（与存储精度一致）
fn now() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000).unwrap_or(now)
}
