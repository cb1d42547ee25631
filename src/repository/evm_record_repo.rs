// ==========================================
// 项目挣值管理系统 - 时间切片记录数据仓储
// ==========================================
// 记录: schedule_entry / earned_value_entry / cost_registration / forecast
// 查询: 按成本要素返回全部记录（不做可见性过滤，由引擎按控制日期判定）
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

mod core;
mod queries;
mod record_set;

#[cfg(test)]
mod tests;

pub use self::core::EvmRecordRepository;
pub(crate) use self::record_set::load_project_record_set;
