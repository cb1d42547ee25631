// ==========================================
// 项目挣值管理系统 - 可见性过滤器
// ==========================================
// 规则（双时间戳）: 记录在控制日期可见 ⇔
//   effective_date <= control_date
//   且 created_at <= end_of_day(control_date)
// 红线: 全系统只有这一个判定函数，所有记录种类共用
// ==========================================

use crate::domain::records::{CostRegistration, EarnedValueEntry, Forecast, ScheduleEntry};
use crate::domain::types::RecordKind;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 控制日期当天的最后一刻 (23:59:59.999999)
pub fn end_of_day(control_date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999999 一定合法
    let last_instant = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or(NaiveTime::MIN);
    control_date.and_time(last_instant)
}

/// 双时间戳可见性判定
///
/// # 参数
/// - `effective_date`: 业务生效日期
/// - `created_at`: 系统录入时间
/// - `control_date`: 控制日期
pub fn is_visible(
    effective_date: NaiveDate,
    created_at: NaiveDateTime,
    control_date: NaiveDate,
) -> bool {
    effective_date <= control_date && created_at <= end_of_day(control_date)
}

// ==========================================
// TimeSlicedRecord - 带双时间戳的原始记录
// ==========================================
pub trait TimeSlicedRecord {
    /// 记录种类
    const KIND: RecordKind;

    /// 业务生效日期
    fn effective_date(&self) -> NaiveDate;

    /// 系统录入时间
    fn created_at(&self) -> NaiveDateTime;

    /// 在控制日期是否可见
    fn is_visible_at(&self, control_date: NaiveDate) -> bool {
        is_visible(self.effective_date(), self.created_at(), control_date)
    }
}

impl TimeSlicedRecord for ScheduleEntry {
    const KIND: RecordKind = RecordKind::Schedule;

    fn effective_date(&self) -> NaiveDate {
        self.registration_date
    }

    fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

impl TimeSlicedRecord for EarnedValueEntry {
    const KIND: RecordKind = RecordKind::EarnedValue;

    fn effective_date(&self) -> NaiveDate {
        self.completion_date
    }

    fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

impl TimeSlicedRecord for CostRegistration {
    const KIND: RecordKind = RecordKind::CostRegistration;

    fn effective_date(&self) -> NaiveDate {
        self.registration_date
    }

    fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

impl TimeSlicedRecord for Forecast {
    const KIND: RecordKind = RecordKind::Forecast;

    fn effective_date(&self) -> NaiveDate {
        self.forecast_date
    }

    fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
}

/// 过滤出控制日期可见的全部记录（保持原顺序）
pub fn visible_records<T: TimeSlicedRecord>(
    records: &[T],
    control_date: NaiveDate,
) -> impl Iterator<Item = &T> {
    records.iter().filter(move |r| r.is_visible_at(control_date))
}

/// 选出控制日期的“当前”记录
///
/// 规则: 可见记录中 effective_date 最大者；相同时取 created_at 最大者。
/// 二者都相同时保留先出现的记录。
pub fn select_current<T: TimeSlicedRecord>(records: &[T], control_date: NaiveDate) -> Option<&T> {
    let mut current: Option<&T> = None;
    let mut hidden = 0usize;

    for record in records {
        if !record.is_visible_at(control_date) {
            hidden += 1;
            continue;
        }
        let newer = match current {
            None => true,
            Some(best) => {
                (record.effective_date(), record.created_at())
                    > (best.effective_date(), best.created_at())
            }
        };
        if newer {
            current = Some(record);
        }
    }

    tracing::trace!(
        kind = %T::KIND,
        %control_date,
        total = records.len(),
        hidden,
        found = current.is_some(),
        "选择当前记录"
    );

    current
}
