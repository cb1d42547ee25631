// ==========================================
// 项目挣值管理系统 - 列值编解码
// ==========================================
// 日期 / 时间戳 / 十进制金额 的 TEXT 存储格式统一在此处理
// 解析失败统一转为 FromSqlConversionFailure（携带列号）
// ==========================================

use crate::db::{DATE_FORMAT, TIMESTAMP_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 兼容秒级精度的历史数据
const TIMESTAMP_FORMAT_SECONDS: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT_SECONDS))
        .map_err(|e| conversion_error(idx, e))
}

pub fn parse_optional_timestamp(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

pub fn parse_decimal(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| conversion_error(idx, e))
}

/// 字段语义错误（枚举取值非法等）
#[derive(Debug)]
pub struct InvalidColumnValue(pub String);

impl std::fmt::Display for InvalidColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvalidColumnValue {}

pub fn invalid_value(idx: usize, message: String) -> rusqlite::Error {
    conversion_error(idx, InvalidColumnValue(message))
}
