// ==========================================
// 项目挣值管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少基线并发写入时的偶发 busy 错误
// - 内嵌建表脚本，测试库与正式库使用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（微秒精度，保证 created_at 与日终比较不丢精度）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 建表脚本
///
/// 说明：
/// - 金额与比率以 TEXT 存储十进制字符串，避免 REAL 带来的二进制舍入
/// - 指数列为 NULL 表示“不可计算”，TCPI 额外允许 'overrun'
/// - baseline_snapshot 只允许 INSERT / DELETE（整体替换），UPDATE 由触发器拒绝
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS project (
    project_id TEXT PRIMARY KEY,
    project_name TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS wbe (
    wbe_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project(project_id),
    wbe_name TEXT NOT NULL,
    deleted_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_wbe_project ON wbe(project_id);

CREATE TABLE IF NOT EXISTS cost_element (
    cost_element_id TEXT PRIMARY KEY,
    wbe_id TEXT NOT NULL REFERENCES wbe(wbe_id),
    cost_element_name TEXT NOT NULL,
    budget_bac TEXT NOT NULL,
    deleted_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_cost_element_wbe ON cost_element(wbe_id);

CREATE TABLE IF NOT EXISTS schedule_entry (
    schedule_id TEXT PRIMARY KEY,
    cost_element_id TEXT NOT NULL REFERENCES cost_element(cost_element_id),
    registration_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    progression_type TEXT NOT NULL
        CHECK (progression_type IN ('LINEAR', 'GAUSSIAN', 'LOGARITHMIC'))
);
CREATE INDEX IF NOT EXISTS idx_schedule_ce ON schedule_entry(cost_element_id);

CREATE TABLE IF NOT EXISTS earned_value_entry (
    earned_value_id TEXT PRIMARY KEY,
    cost_element_id TEXT NOT NULL REFERENCES cost_element(cost_element_id),
    completion_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    percent_complete TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_earned_value_ce ON earned_value_entry(cost_element_id);

CREATE TABLE IF NOT EXISTS cost_registration (
    cost_registration_id TEXT PRIMARY KEY,
    cost_element_id TEXT NOT NULL REFERENCES cost_element(cost_element_id),
    registration_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    amount TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cost_registration_ce ON cost_registration(cost_element_id);

CREATE TABLE IF NOT EXISTS forecast (
    forecast_id TEXT PRIMARY KEY,
    cost_element_id TEXT NOT NULL REFERENCES cost_element(cost_element_id),
    forecast_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    estimate_at_completion TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_forecast_ce ON forecast(cost_element_id);

CREATE TABLE IF NOT EXISTS baseline (
    baseline_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project(project_id),
    control_date TEXT NOT NULL,
    description TEXT,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    revision INTEGER NOT NULL DEFAULT 0,
    config_snapshot_json TEXT,
    cancelled_at TEXT,
    cancelled_by TEXT,
    cancel_reason TEXT
);
CREATE INDEX IF NOT EXISTS idx_baseline_project ON baseline(project_id);

CREATE TABLE IF NOT EXISTS baseline_snapshot (
    baseline_id TEXT NOT NULL REFERENCES baseline(baseline_id),
    level TEXT NOT NULL CHECK (level IN ('project', 'wbe', 'cost_element')),
    entity_id TEXT NOT NULL,
    parent_id TEXT,
    control_date TEXT NOT NULL,
    budget_bac TEXT NOT NULL,
    planned_value TEXT NOT NULL,
    earned_value TEXT NOT NULL,
    actual_cost TEXT NOT NULL,
    estimate_at_completion TEXT NOT NULL,
    cpi TEXT,
    spi TEXT,
    tcpi TEXT,
    cost_variance TEXT NOT NULL,
    schedule_variance TEXT NOT NULL,
    variance_at_completion TEXT NOT NULL,
    percent_planned TEXT NOT NULL,
    percent_complete TEXT NOT NULL,
    eac_source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (baseline_id, level, entity_id)
);

CREATE TRIGGER IF NOT EXISTS trg_baseline_snapshot_immutable
BEFORE UPDATE ON baseline_snapshot
BEGIN
    SELECT RAISE(ABORT, 'IMMUTABLE: baseline_snapshot rows cannot be updated');
END;

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    project_id TEXT,
    baseline_id TEXT,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    payload_json TEXT,
    detail TEXT
);
CREATE INDEX IF NOT EXISTS idx_action_log_baseline ON action_log(baseline_id);

INSERT OR IGNORE INTO schema_version (version) VALUES (1);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
