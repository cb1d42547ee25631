// ==========================================
// 项目挣值管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{BaselineApi, EvmApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{BaselineSnapshotService, EvmRepositories};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "EVM_ENGINE_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接；基线快照服务在进程内只有一个实例，
/// 以保证按基线加锁对所有调用方生效。
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// EVM 查询API
    pub evm_api: Arc<EvmApi>,

    /// 基线API
    pub baseline_api: Arc<BaselineApi>,

    /// 配置管理
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（测试与命令行工具直接录入数据时使用）
    pub repos: EvmRepositories,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 初始化表结构（幂等）并检查 schema 版本
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;

        match read_schema_version(&conn) {
            Ok(Some(version)) if version == CURRENT_SCHEMA_VERSION => {}
            Ok(Some(version)) => {
                return Err(format!(
                    "数据库 schema 版本不匹配: 期望 {}, 实际 {}",
                    CURRENT_SCHEMA_VERSION, version
                ));
            }
            Ok(None) => return Err("数据库缺少 schema_version 记录".to_string()),
            Err(e) => return Err(format!("读取 schema 版本失败: {}", e)),
        }

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已打开的连接组装（连接需已建表）
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        let repos = EvmRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let evm_api = Arc::new(EvmApi::new(repos.clone()));
        let snapshot_service = Arc::new(BaselineSnapshotService::new(
            repos.clone(),
            config_manager.clone(),
        ));
        let baseline_api = Arc::new(BaselineApi::new(snapshot_service, evm_api.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            evm_api,
            baseline_api,
            config_manager,
            repos,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 `EVM_ENGINE_DB_PATH` > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./evm_engine.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("evm-engine");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("evm_engine.db");
        }
    }

    path.to_string_lossy().to_string()
}
