// ==========================================
// 项目挣值管理系统 - 命令行入口
// ==========================================
// 用法:
//   evm-engine <db> project  <project_id> <YYYY-MM-DD>
//   evm-engine <db> baseline <project_id> <YYYY-MM-DD> [description]
//   evm-engine <db> replace  <baseline_id> <actor> [YYYY-MM-DD]
//   evm-engine <db> cancel   <baseline_id> <actor> [reason]
//   evm-engine <db> compare  <baseline_id> <YYYY-MM-DD>
//   evm-engine <db> list     <project_id>
//   evm-engine <db> history  <project_id> [limit]
// <db> 为 "-" 时使用默认路径（EVM_ENGINE_DB_PATH 或用户数据目录）
// ==========================================

use std::error::Error;

use evm_engine::app::{get_default_db_path, AppState};
use evm_engine::logging;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const USAGE: &str = "用法: evm-engine <db> <project|baseline|replace|cancel|compare|list|history> <args...>";

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let db_path = if args[0] == "-" {
        get_default_db_path()
    } else {
        args[0].clone()
    };
    tracing::info!("项目挣值管理系统 v{}，数据库: {}", evm_engine::VERSION, db_path);

    let state = AppState::new(db_path)?;
    let arg = |i: usize| args.get(i).map(String::as_str);

    let output = match (args[1].as_str(), arg(2), arg(3)) {
        ("project", Some(project_id), Some(date)) => {
            serde_json::to_string_pretty(&state.evm_api.get_project_evm_tree(project_id, date)?)?
        }
        ("baseline", Some(project_id), Some(date)) => {
            let description = arg(4).map(str::to_string);
            serde_json::to_string_pretty(
                &state
                    .baseline_api
                    .create_baseline(project_id, date, description, None)?,
            )?
        }
        ("replace", Some(baseline_id), Some(actor)) => serde_json::to_string_pretty(
            &state
                .baseline_api
                .replace_baseline(baseline_id, arg(4), None, actor)?,
        )?,
        ("cancel", Some(baseline_id), Some(actor)) => serde_json::to_string_pretty(
            &state
                .baseline_api
                .cancel_baseline(baseline_id, actor, arg(4))?,
        )?,
        ("compare", Some(baseline_id), Some(date)) => serde_json::to_string_pretty(
            &state
                .baseline_api
                .compare_baseline_to_live(baseline_id, date)?,
        )?,
        ("list", Some(project_id), _) => {
            serde_json::to_string_pretty(&state.baseline_api.list_baselines(project_id, true)?)?
        }
        ("history", Some(project_id), limit) => {
            let limit = match limit.map(str::parse::<usize>).transpose() {
                Ok(limit) => limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
                Err(e) => {
                    eprintln!("无效的条数: {}", e);
                    std::process::exit(2);
                }
            };
            serde_json::to_string_pretty(&state.baseline_api.list_project_actions(project_id, limit)?)?
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    println!("{}", output);
    Ok(())
}
