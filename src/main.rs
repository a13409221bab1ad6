// ==========================================
// 服装生产运营平台 - 服务主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产计划与调度核心，由管理端以进程内/RPC 方式调用
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use garment_aps::{db, logging, PlanningApi, ScheduleApi, WorkflowApi};

/// 默认数据库路径: <用户数据目录>/garment-aps/garment_aps.db
fn get_default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("garment-aps").join("garment_aps.db")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 生产计划与调度核心", garment_aps::APP_NAME);
    tracing::info!("系统版本: {}", garment_aps::VERSION);
    tracing::info!("==================================================");

    // 打开数据库并初始化 schema
    let db_path = get_default_db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_path_str = db_path.to_string_lossy().to_string();
    tracing::info!("使用数据库: {}", db_path_str);

    let conn = db::open_sqlite_connection(&db_path_str)?;
    db::init_schema(&conn)?;
    match db::read_schema_version(&conn)? {
        Some(v) if v == db::CURRENT_SCHEMA_VERSION => {
            tracing::info!("schema_version = {}", v);
        }
        Some(v) => {
            tracing::warn!(
                "schema_version 不匹配: 库为 {}, 代码期望 {}",
                v,
                db::CURRENT_SCHEMA_VERSION
            );
        }
        None => tracing::warn!("数据库缺少 schema_version 表"),
    }

    // 构建服务（进程内接口，由上层管理端调用）
    let shared = Arc::new(Mutex::new(conn));
    let _planning = PlanningApi::new(shared.clone());
    let _schedule = ScheduleApi::new(shared.clone());
    let _workflow = WorkflowApi::new(shared);

    tracing::info!("服务初始化完成 (MRP / 排产 / 工作流)");
    Ok(())
}
