// ==========================================
// 服装生产运营平台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建表入口，库与测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
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

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema
///
/// 幂等：所有建表语句使用 IF NOT EXISTS，可在已有库上重复执行。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS orders (
            order_id TEXT PRIMARY KEY,
            order_number TEXT,
            client_name TEXT,
            status TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'NORMAL',
            delivery_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS order_line_item (
            line_item_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
            description TEXT,
            quantity INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS material_inventory (
            material_id TEXT PRIMARY KEY,
            material_name TEXT NOT NULL,
            unit TEXT NOT NULL,
            current_stock REAL NOT NULL DEFAULT 0,
            minimum_stock REAL NOT NULL DEFAULT 0,
            reorder_point REAL NOT NULL DEFAULT 0,
            supplier TEXT
        );

        CREATE TABLE IF NOT EXISTS material_requirement (
            requirement_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
            material_id TEXT NOT NULL,
            required_quantity REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS material_transaction (
            transaction_id TEXT PRIMARY KEY,
            material_id TEXT NOT NULL,
            transaction_type TEXT NOT NULL,
            quantity REAL NOT NULL,
            unit_cost REAL,
            reference_type TEXT,
            reference_id TEXT,
            planned_date TEXT,
            notes TEXT,
            created_by TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS employee (
            employee_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            base_salary REAL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS production_line (
            line_id TEXT PRIMARY KEY,
            line_name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            efficiency REAL NOT NULL DEFAULT 1.0
        );

        CREATE TABLE IF NOT EXISTS work_station (
            station_id TEXT PRIMARY KEY,
            line_id TEXT NOT NULL REFERENCES production_line(line_id),
            station_name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS worker_allocation (
            allocation_id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL REFERENCES employee(employee_id),
            line_id TEXT REFERENCES production_line(line_id),
            allocation_date TEXT NOT NULL,
            shift TEXT NOT NULL,
            hours_allocated REAL NOT NULL,
            skill_level TEXT NOT NULL,
            hourly_rate REAL,
            UNIQUE(worker_id, allocation_date, shift)
        );

        CREATE TABLE IF NOT EXISTS production_schedule (
            schedule_id TEXT PRIMARY KEY,
            order_id TEXT REFERENCES orders(order_id),
            line_id TEXT REFERENCES production_line(line_id),
            stage TEXT NOT NULL,
            status TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'NORMAL',
            planned_start TEXT NOT NULL,
            planned_end TEXT NOT NULL,
            actual_start TEXT,
            actual_end TEXT,
            planned_quantity INTEGER NOT NULL DEFAULT 0,
            completed_quantity INTEGER NOT NULL DEFAULT 0,
            rejected_quantity INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS worker_assignment (
            assignment_id TEXT PRIMARY KEY,
            worker_id TEXT NOT NULL REFERENCES employee(employee_id),
            schedule_id TEXT REFERENCES production_schedule(schedule_id),
            station_id TEXT REFERENCES work_station(station_id),
            assigned_date TEXT NOT NULL,
            shift TEXT NOT NULL,
            assigned_hours REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_worker_assignment_worker_date
            ON worker_assignment(worker_id, assigned_date);

        CREATE TABLE IF NOT EXISTS workflow_instance (
            workflow_id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(order_id),
            status TEXT NOT NULL,
            priority TEXT NOT NULL,
            current_stage TEXT NOT NULL,
            total_steps INTEGER NOT NULL,
            completed_steps INTEGER NOT NULL DEFAULT 0,
            estimated_duration_hours REAL NOT NULL,
            start_date TEXT NOT NULL,
            estimated_end_date TEXT NOT NULL,
            actual_end_date TEXT,
            pause_reason TEXT,
            metadata TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS workflow_step (
            step_id TEXT PRIMARY KEY,
            workflow_id TEXT NOT NULL REFERENCES workflow_instance(workflow_id) ON DELETE CASCADE,
            stage TEXT NOT NULL,
            step_name TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            dependencies TEXT NOT NULL DEFAULT '[]',
            required_skill TEXT NOT NULL,
            estimated_hours REAL NOT NULL,
            status TEXT NOT NULL,
            assigned_worker TEXT,
            planned_start TEXT NOT NULL,
            planned_end TEXT NOT NULL,
            actual_start TEXT,
            actual_end TEXT,
            quality_score REAL,
            notes TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_workflow_step_workflow
            ON workflow_step(workflow_id, seq_no);

        CREATE TABLE IF NOT EXISTS production_alert (
            alert_id TEXT PRIMARY KEY,
            workflow_id TEXT,
            alert_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            expires_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
