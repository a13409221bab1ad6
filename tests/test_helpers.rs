// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

use garment_aps::db;
use garment_aps::domain::order::{Order, OrderLineItem};
use garment_aps::domain::types::{OrderStatus, Priority, ShiftType, SkillLevel};
use garment_aps::domain::worker::WorkerAllocation;
use garment_aps::repository::{OrderRepository, WorkerAllocationRepository};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - Arc<Mutex<Connection>>: 共享连接
pub fn create_test_db() -> (NamedTempFile, Arc<Mutex<Connection>>) {
    let temp_file = NamedTempFile::new().expect("创建临时文件失败");
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path).expect("打开数据库失败");
    db::init_schema(&conn).expect("初始化 schema 失败");

    (temp_file, Arc::new(Mutex::new(conn)))
}

/// 插入物料库存
pub fn seed_material(
    conn: &Arc<Mutex<Connection>>,
    material_id: &str,
    name: &str,
    unit: &str,
    current_stock: f64,
    minimum_stock: f64,
    reorder_point: f64,
    supplier: Option<&str>,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO material_inventory (
            material_id, material_name, unit, current_stock,
            minimum_stock, reorder_point, supplier
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![material_id, name, unit, current_stock, minimum_stock, reorder_point, supplier],
    )
    .expect("插入物料失败");
}

/// 插入开放订单（单订单行）及其物料需求
pub fn seed_order_with_requirement(
    conn: &Arc<Mutex<Connection>>,
    order_id: &str,
    quantity: i64,
    delivery_date: Option<NaiveDate>,
    priority: Priority,
    material_id: &str,
    required_quantity: f64,
) {
    let repo = OrderRepository::from_connection(conn.clone());
    repo.insert(&Order {
        order_id: order_id.to_string(),
        order_number: Some(format!("SO-{}", order_id)),
        client_name: Some("测试客户".to_string()),
        status: OrderStatus::Open,
        priority,
        delivery_date,
        line_items: vec![OrderLineItem {
            line_item_id: format!("{}-L1", order_id),
            order_id: order_id.to_string(),
            description: Some("圆领T恤".to_string()),
            quantity,
        }],
        created_at: Utc::now(),
    })
    .expect("插入订单失败");

    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO material_requirement (requirement_id, order_id, material_id, required_quantity)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![format!("{}-R1", order_id), order_id, material_id, required_quantity],
    )
    .expect("插入物料需求失败");
}

/// 插入计划收货事务（采购单入库）
pub fn seed_planned_receipt(
    conn: &Arc<Mutex<Connection>>,
    material_id: &str,
    quantity: f64,
    planned_date: NaiveDate,
    unit_cost: Option<f64>,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO material_transaction (
            transaction_id, material_id, transaction_type, quantity, unit_cost,
            reference_type, reference_id, planned_date, created_at
        ) VALUES (?1, ?2, 'IN', ?3, ?4, 'PURCHASE_ORDER', ?5, ?6, ?7)
        "#,
        params![
            uuid::Uuid::new_v4().to_string(),
            material_id,
            quantity,
            unit_cost,
            format!("PO-{}", material_id),
            planned_date,
            Utc::now(),
        ],
    )
    .expect("插入计划收货失败");
}

/// 插入员工
pub fn seed_employee(conn: &Arc<Mutex<Connection>>, employee_id: &str, name: &str, active: bool) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO employee (employee_id, name, base_salary, is_active) VALUES (?1, ?2, ?3, ?4)",
        params![employee_id, name, 18000.0, active as i64],
    )
    .expect("插入员工失败");
}

/// 插入工人排班
pub fn seed_allocation(
    conn: &Arc<Mutex<Connection>>,
    worker_id: &str,
    line_id: Option<&str>,
    date: NaiveDate,
    shift: ShiftType,
    hours: f64,
    skill: SkillLevel,
    hourly_rate: f64,
) {
    let repo = WorkerAllocationRepository::from_connection(conn.clone());
    repo.insert(&WorkerAllocation {
        allocation_id: uuid::Uuid::new_v4().to_string(),
        worker_id: worker_id.to_string(),
        line_id: line_id.map(|s| s.to_string()),
        allocation_date: date,
        shift,
        hours_allocated: hours,
        skill_level: skill,
        hourly_rate: Some(hourly_rate),
    })
    .expect("插入排班失败");
}

/// 为某工人在日期区间内的全部班次排班（工作流测试用）
pub fn seed_allocations_for_range(
    conn: &Arc<Mutex<Connection>>,
    worker_id: &str,
    from: NaiveDate,
    days: i64,
    hours: f64,
    skill: SkillLevel,
) {
    for offset in 0..days {
        let date = from + chrono::Duration::days(offset);
        for shift in [ShiftType::Morning, ShiftType::Afternoon, ShiftType::Night] {
            seed_allocation(conn, worker_id, None, date, shift, hours, skill, 150.0);
        }
    }
}

/// 插入产线
pub fn seed_line(conn: &Arc<Mutex<Connection>>, line_id: &str, name: &str, efficiency: f64) {
    let conn = conn.lock().unwrap();
    conn.execute(
        "INSERT INTO production_line (line_id, line_name, is_active, efficiency) VALUES (?1, ?2, 1, ?3)",
        params![line_id, name, efficiency],
    )
    .expect("插入产线失败");
}

/// 插入生产排程
#[allow(clippy::too_many_arguments)]
pub fn seed_schedule(
    conn: &Arc<Mutex<Connection>>,
    schedule_id: &str,
    order_id: Option<&str>,
    line_id: Option<&str>,
    stage: &str,
    status: &str,
    planned_start: DateTime<Utc>,
    planned_end: DateTime<Utc>,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    planned_quantity: i64,
    completed_quantity: i64,
    rejected_quantity: i64,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO production_schedule (
            schedule_id, order_id, line_id, stage, status, priority,
            planned_start, planned_end, actual_start, actual_end,
            planned_quantity, completed_quantity, rejected_quantity
        ) VALUES (?1, ?2, ?3, ?4, ?5, 'NORMAL', ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            schedule_id,
            order_id,
            line_id,
            stage,
            status,
            planned_start,
            planned_end,
            actual_start,
            actual_end,
            planned_quantity,
            completed_quantity,
            rejected_quantity,
        ],
    )
    .expect("插入排程失败");
}
