// ==========================================
// 服装生产运营平台 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合计划/排产/工作流引擎所需的全部 Repository
// 目标: 减少引擎构造函数参数数量，统一依赖注入入口
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::repository::{
    EmployeeRepository, MaterialInventoryRepository, MaterialTransactionRepository,
    OrderRepository, ProductionAlertRepository, ProductionLineRepository,
    ProductionScheduleRepository, WorkerAllocationRepository, WorkerAssignmentRepository,
    WorkflowRepository,
};

/// 计划引擎仓储集合
///
/// 三个引擎共享同一份仓储集合（同一数据库连接），
/// 保证同一次计划调用看到一致的数据快照。
#[derive(Clone)]
pub struct PlanningRepositories {
    pub order_repo: Arc<OrderRepository>,
    pub inventory_repo: Arc<MaterialInventoryRepository>,
    pub transaction_repo: Arc<MaterialTransactionRepository>,
    pub employee_repo: Arc<EmployeeRepository>,
    pub allocation_repo: Arc<WorkerAllocationRepository>,
    pub assignment_repo: Arc<WorkerAssignmentRepository>,
    pub line_repo: Arc<ProductionLineRepository>,
    pub schedule_repo: Arc<ProductionScheduleRepository>,
    pub workflow_repo: Arc<WorkflowRepository>,
    pub alert_repo: Arc<ProductionAlertRepository>,
}

impl PlanningRepositories {
    /// 从共享连接构建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            order_repo: Arc::new(OrderRepository::from_connection(conn.clone())),
            inventory_repo: Arc::new(MaterialInventoryRepository::from_connection(conn.clone())),
            transaction_repo: Arc::new(MaterialTransactionRepository::from_connection(conn.clone())),
            employee_repo: Arc::new(EmployeeRepository::from_connection(conn.clone())),
            allocation_repo: Arc::new(WorkerAllocationRepository::from_connection(conn.clone())),
            assignment_repo: Arc::new(WorkerAssignmentRepository::from_connection(conn.clone())),
            line_repo: Arc::new(ProductionLineRepository::from_connection(conn.clone())),
            schedule_repo: Arc::new(ProductionScheduleRepository::from_connection(conn.clone())),
            workflow_repo: Arc::new(WorkflowRepository::from_connection(conn.clone())),
            alert_repo: Arc::new(ProductionAlertRepository::from_connection(conn)),
        }
    }
}
