// ==========================================
// 服装生产运营平台 - 数据仓储层
// ==========================================
// 职责: 数据访问，不含业务逻辑
// 约定: 每个实体一个窄接口仓储，核心不依赖完整 ORM 客户端
// ==========================================

pub mod alert_repo;
pub mod error;
pub mod material_repo;
pub mod order_repo;
pub mod schedule_repo;
pub mod worker_repo;
pub mod workflow_repo;

// 重导出仓储
pub use alert_repo::ProductionAlertRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use material_repo::{MaterialInventoryRepository, MaterialTransactionRepository};
pub use order_repo::OrderRepository;
pub use schedule_repo::{ProductionLineRepository, ProductionScheduleRepository};
pub use worker_repo::{EmployeeRepository, WorkerAllocationRepository, WorkerAssignmentRepository};
pub use workflow_repo::WorkflowRepository;
