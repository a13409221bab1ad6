// ==========================================
// 服装生产运营平台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产计划与调度核心 (MRP / 排产 / 工作流)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertType, OrderStatus, Priority, RecommendedAction, Severity, ShiftType, SkillLevel, Stage,
    StepStatus, SupplyStatus, TransactionType, WorkflowStatus,
};

// 领域实体
pub use domain::{
    BottleneckAnalysis, MaterialDemand, MaterialInventory, MaterialPlanOptimization,
    MaterialTransaction, MrpResult, Order, ProductionAlert, ProductionCapacity,
    ProductionMetrics, ProductionSchedule, StockProjection, SupplyPlan, WorkerAllocation,
    WorkerAssignment, WorkerCapacity, WorkflowInstance, WorkflowStep,
};

// 引擎
pub use engine::{
    BottleneckDetector, Deadline, EventBus, MaterialRequirementPlanner, OptimizationGoals,
    PlanningRepositories, ProductionEvent, ProductionEventType, ProductionScheduler,
    WorkerAssignmentRequest, WorkerAssignmentResult, WorkflowEngine,
};

// 配置
pub use config::{ConfigManager, PlanningConfig};

// API
pub use api::{ApiError, ApiResult, PlanningApi, ScheduleApi, WorkflowApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服装生产运营平台";

// ==========================================
// 预编译检查
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
