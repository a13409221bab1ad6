// ==========================================
// 服装生产运营平台 - 领域层
// ==========================================
// 职责: 实体与类型定义，不含数据访问与业务规则
// ==========================================

pub mod alert;
pub mod material;
pub mod order;
pub mod production;
pub mod types;
pub mod worker;
pub mod workflow;

// 重导出核心实体
pub use alert::{BottleneckAnalysis, ProductionAlert};
pub use material::{
    ConsolidatedOrder, ConsolidatedOrderLine, MaterialDemand, MaterialInventory,
    MaterialPlanOptimization, MaterialTransaction, MrpResult, PlanSavings, StockProjection,
    SupplyPlan,
};
pub use order::{Order, OrderLineItem};
pub use production::{
    CostBreakdown, ProductionCapacity, ProductionLine, ProductionMetrics, ProductionSchedule,
    WorkStation,
};
pub use worker::{Employee, WorkerAllocation, WorkerAssignment, WorkerCapacity};
pub use workflow::{WorkflowInstance, WorkflowStep};
