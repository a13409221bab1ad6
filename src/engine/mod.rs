// ==========================================
// 服装生产运营平台 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎，不拼 SQL
// 红线: Engine 不拼 SQL, 所有拒绝必须输出 reason
// ==========================================

pub mod bottleneck;
pub mod deadline;
pub mod error;
pub mod events;
pub mod mrp;
pub mod repositories;
pub mod scheduler;
pub mod workflow;

// 重导出核心引擎
pub use bottleneck::BottleneckDetector;
pub use deadline::Deadline;
pub use error::{PlanningError, PlanningResult};
pub use events::{EventBus, ProductionEvent, ProductionEventType};
pub use mrp::MaterialRequirementPlanner;
pub use repositories::PlanningRepositories;
pub use scheduler::{
    CommittedAssignment, ConflictReason, OptimizationGoals, OptimizationImprovements,
    ProductionScheduleOptimization, ProductionScheduler, ScheduleChange, WorkerAlternative,
    WorkerAssignmentRequest, WorkerAssignmentResult,
};
pub use workflow::WorkflowEngine;
