// ==========================================
// 服装生产运营平台 - 工作流事件发布
// ==========================================
// 职责: 定义工作流事件类型与发布/订阅通道
// 说明: 引擎向通道发布类型化事件值，监听方（告警/看板）独立订阅，
//       事件投递与引擎调用栈解耦，引擎不依赖任何监听方成功
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 事件通道默认容量
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ==========================================
// 工作流事件类型
// ==========================================

/// 工作流事件类型
///
/// 每次状态转换发布一个事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEventType {
    WorkflowCreated,
    WorkflowStarted,
    WorkflowPaused,
    WorkflowResumed,
    WorkflowCompleted,
    WorkflowCancelled,
    StepStarted,
    StepCompleted,
    StepDelayed,
    WorkerAssigned,
    WorkerAssignmentRejected,
    BottleneckDetected,
    AlertCreated,
    QualityCheck,
}

impl ProductionEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionEventType::WorkflowCreated => "WORKFLOW_CREATED",
            ProductionEventType::WorkflowStarted => "WORKFLOW_STARTED",
            ProductionEventType::WorkflowPaused => "WORKFLOW_PAUSED",
            ProductionEventType::WorkflowResumed => "WORKFLOW_RESUMED",
            ProductionEventType::WorkflowCompleted => "WORKFLOW_COMPLETED",
            ProductionEventType::WorkflowCancelled => "WORKFLOW_CANCELLED",
            ProductionEventType::StepStarted => "STEP_STARTED",
            ProductionEventType::StepCompleted => "STEP_COMPLETED",
            ProductionEventType::StepDelayed => "STEP_DELAYED",
            ProductionEventType::WorkerAssigned => "WORKER_ASSIGNED",
            ProductionEventType::WorkerAssignmentRejected => "WORKER_ASSIGNMENT_REJECTED",
            ProductionEventType::BottleneckDetected => "BOTTLENECK_DETECTED",
            ProductionEventType::AlertCreated => "ALERT_CREATED",
            ProductionEventType::QualityCheck => "QUALITY_CHECK",
        }
    }
}

/// 工作流事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub event_type: ProductionEventType,
    pub workflow_id: Option<String>,
    pub order_id: Option<String>,
    pub step_id: Option<String>,
    pub worker_id: Option<String>,
    /// 事件附加数据（原因/评分等）
    pub detail: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl ProductionEvent {
    /// 创建事件
    pub fn new(event_type: ProductionEventType, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_type,
            workflow_id: None,
            order_id: None,
            step_id: None,
            worker_id: None,
            detail: serde_json::Value::Null,
            occurred_at,
        }
    }

    pub fn with_workflow(mut self, workflow_id: &str) -> Self {
        self.workflow_id = Some(workflow_id.to_string());
        self
    }

    pub fn with_order(mut self, order_id: &str) -> Self {
        self.order_id = Some(order_id.to_string());
        self
    }

    pub fn with_step(mut self, step_id: &str) -> Self {
        self.step_id = Some(step_id.to_string());
        self
    }

    pub fn with_worker(mut self, worker_id: &str) -> Self {
        self.worker_id = Some(worker_id.to_string());
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

// ==========================================
// EventBus - 事件总线
// ==========================================

/// 工作流事件总线
///
/// 基于广播通道的发布/订阅：
/// - 发布方不等待、不感知监听方
/// - 无订阅者时事件直接丢弃（仅 debug 日志），发布永不失败
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProductionEvent>,
}

impl EventBus {
    /// 创建事件总线（默认容量）
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 创建事件总线（指定容量）
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 返回接收到事件的订阅者数量；无订阅者时返回 0
    pub fn publish(&self, event: ProductionEvent) -> usize {
        let event_type = event.event_type;
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                // 无订阅者，丢弃事件
                tracing::debug!("事件无订阅者，已丢弃: {}", event_type.as_str());
                0
            }
        }
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<ProductionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
