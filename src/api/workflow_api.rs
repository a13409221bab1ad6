// ==========================================
// 服装生产运营平台 - 工作流服务接口
// ==========================================
// 职责: 工作流引擎的对外门面
//       - 事件总线跨调用共享，监听方独立订阅
//       - 瓶颈检测支持调用方超时预算
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::api::error::{ApiError, ApiResult};
use crate::api::retry::with_upstream_retry;
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::alert::{BottleneckAnalysis, ProductionAlert};
use crate::domain::types::{AlertType, Priority, Severity};
use crate::domain::workflow::{WorkflowInstance, WorkflowStep};
use crate::engine::deadline::Deadline;
use crate::engine::events::{EventBus, ProductionEvent};
use crate::engine::repositories::PlanningRepositories;
use crate::engine::scheduler::{ProductionScheduler, WorkerAssignmentResult};
use crate::engine::workflow::WorkflowEngine;

// ==========================================
// WorkflowApi - 工作流服务
// ==========================================
pub struct WorkflowApi {
    conn: Arc<Mutex<Connection>>,
    bus: EventBus,
}

impl WorkflowApi {
    /// 创建服务实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            bus: EventBus::new(),
        }
    }

    /// 订阅工作流事件流
    pub fn subscribe_events(&self) -> broadcast::Receiver<ProductionEvent> {
        self.bus.subscribe()
    }

    /// 按当前配置快照构建工作流引擎
    fn build_engine(conn: &Arc<Mutex<Connection>>, bus: &EventBus) -> ApiResult<WorkflowEngine> {
        let config = ConfigManager::from_connection(conn.clone()).load_snapshot()?;
        let repos = PlanningRepositories::from_connection(conn.clone());
        let scheduler = Arc::new(ProductionScheduler::new(repos.clone(), config.clone()));
        Ok(WorkflowEngine::new(repos, config, scheduler, bus.clone()))
    }

    /// 创建工作流
    pub async fn create_workflow(
        &self,
        order_id: String,
        priority: Priority,
        metadata: serde_json::Value,
    ) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("order_id", &order_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.create_workflow(&order_id, priority, metadata.clone(), now)?)
        })
        .await
    }

    /// 启动工作流
    pub async fn start_workflow(&self, workflow_id: String) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("workflow_id", &workflow_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.start_workflow(&workflow_id, now)?)
        })
        .await
    }

    /// 暂停工作流
    pub async fn pause_workflow(
        &self,
        workflow_id: String,
        reason: Option<String>,
    ) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("workflow_id", &workflow_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.pause_workflow(&workflow_id, reason.as_deref(), now)?)
        })
        .await
    }

    /// 恢复工作流
    pub async fn resume_workflow(&self, workflow_id: String) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("workflow_id", &workflow_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.resume_workflow(&workflow_id, now)?)
        })
        .await
    }

    /// 取消工作流
    pub async fn cancel_workflow(
        &self,
        workflow_id: String,
        reason: Option<String>,
    ) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("workflow_id", &workflow_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.cancel_workflow(&workflow_id, reason.as_deref(), now)?)
        })
        .await
    }

    /// 开工步骤
    pub async fn start_step(&self, step_id: String) -> ApiResult<WorkflowStep> {
        validator::ensure_id("step_id", &step_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.start_step(&step_id, now)?)
        })
        .await
    }

    /// 完成步骤
    pub async fn complete_step(
        &self,
        step_id: String,
        quality_score: Option<f64>,
        notes: Option<String>,
    ) -> ApiResult<WorkflowInstance> {
        validator::ensure_id("step_id", &step_id)?;
        if let Some(score) = quality_score {
            validator::ensure_non_negative("quality_score", score)?;
            if score > 100.0 {
                return Err(ApiError::ValidationError(format!(
                    "字段 quality_score 不允许超过 100 (当前 {})",
                    score
                )));
            }
        }
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.complete_step(&step_id, quality_score, notes.as_deref(), now)?)
        })
        .await
    }

    /// 标记步骤延误
    pub async fn mark_step_delayed(
        &self,
        step_id: String,
        reason: String,
    ) -> ApiResult<WorkflowStep> {
        validator::ensure_id("step_id", &step_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.mark_step_delayed(&step_id, &reason, now)?)
        })
        .await
    }

    /// 为步骤指派工人（委托排产引擎的指派契约）
    pub async fn assign_worker(
        &self,
        step_id: String,
        worker_id: String,
    ) -> ApiResult<WorkerAssignmentResult> {
        validator::ensure_id("step_id", &step_id)?;
        validator::ensure_id("worker_id", &worker_id)?;
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.assign_worker(&step_id, &worker_id, now)?)
        })
        .await
    }

    /// 检测工作流瓶颈
    ///
    /// # 参数
    /// - `timeout_ms`: 调用超时预算; 超时整体失败，不返回部分结果
    pub async fn detect_bottlenecks(
        &self,
        workflow_id: String,
        timeout_ms: Option<u64>,
    ) -> ApiResult<Vec<BottleneckAnalysis>> {
        validator::ensure_id("workflow_id", &workflow_id)?;
        let deadline = timeout_ms.map(|ms| Deadline::from_timeout(StdDuration::from_millis(ms)));
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.detect_bottlenecks(&workflow_id, now, deadline.as_ref())?)
        })
        .await
    }

    /// 创建告警
    pub async fn create_alert(
        &self,
        workflow_id: Option<String>,
        alert_type: AlertType,
        severity: Severity,
        title: String,
        message: String,
    ) -> ApiResult<ProductionAlert> {
        if let Some(id) = &workflow_id {
            validator::ensure_id("workflow_id", id)?;
        }
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.create_alert(
                workflow_id.as_deref(),
                alert_type,
                severity,
                title.clone(),
                message.clone(),
                now,
            )?)
        })
        .await
    }

    /// 查询活跃告警（未读且未过期）
    pub async fn active_alerts(&self) -> ApiResult<Vec<ProductionAlert>> {
        let now = Utc::now();
        let conn = self.conn.clone();
        let bus = self.bus.clone();

        with_upstream_retry(move || {
            let engine = Self::build_engine(&conn, &bus)?;
            Ok(engine.active_alerts(now)?)
        })
        .await
    }
}
