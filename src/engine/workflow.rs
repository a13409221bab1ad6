// ==========================================
// 服装生产运营平台 - 工作流引擎
// ==========================================
// 职责: 订单多阶段履约状态机、步骤推进、瓶颈检测、告警
// 阶段: 接单 → 设计 → 裁剪 → 印花 → 缝制 → 质检 → 包装 → 交付
// 规则: 步骤依赖全部完成且存在工人指派后方可开工;
//       暂停/恢复不改变 completedSteps 计数
// 事件: 每次状态转换向事件总线发布类型化事件，投递失败不影响引擎
// ==========================================

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::domain::alert::{BottleneckAnalysis, ProductionAlert};
use crate::domain::types::{
    AlertType, Priority, Severity, Stage, StepStatus, WorkflowStatus,
};
use crate::domain::workflow::{WorkflowInstance, WorkflowStep};
use crate::engine::bottleneck::BottleneckDetector;
use crate::engine::deadline::Deadline;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::events::{EventBus, ProductionEvent, ProductionEventType};
use crate::engine::repositories::PlanningRepositories;
use crate::engine::scheduler::{
    ProductionScheduler, WorkerAssignmentRequest, WorkerAssignmentResult,
};

// ==========================================
// WorkflowEngine - 工作流引擎
// ==========================================
pub struct WorkflowEngine {
    repos: PlanningRepositories,
    config: PlanningConfig,
    scheduler: Arc<ProductionScheduler>,
    detector: BottleneckDetector,
    bus: EventBus,
}

impl WorkflowEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `repos`: 仓储集合
    /// - `config`: 调用开始时加载的配置快照
    /// - `scheduler`: 排产引擎（指派委托对象）
    /// - `bus`: 事件总线
    pub fn new(
        repos: PlanningRepositories,
        config: PlanningConfig,
        scheduler: Arc<ProductionScheduler>,
        bus: EventBus,
    ) -> Self {
        Self {
            repos,
            config,
            scheduler,
            detector: BottleneckDetector::new(),
            bus,
        }
    }

    /// 事件总线（供监听方订阅）
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    // ==========================================
    // 工作流生命周期
    // ==========================================

    /// 创建工作流
    ///
    /// 按固定阶段序列生成线性依赖的步骤链，
    /// 各步骤基准工时按订单件数缩放。
    #[instrument(skip(self, metadata))]
    pub fn create_workflow(
        &self,
        order_id: &str,
        priority: Priority,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let order = self
            .repos
            .order_repo
            .find_by_id(order_id)?
            .ok_or_else(|| PlanningError::not_found("Order", order_id))?;

        let quantity = order.total_quantity();
        let workflow_id = Uuid::new_v4().to_string();

        // 线性步骤链: 每步依赖前一步
        let mut steps = Vec::with_capacity(Stage::sequence().len());
        let mut cursor = now;
        let mut prev_step_id: Option<String> = None;
        for (seq, stage) in Stage::sequence().into_iter().enumerate() {
            let estimated_hours = stage.baseline_hours(quantity);
            let planned_end = cursor + Duration::minutes((estimated_hours * 60.0).round() as i64);
            let step_id = Uuid::new_v4().to_string();

            steps.push(WorkflowStep {
                step_id: step_id.clone(),
                workflow_id: workflow_id.clone(),
                stage,
                step_name: stage.display_name().to_string(),
                seq_no: seq as i32 + 1,
                dependencies: prev_step_id.iter().cloned().collect(),
                required_skill: stage.required_skill(),
                estimated_hours,
                status: StepStatus::Planned,
                assigned_worker: None,
                planned_start: cursor,
                planned_end,
                actual_start: None,
                actual_end: None,
                quality_score: None,
                notes: None,
            });

            cursor = planned_end;
            prev_step_id = Some(step_id);
        }

        let estimated_duration_hours: f64 = steps.iter().map(|s| s.estimated_hours).sum();
        let instance = WorkflowInstance {
            workflow_id: workflow_id.clone(),
            order_id: order.order_id.clone(),
            status: WorkflowStatus::Planned,
            priority,
            current_stage: Stage::Intake,
            total_steps: steps.len(),
            completed_steps: 0,
            estimated_duration_hours,
            start_date: now,
            estimated_end_date: now
                + Duration::minutes((estimated_duration_hours * 60.0).round() as i64),
            actual_end_date: None,
            pause_reason: None,
            metadata,
            created_at: now,
            updated_at: now,
        };

        self.repos.workflow_repo.insert_workflow(&instance, &steps)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::WorkflowCreated, now)
                .with_workflow(&workflow_id)
                .with_order(&order.order_id)
                .with_detail(serde_json::json!({
                    "total_steps": instance.total_steps,
                    "estimated_duration_hours": estimated_duration_hours,
                })),
        );
        tracing::info!(workflow_id, order_id, quantity, "工作流已创建");

        Ok(instance)
    }

    /// 启动工作流 (PLANNED → IN_PROGRESS)
    ///
    /// 首步骤若已指派工人则随启动自动开工
    #[instrument(skip(self))]
    pub fn start_workflow(
        &self,
        workflow_id: &str,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let mut instance = self.load_instance(workflow_id)?;
        self.ensure_transition(instance.status, WorkflowStatus::InProgress)?;

        instance.status = WorkflowStatus::InProgress;
        instance.updated_at = now;
        self.repos.workflow_repo.update_instance(&instance)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::WorkflowStarted, now)
                .with_workflow(workflow_id)
                .with_order(&instance.order_id),
        );

        // 首个可开工步骤（依赖满足且已指派）自动进入 IN_PROGRESS
        self.advance_eligible_step(workflow_id, now)?;

        Ok(instance)
    }

    /// 暂停工作流 (IN_PROGRESS → PAUSED)
    ///
    /// 不改变 completedSteps 计数
    #[instrument(skip(self, reason))]
    pub fn pause_workflow(
        &self,
        workflow_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let mut instance = self.load_instance(workflow_id)?;
        self.ensure_transition(instance.status, WorkflowStatus::Paused)?;

        instance.status = WorkflowStatus::Paused;
        instance.pause_reason = reason.map(|r| r.to_string());
        instance.updated_at = now;
        self.repos.workflow_repo.update_instance(&instance)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::WorkflowPaused, now)
                .with_workflow(workflow_id)
                .with_detail(serde_json::json!({ "reason": reason })),
        );
        Ok(instance)
    }

    /// 恢复工作流 (PAUSED → IN_PROGRESS)
    #[instrument(skip(self))]
    pub fn resume_workflow(
        &self,
        workflow_id: &str,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let mut instance = self.load_instance(workflow_id)?;
        self.ensure_transition(instance.status, WorkflowStatus::InProgress)?;

        instance.status = WorkflowStatus::InProgress;
        instance.pause_reason = None;
        instance.updated_at = now;
        self.repos.workflow_repo.update_instance(&instance)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::WorkflowResumed, now)
                .with_workflow(workflow_id),
        );
        Ok(instance)
    }

    /// 取消工作流（任意非终态 → CANCELLED）
    #[instrument(skip(self, reason))]
    pub fn cancel_workflow(
        &self,
        workflow_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let mut instance = self.load_instance(workflow_id)?;
        self.ensure_transition(instance.status, WorkflowStatus::Cancelled)?;

        instance.status = WorkflowStatus::Cancelled;
        instance.pause_reason = reason.map(|r| r.to_string());
        instance.updated_at = now;
        self.repos.workflow_repo.update_instance(&instance)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::WorkflowCancelled, now)
                .with_workflow(workflow_id)
                .with_detail(serde_json::json!({ "reason": reason })),
        );
        Ok(instance)
    }

    // ==========================================
    // 步骤推进
    // ==========================================

    /// 开工步骤 (PLANNED → IN_PROGRESS)
    ///
    /// 前置条件: 工作流进行中、依赖步骤全部完成、已指派工人
    #[instrument(skip(self))]
    pub fn start_step(&self, step_id: &str, now: DateTime<Utc>) -> PlanningResult<WorkflowStep> {
        let mut step = self.load_step(step_id)?;
        let instance = self.load_instance(&step.workflow_id)?;

        if instance.status != WorkflowStatus::InProgress {
            return Err(PlanningError::Validation(format!(
                "工作流未在进行中，无法开工步骤 (当前 {})",
                instance.status
            )));
        }
        if !step.status.can_transition_to(StepStatus::InProgress) {
            return Err(PlanningError::InvalidStateTransition {
                from: step.status.to_string(),
                to: StepStatus::InProgress.to_string(),
            });
        }
        self.ensure_dependencies_completed(&step)?;
        if step.assigned_worker.is_none() {
            return Err(PlanningError::Validation(format!(
                "步骤 {} 未指派工人，不能开工",
                step.step_id
            )));
        }

        step.status = StepStatus::InProgress;
        step.actual_start = Some(now);
        self.repos.workflow_repo.update_step(&step)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::StepStarted, now)
                .with_workflow(&step.workflow_id)
                .with_step(step_id)
                .with_detail(serde_json::json!({ "stage": step.stage.to_string() })),
        );
        Ok(step)
    }

    /// 完成步骤
    ///
    /// 推进 completedSteps; 末步骤完成时工作流转 COMPLETED 并记录实际完工时刻。
    /// 质检评分低于阈值时发出 QUALITY_CHECK 告警。
    #[instrument(skip(self, notes))]
    pub fn complete_step(
        &self,
        step_id: &str,
        quality_score: Option<f64>,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowInstance> {
        let mut step = self.load_step(step_id)?;
        if !step.status.can_transition_to(StepStatus::Completed) {
            return Err(PlanningError::InvalidStateTransition {
                from: step.status.to_string(),
                to: StepStatus::Completed.to_string(),
            });
        }
        // 依赖完成是完成步骤的硬性不变式
        self.ensure_dependencies_completed(&step)?;

        step.status = StepStatus::Completed;
        step.actual_end = Some(now);
        step.quality_score = quality_score;
        step.notes = notes.map(|n| n.to_string());
        self.repos.workflow_repo.update_step(&step)?;

        let mut instance = self.load_instance(&step.workflow_id)?;
        instance.completed_steps += 1;
        instance.updated_at = now;

        let all_done = instance.completed_steps >= instance.total_steps;
        if all_done {
            instance.status = WorkflowStatus::Completed;
            instance.actual_end_date = Some(now);
        } else {
            // 当前阶段推进到首个未完成步骤
            let steps = self.repos.workflow_repo.list_steps(&step.workflow_id)?;
            if let Some(next) = steps.iter().find(|s| s.status != StepStatus::Completed) {
                instance.current_stage = next.stage;
            }
        }
        self.repos.workflow_repo.update_instance(&instance)?;

        let actual_hours = step.actual_hours(now);
        self.bus.publish(
            ProductionEvent::new(ProductionEventType::StepCompleted, now)
                .with_workflow(&step.workflow_id)
                .with_step(step_id)
                .with_detail(serde_json::json!({
                    "quality_score": quality_score,
                    "actual_hours": actual_hours,
                })),
        );

        // 质检低分告警
        if let Some(score) = quality_score {
            if score < self.config.quality_alert_threshold {
                self.create_alert(
                    Some(&step.workflow_id),
                    AlertType::Quality,
                    Severity::High,
                    format!("质检低分: {}", step.step_name),
                    format!(
                        "步骤 {} 质检评分 {:.1}，低于阈值 {:.1}",
                        step.step_id, score, self.config.quality_alert_threshold
                    ),
                    now,
                )?;
                self.bus.publish(
                    ProductionEvent::new(ProductionEventType::QualityCheck, now)
                        .with_workflow(&step.workflow_id)
                        .with_step(step_id)
                        .with_detail(serde_json::json!({ "quality_score": score })),
                );
            }
        }

        if all_done {
            self.bus.publish(
                ProductionEvent::new(ProductionEventType::WorkflowCompleted, now)
                    .with_workflow(&step.workflow_id)
                    .with_order(&instance.order_id),
            );
            tracing::info!(workflow_id = %step.workflow_id, "工作流已完成");
        } else {
            // 后继可开工步骤自动推进
            self.advance_eligible_step(&step.workflow_id, now)?;
        }

        Ok(instance)
    }

    /// 标记步骤延误 (IN_PROGRESS → DELAYED) 并发出 DELAY 告警
    #[instrument(skip(self, reason))]
    pub fn mark_step_delayed(
        &self,
        step_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkflowStep> {
        let mut step = self.load_step(step_id)?;
        if !step.status.can_transition_to(StepStatus::Delayed) {
            return Err(PlanningError::InvalidStateTransition {
                from: step.status.to_string(),
                to: StepStatus::Delayed.to_string(),
            });
        }

        step.status = StepStatus::Delayed;
        step.notes = Some(reason.to_string());
        self.repos.workflow_repo.update_step(&step)?;

        self.create_alert(
            Some(&step.workflow_id),
            AlertType::Delay,
            Severity::Medium,
            format!("步骤延误: {}", step.step_name),
            reason.to_string(),
            now,
        )?;
        self.bus.publish(
            ProductionEvent::new(ProductionEventType::StepDelayed, now)
                .with_workflow(&step.workflow_id)
                .with_step(step_id)
                .with_detail(serde_json::json!({ "reason": reason })),
        );
        Ok(step)
    }

    /// 为步骤指派工人（委托排产引擎）
    ///
    /// 成功: 步骤记录指派工人并发布 WORKER_ASSIGNED;
    /// 拒绝: 发布含冲突原因的失败事件，不改动步骤，结果原样返回
    #[instrument(skip(self))]
    pub fn assign_worker(
        &self,
        step_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> PlanningResult<WorkerAssignmentResult> {
        let mut step = self.load_step(step_id)?;
        if step.status.is_terminal() {
            return Err(PlanningError::Validation(format!(
                "步骤 {} 已处于终态 {}，不能指派",
                step_id, step.status
            )));
        }

        let preferred_start = step.planned_start.max(now);
        let request = WorkerAssignmentRequest {
            worker_id: worker_id.to_string(),
            schedule_id: None,
            station_id: None,
            required_skill: step.required_skill,
            estimated_hours: step.estimated_hours,
            preferred_start,
            shift: ProductionScheduler::shift_for(preferred_start),
            priority: Priority::Normal,
        };

        let result = self.scheduler.assign_worker_to_task(&request)?;

        if result.success {
            step.assigned_worker = Some(worker_id.to_string());
            self.repos.workflow_repo.update_step(&step)?;
            self.bus.publish(
                ProductionEvent::new(ProductionEventType::WorkerAssigned, now)
                    .with_workflow(&step.workflow_id)
                    .with_step(step_id)
                    .with_worker(worker_id),
            );
        } else {
            let reason = result
                .conflict_reason
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default();
            self.bus.publish(
                ProductionEvent::new(ProductionEventType::WorkerAssignmentRejected, now)
                    .with_workflow(&step.workflow_id)
                    .with_step(step_id)
                    .with_worker(worker_id)
                    .with_detail(serde_json::json!({
                        "reason": reason,
                        "alternatives": result.alternatives.len(),
                    })),
            );
            tracing::warn!(step_id, worker_id, %reason, "工人指派被拒绝");
        }

        Ok(result)
    }

    // ==========================================
    // 瓶颈检测
    // ==========================================

    /// 检测工作流瓶颈
    ///
    /// HIGH/CRITICAL 级瓶颈同时落库 BOTTLENECK 告警。
    /// 超时则整体失败，不返回部分结果。
    #[instrument(skip(self, deadline))]
    pub fn detect_bottlenecks(
        &self,
        workflow_id: &str,
        now: DateTime<Utc>,
        deadline: Option<&Deadline>,
    ) -> PlanningResult<Vec<BottleneckAnalysis>> {
        let check_deadline = |d: Option<&Deadline>| -> PlanningResult<()> {
            if let Some(d) = d {
                if d.expired() {
                    return Err(PlanningError::Timeout {
                        operation: "detect_bottlenecks".to_string(),
                        budget_ms: d.budget_ms(),
                    });
                }
            }
            Ok(())
        };

        check_deadline(deadline)?;
        let instance = self.load_instance(workflow_id)?;
        let steps = self.repos.workflow_repo.list_steps(workflow_id)?;
        check_deadline(deadline)?;

        let bottlenecks = self.detector.analyze(&instance, &steps, now, &self.config);

        for bottleneck in &bottlenecks {
            check_deadline(deadline)?;
            if bottleneck.severity >= Severity::High {
                self.create_alert(
                    Some(workflow_id),
                    AlertType::Bottleneck,
                    bottleneck.severity,
                    format!("瓶颈: {}", bottleneck.stage.display_name()),
                    format!("{} ({})", bottleneck.cause, bottleneck.impact),
                    now,
                )?;
            }
            self.bus.publish(
                ProductionEvent::new(ProductionEventType::BottleneckDetected, now)
                    .with_workflow(workflow_id)
                    .with_step(&bottleneck.step_id)
                    .with_detail(serde_json::json!({
                        "severity": bottleneck.severity.to_string(),
                        "estimated_delay_hours": bottleneck.estimated_delay_hours,
                    })),
            );
        }

        Ok(bottlenecks)
    }

    // ==========================================
    // 告警
    // ==========================================

    /// 创建告警（落库并发布 ALERT_CREATED）
    pub fn create_alert(
        &self,
        workflow_id: Option<&str>,
        alert_type: AlertType,
        severity: Severity,
        title: String,
        message: String,
        now: DateTime<Utc>,
    ) -> PlanningResult<ProductionAlert> {
        let alert = ProductionAlert {
            alert_id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.map(|s| s.to_string()),
            alert_type,
            severity,
            title,
            message,
            is_read: false,
            expires_at: Some(now + Duration::hours(self.config.alert_ttl_hours)),
            created_at: now,
        };
        self.repos.alert_repo.insert(&alert)?;

        self.bus.publish(
            ProductionEvent::new(ProductionEventType::AlertCreated, now)
                .with_detail(serde_json::json!({
                    "alert_id": alert.alert_id,
                    "alert_type": alert.alert_type.to_string(),
                    "severity": alert.severity.to_string(),
                })),
        );
        Ok(alert)
    }

    /// 查询活跃告警（未读且未过期）
    pub fn active_alerts(&self, now: DateTime<Utc>) -> PlanningResult<Vec<ProductionAlert>> {
        Ok(self.repos.alert_repo.list_active(now)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_instance(&self, workflow_id: &str) -> PlanningResult<WorkflowInstance> {
        self.repos
            .workflow_repo
            .find_instance(workflow_id)?
            .ok_or_else(|| PlanningError::not_found("WorkflowInstance", workflow_id))
    }

    fn load_step(&self, step_id: &str) -> PlanningResult<WorkflowStep> {
        self.repos
            .workflow_repo
            .find_step(step_id)?
            .ok_or_else(|| PlanningError::not_found("WorkflowStep", step_id))
    }

    fn ensure_transition(
        &self,
        from: WorkflowStatus,
        to: WorkflowStatus,
    ) -> PlanningResult<()> {
        if !from.can_transition_to(to) {
            return Err(PlanningError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_dependencies_completed(&self, step: &WorkflowStep) -> PlanningResult<()> {
        for dep_id in &step.dependencies {
            let dep = self.load_step(dep_id)?;
            if dep.status != StepStatus::Completed {
                return Err(PlanningError::Validation(format!(
                    "前置步骤 {} 未完成 (当前 {})",
                    dep_id, dep.status
                )));
            }
        }
        Ok(())
    }

    /// 推进首个可开工步骤（依赖满足且已指派工人）
    ///
    /// 无可开工步骤时静默返回（等待指派）
    fn advance_eligible_step(&self, workflow_id: &str, now: DateTime<Utc>) -> PlanningResult<()> {
        let steps = self.repos.workflow_repo.list_steps(workflow_id)?;
        let eligible = steps.iter().find(|s| {
            s.status == StepStatus::Planned
                && s.assigned_worker.is_some()
                && s.dependencies.iter().all(|dep| {
                    steps
                        .iter()
                        .any(|d| &d.step_id == dep && d.status == StepStatus::Completed)
                })
        });

        if let Some(step) = eligible {
            self.start_step(&step.step_id, now)?;
        }
        Ok(())
    }
}
