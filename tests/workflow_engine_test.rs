// ==========================================
// 工作流引擎集成测试
// ==========================================
// 覆盖: 工作流生成、状态机、步骤依赖、指派委托、瓶颈检测、告警、事件
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;

use garment_aps::config::PlanningConfig;
use garment_aps::domain::types::{
    AlertType, Priority, Severity, Stage, StepStatus, WorkflowStatus,
};
use garment_aps::engine::error::PlanningError;
use garment_aps::engine::{
    Deadline, EventBus, PlanningRepositories, ProductionEventType, ProductionScheduler,
    WorkflowEngine,
};
use garment_aps::SkillLevel;

fn base_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 6, 30, 0).unwrap()
}

fn build_engine(conn: &Arc<Mutex<Connection>>) -> WorkflowEngine {
    let repos = PlanningRepositories::from_connection(conn.clone());
    let config = PlanningConfig::default();
    let scheduler = Arc::new(ProductionScheduler::new(repos.clone(), config.clone()));
    WorkflowEngine::new(repos, config, scheduler, EventBus::new())
}

fn seed_order(conn: &Arc<Mutex<Connection>>, order_id: &str, quantity: i64) {
    // 工作流测试不关心物料需求，挂一条空需求即可复用 helper
    test_helpers::seed_material(
        conn,
        &format!("FAB-{}", order_id),
        "面料",
        "m",
        100.0,
        10.0,
        20.0,
        None,
    );
    test_helpers::seed_order_with_requirement(
        conn,
        order_id,
        quantity,
        Some(base_now().date_naive() + Duration::days(14)),
        Priority::Normal,
        &format!("FAB-{}", order_id),
        1.0,
    );
}

/// 收集总线上已发布的事件类型
fn drain_event_types(
    rx: &mut tokio::sync::broadcast::Receiver<garment_aps::ProductionEvent>,
) -> Vec<ProductionEventType> {
    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type);
    }
    types
}

// ==========================================
// 工作流生成
// ==========================================

#[test]
fn test_create_workflow_generates_linear_step_chain() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);

    let engine = build_engine(&conn);
    let instance = engine
        .create_workflow("O1", Priority::High, serde_json::json!({"channel": "wholesale"}), base_now())
        .unwrap();

    assert_eq!(instance.status, WorkflowStatus::Planned);
    assert_eq!(instance.current_stage, Stage::Intake);
    assert_eq!(instance.total_steps, 8);
    assert_eq!(instance.completed_steps, 0);

    // 100 件: 1 + 4 + 2 + 3 + 8 + 1 + 1 + 2 = 22h
    assert_eq!(instance.estimated_duration_hours, 22.0);
    assert_eq!(
        instance.estimated_end_date - instance.start_date,
        Duration::hours(22)
    );

    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();
    assert_eq!(steps.len(), 8);

    // 固定阶段序列与线性依赖链
    let stages: Vec<Stage> = steps.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::sequence().to_vec());
    assert!(steps[0].dependencies.is_empty());
    for i in 1..steps.len() {
        assert_eq!(steps[i].dependencies, vec![steps[i - 1].step_id.clone()]);
    }
    // 计划窗口首尾相接
    for w in steps.windows(2) {
        assert_eq!(w[1].planned_start, w[0].planned_end);
    }
}

#[test]
fn test_create_workflow_unknown_order() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let engine = build_engine(&conn);

    let result = engine.create_workflow("NO-ORDER", Priority::Normal, serde_json::Value::Null, base_now());
    assert!(matches!(result, Err(PlanningError::NotFound { .. })));
}

// ==========================================
// 完整生命周期
// ==========================================

#[test]
fn test_full_lifecycle_to_completion_with_events() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);
    test_helpers::seed_employee(&conn, "W1", "高级缝纫工", true);
    test_helpers::seed_allocations_for_range(
        &conn,
        "W1",
        base_now().date_naive(),
        5,
        12.0,
        SkillLevel::Advanced,
    );

    let engine = build_engine(&conn);
    let mut rx = engine.event_bus().subscribe();
    let now = base_now();

    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();

    // 首步骤指派后启动，随启动自动开工
    let assign = engine.assign_worker(&steps[0].step_id, "W1", now).unwrap();
    assert!(assign.success);
    engine.start_workflow(&instance.workflow_id, now).unwrap();

    let first = repos.workflow_repo.find_step(&steps[0].step_id).unwrap().unwrap();
    assert_eq!(first.status, StepStatus::InProgress);

    // 依次完成全部步骤: 完成前先为下一步指派工人，完成后自动开工
    let mut latest = instance.clone();
    for i in 0..steps.len() {
        if i + 1 < steps.len() {
            let next_assign = engine.assign_worker(&steps[i + 1].step_id, "W1", now).unwrap();
            assert!(next_assign.success, "第 {} 步指派失败", i + 2);
        }
        latest = engine
            .complete_step(&steps[i].step_id, Some(95.0), None, now)
            .unwrap();
        assert_eq!(latest.completed_steps, i + 1);
    }

    // 末步骤完成后工作流转 COMPLETED 并记录实际完工时刻
    assert_eq!(latest.status, WorkflowStatus::Completed);
    assert_eq!(latest.completed_steps, 8);
    assert_eq!(latest.actual_end_date, Some(now));

    // 事件序列
    let types = drain_event_types(&mut rx);
    assert!(types.contains(&ProductionEventType::WorkflowCreated));
    assert!(types.contains(&ProductionEventType::WorkflowStarted));
    assert!(types.contains(&ProductionEventType::WorkflowCompleted));
    assert_eq!(
        types.iter().filter(|t| **t == ProductionEventType::StepCompleted).count(),
        8
    );
    assert_eq!(
        types.iter().filter(|t| **t == ProductionEventType::StepStarted).count(),
        8
    );
    assert_eq!(
        types.iter().filter(|t| **t == ProductionEventType::WorkerAssigned).count(),
        8
    );
}

// ==========================================
// 状态机
// ==========================================

#[test]
fn test_pause_resume_keeps_completed_steps() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);
    test_helpers::seed_employee(&conn, "W1", "组长", true);
    test_helpers::seed_allocations_for_range(
        &conn,
        "W1",
        base_now().date_naive(),
        5,
        12.0,
        SkillLevel::Advanced,
    );

    let engine = build_engine(&conn);
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();

    // PLANNED 状态不可暂停
    let result = engine.pause_workflow(&instance.workflow_id, Some("缺料"), now);
    assert!(matches!(result, Err(PlanningError::InvalidStateTransition { .. })));

    // 启动并完成第一步
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();
    engine.assign_worker(&steps[0].step_id, "W1", now).unwrap();
    engine.start_workflow(&instance.workflow_id, now).unwrap();
    engine.complete_step(&steps[0].step_id, None, None, now).unwrap();

    // 暂停/恢复不改变 completedSteps
    let paused = engine
        .pause_workflow(&instance.workflow_id, Some("面料待检"), now)
        .unwrap();
    assert_eq!(paused.status, WorkflowStatus::Paused);
    assert_eq!(paused.completed_steps, 1);
    assert_eq!(paused.pause_reason.as_deref(), Some("面料待检"));

    let resumed = engine.resume_workflow(&instance.workflow_id, now).unwrap();
    assert_eq!(resumed.status, WorkflowStatus::InProgress);
    assert_eq!(resumed.completed_steps, 1);
    assert!(resumed.pause_reason.is_none());
}

#[test]
fn test_dependency_and_assignment_preconditions() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);

    let engine = build_engine(&conn);
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();

    engine.start_workflow(&instance.workflow_id, now).unwrap();

    // 未指派工人不能开工
    let result = engine.start_step(&steps[0].step_id, now);
    assert!(matches!(result, Err(PlanningError::Validation(_))));

    // 依赖未完成不能开工后继步骤
    let result = engine.start_step(&steps[1].step_id, now);
    assert!(matches!(result, Err(PlanningError::Validation(_))));

    // PLANNED 步骤不能直接完成（依赖未完成的步骤绝不可能先到 COMPLETED）
    let result = engine.complete_step(&steps[1].step_id, None, None, now);
    assert!(matches!(result, Err(PlanningError::InvalidStateTransition { .. })));
}

#[test]
fn test_cancel_workflow_from_any_nonterminal_state() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);

    let engine = build_engine(&conn);
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();

    let cancelled = engine
        .cancel_workflow(&instance.workflow_id, Some("客户取消"), now)
        .unwrap();
    assert_eq!(cancelled.status, WorkflowStatus::Cancelled);

    // 终态不可再转换
    let result = engine.start_workflow(&instance.workflow_id, now);
    assert!(matches!(result, Err(PlanningError::InvalidStateTransition { .. })));
}

// ==========================================
// 指派委托
// ==========================================

#[test]
fn test_assignment_rejection_does_not_mutate_step() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);
    // 工人存在但无排班 => 排产引擎拒绝
    test_helpers::seed_employee(&conn, "W-IDLE", "闲置工", true);

    let engine = build_engine(&conn);
    let mut rx = engine.event_bus().subscribe();
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();

    let result = engine.assign_worker(&steps[0].step_id, "W-IDLE", now).unwrap();
    assert!(!result.success);

    // 步骤不被改动
    let step = repos.workflow_repo.find_step(&steps[0].step_id).unwrap().unwrap();
    assert!(step.assigned_worker.is_none());

    // 发布带冲突原因的失败事件
    let types = drain_event_types(&mut rx);
    assert!(types.contains(&ProductionEventType::WorkerAssignmentRejected));
    assert!(!types.contains(&ProductionEventType::WorkerAssigned));
}

// ==========================================
// 质检与告警
// ==========================================

#[test]
fn test_low_quality_score_raises_alert() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);
    test_helpers::seed_employee(&conn, "W1", "质检员", true);
    test_helpers::seed_allocations_for_range(
        &conn,
        "W1",
        base_now().date_naive(),
        5,
        12.0,
        SkillLevel::Advanced,
    );

    let engine = build_engine(&conn);
    let mut rx = engine.event_bus().subscribe();
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();

    engine.assign_worker(&steps[0].step_id, "W1", now).unwrap();
    engine.start_workflow(&instance.workflow_id, now).unwrap();
    // 质检评分 55 低于阈值 70
    engine.complete_step(&steps[0].step_id, Some(55.0), None, now).unwrap();

    let alerts = engine.active_alerts(now).unwrap();
    assert!(alerts
        .iter()
        .any(|a| a.alert_type == AlertType::Quality && a.severity == Severity::High));

    let types = drain_event_types(&mut rx);
    assert!(types.contains(&ProductionEventType::QualityCheck));
}

#[test]
fn test_expired_alerts_excluded_from_active_listing() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let engine = build_engine(&conn);
    let now = base_now();

    engine
        .create_alert(
            None,
            AlertType::Material,
            Severity::Medium,
            "缺料".to_string(),
            "FAB-A 库存不足".to_string(),
            now,
        )
        .unwrap();

    // 有效期内可见（默认 TTL 72h）
    assert_eq!(engine.active_alerts(now).unwrap().len(), 1);
    assert_eq!(engine.active_alerts(now + Duration::hours(71)).unwrap().len(), 1);
    // 过期后从活跃列表排除
    assert!(engine.active_alerts(now + Duration::hours(100)).unwrap().is_empty());
}

// ==========================================
// 瓶颈检测
// ==========================================

#[test]
fn test_detect_bottlenecks_critical_and_alerting() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);
    test_helpers::seed_employee(&conn, "W1", "接单员", true);
    test_helpers::seed_allocations_for_range(
        &conn,
        "W1",
        base_now().date_naive(),
        5,
        12.0,
        SkillLevel::Advanced,
    );

    let engine = build_engine(&conn);
    let mut rx = engine.event_bus().subscribe();
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();
    let repos = PlanningRepositories::from_connection(conn.clone());
    let steps = repos.workflow_repo.list_steps(&instance.workflow_id).unwrap();

    // INTAKE 计划 1h，实际 2.1h => 2.1 倍 CRITICAL
    engine.assign_worker(&steps[0].step_id, "W1", now).unwrap();
    engine.start_workflow(&instance.workflow_id, now).unwrap();
    let finish = now + Duration::minutes(126);
    engine.complete_step(&steps[0].step_id, Some(90.0), None, finish).unwrap();

    let bottlenecks = engine
        .detect_bottlenecks(&instance.workflow_id, finish, None)
        .unwrap();
    assert_eq!(bottlenecks.len(), 1);
    assert_eq!(bottlenecks[0].severity, Severity::Critical);
    assert_eq!(bottlenecks[0].stage, Stage::Intake);
    assert_eq!(bottlenecks[0].affected_orders, vec!["O1".to_string()]);
    assert!((bottlenecks[0].estimated_delay_hours - 1.1).abs() < 0.01);

    // CRITICAL 瓶颈落库 BOTTLENECK 告警并发布事件
    let alerts = engine.active_alerts(finish).unwrap();
    assert!(alerts.iter().any(|a| a.alert_type == AlertType::Bottleneck));
    let types = drain_event_types(&mut rx);
    assert!(types.contains(&ProductionEventType::BottleneckDetected));
}

#[test]
fn test_detect_bottlenecks_deadline_timeout() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);

    let engine = build_engine(&conn);
    let now = base_now();
    let instance = engine
        .create_workflow("O1", Priority::Normal, serde_json::Value::Null, now)
        .unwrap();

    let expired = Deadline::from_timeout(std::time::Duration::from_millis(0));
    let result = engine.detect_bottlenecks(&instance.workflow_id, now, Some(&expired));
    assert!(matches!(result, Err(PlanningError::Timeout { .. })));
}

// ==========================================
// API 门面
// ==========================================

#[tokio::test]
async fn test_workflow_api_create_and_subscribe() {
    let (_tmp, conn) = test_helpers::create_test_db();
    seed_order(&conn, "O1", 100);

    let api = garment_aps::WorkflowApi::new(conn.clone());
    let mut rx = api.subscribe_events();

    let instance = api
        .create_workflow("O1".to_string(), Priority::Urgent, serde_json::Value::Null)
        .await
        .unwrap();
    assert_eq!(instance.total_steps, 8);
    assert_eq!(instance.priority, Priority::Urgent);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, ProductionEventType::WorkflowCreated);
    assert_eq!(event.order_id.as_deref(), Some("O1"));

    // 活跃告警初始为空
    assert!(api.active_alerts().await.unwrap().is_empty());
}
