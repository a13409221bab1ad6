// ==========================================
// 排产引擎集成测试
// ==========================================
// 覆盖: 技能/时间约束指派、重复占用拒绝、产能计算、绩效报表、排程优化
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;

use garment_aps::config::PlanningConfig;
use garment_aps::domain::types::{Priority, ShiftType, SkillLevel};
use garment_aps::engine::error::PlanningError;
use garment_aps::engine::scheduler::{ConflictReason, OptimizationGoals, WorkerAssignmentRequest};
use garment_aps::engine::{PlanningRepositories, ProductionScheduler};

fn work_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
}

/// 早班时段内的开工时刻
fn morning_start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 8, 0, 0).unwrap()
}

fn build_scheduler(conn: &Arc<Mutex<Connection>>) -> ProductionScheduler {
    ProductionScheduler::new(
        PlanningRepositories::from_connection(conn.clone()),
        PlanningConfig::default(),
    )
}

fn assignment_request(worker_id: &str, required: SkillLevel, hours: f64) -> WorkerAssignmentRequest {
    WorkerAssignmentRequest {
        worker_id: worker_id.to_string(),
        schedule_id: None,
        station_id: None,
        required_skill: required,
        estimated_hours: hours,
        preferred_start: morning_start(),
        shift: ShiftType::Morning,
        priority: Priority::Normal,
    }
}

// ==========================================
// 工人指派
// ==========================================

#[test]
fn test_assign_worker_success_with_schedule_window() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "李梅", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Advanced, 180.0,
    );

    let scheduler = build_scheduler(&conn);
    let result = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Intermediate, 4.0))
        .unwrap();

    assert!(result.success);
    let assignment = result.assignment.unwrap();
    assert_eq!(assignment.worker_name, "李梅");
    assert_eq!(assignment.skill_match, 1.0);
    // 4 工时按 8 小时工作日折算为半个日历日
    assert_eq!(assignment.scheduled_end - assignment.scheduled_start, Duration::hours(12));
}

#[test]
fn test_assign_unknown_worker_not_found() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let scheduler = build_scheduler(&conn);

    let result =
        scheduler.assign_worker_to_task(&assignment_request("NOBODY", SkillLevel::Beginner, 2.0));
    assert!(matches!(result, Err(PlanningError::NotFound { .. })));
}

#[test]
fn test_insufficient_skill_rejected_with_alternatives() {
    let (_tmp, conn) = test_helpers::create_test_db();
    // 初级工 vs 高级任务: 1/3 < 0.5 => 拒绝
    test_helpers::seed_employee(&conn, "W001", "张强", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Beginner, 120.0,
    );
    // 同班次的高级工作为替代
    test_helpers::seed_employee(&conn, "W002", "王芳", true);
    test_helpers::seed_allocation(
        &conn, "W002", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Advanced, 200.0,
    );

    let scheduler = build_scheduler(&conn);
    let result = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Advanced, 4.0))
        .unwrap();

    assert!(!result.success);
    match result.conflict_reason {
        Some(ConflictReason::InsufficientSkill { skill_match }) => {
            assert!((skill_match - 1.0 / 3.0).abs() < 1e-9);
        }
        other => panic!("期望 InsufficientSkill，实际 {:?}", other),
    }
    assert_eq!(result.alternatives.len(), 1);
    assert_eq!(result.alternatives[0].worker_id, "W002");
    assert_eq!(result.alternatives[0].skill_match, 1.0);
}

#[test]
fn test_intermediate_passes_advanced_requirement() {
    // 边界: INTERMEDIATE(2)/ADVANCED(3) = 0.667 >= 0.5 => 通过
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "刘洋", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Intermediate, 150.0,
    );

    let scheduler = build_scheduler(&conn);
    let result = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Advanced, 4.0))
        .unwrap();

    assert!(result.success);
    let skill_match = result.assignment.unwrap().skill_match;
    assert!((skill_match - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_overbooking_rejected_with_unavailable() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "陈静", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Intermediate, 150.0,
    );
    test_helpers::seed_employee(&conn, "W002", "赵磊", true);
    test_helpers::seed_allocation(
        &conn, "W002", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Intermediate, 150.0,
    );

    let scheduler = build_scheduler(&conn);

    // 第一笔 5h 成功
    let first = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Intermediate, 5.0))
        .unwrap();
    assert!(first.success);

    // 第二笔 5h 超出 8h 排班 => Unavailable + 替代工人
    let second = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Intermediate, 5.0))
        .unwrap();
    assert!(!second.success);
    match second.conflict_reason {
        Some(ConflictReason::Unavailable { available_hours }) => {
            assert!((available_hours - 3.0).abs() < 1e-9);
        }
        other => panic!("期望 Unavailable，实际 {:?}", other),
    }
    assert_eq!(second.alternatives.len(), 1);
    assert_eq!(second.alternatives[0].worker_id, "W002");
}

#[test]
fn test_no_allocation_means_unavailable() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "孙丽", true);
    // 无当日排班

    let scheduler = build_scheduler(&conn);
    let result = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Beginner, 2.0))
        .unwrap();

    assert!(!result.success);
    assert!(matches!(
        result.conflict_reason,
        Some(ConflictReason::Unavailable { .. })
    ));
}

#[test]
fn test_concurrent_assignments_never_double_book() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "周敏", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Intermediate, 150.0,
    );

    // 两个线程同时为同一工人提交 6h 指派，合计超出 8h 排班
    let mut handles = Vec::new();
    for _ in 0..2 {
        let conn = conn.clone();
        handles.push(thread::spawn(move || {
            let scheduler = build_scheduler(&conn);
            scheduler
                .assign_worker_to_task(&assignment_request("W001", SkillLevel::Intermediate, 6.0))
                .unwrap()
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.success).count();
    assert_eq!(successes, 1, "恰好一笔指派成功，绝不重复占用");

    // 落库工时不超过排班
    let repos = PlanningRepositories::from_connection(conn.clone());
    let committed = repos
        .assignment_repo
        .sum_assigned_hours("W001", work_date(), ShiftType::Morning)
        .unwrap();
    assert_eq!(committed, 6.0);
}

// ==========================================
// 产能计算
// ==========================================

#[test]
fn test_production_capacity_math() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_line(&conn, "L1", "一号缝制线", 0.92);
    for (worker, skill) in [
        ("W001", SkillLevel::Advanced),
        ("W002", SkillLevel::Intermediate),
        ("W003", SkillLevel::Beginner),
    ] {
        test_helpers::seed_employee(&conn, worker, worker, true);
        test_helpers::seed_allocation(
            &conn, worker, Some("L1"), work_date(), ShiftType::Morning, 8.0, skill, 150.0,
        );
    }

    let scheduler = build_scheduler(&conn);
    let capacity = scheduler
        .calculate_production_capacity("L1", work_date(), ShiftType::Morning)
        .unwrap();

    assert_eq!(capacity.worker_count, 3);
    assert_eq!(capacity.total_hours, 24.0); // 3 × 8h
    assert_eq!(capacity.assigned_hours, 0.0);
    assert_eq!(capacity.utilization_rate, 0.0);
    assert_eq!(capacity.efficiency, 0.92);
}

#[test]
fn test_production_capacity_unknown_line() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let scheduler = build_scheduler(&conn);

    let result = scheduler.calculate_production_capacity("NO-LINE", work_date(), ShiftType::Morning);
    assert!(matches!(result, Err(PlanningError::NotFound { .. })));
}

#[test]
fn test_worker_capacity_with_and_without_allocation() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_employee(&conn, "W001", "吴婷", true);
    test_helpers::seed_allocation(
        &conn, "W001", None, work_date(), ShiftType::Morning, 8.0,
        SkillLevel::Advanced, 180.0,
    );

    let scheduler = build_scheduler(&conn);

    // 有排班: 指派 5h 后剩余 3h
    let committed = scheduler
        .assign_worker_to_task(&assignment_request("W001", SkillLevel::Intermediate, 5.0))
        .unwrap();
    assert!(committed.success);

    let capacity = scheduler
        .get_worker_capacity("W001", work_date(), ShiftType::Morning)
        .unwrap();
    assert!(capacity.is_available);
    assert_eq!(capacity.allocated_hours, 8.0);
    assert_eq!(capacity.assigned_hours, 5.0);
    assert_eq!(capacity.available_hours, 3.0);
    assert_eq!(capacity.skill_level, SkillLevel::Advanced);

    // 无排班班次: 不可用、零工时
    let night = scheduler
        .get_worker_capacity("W001", work_date(), ShiftType::Night)
        .unwrap();
    assert!(!night.is_available);
    assert_eq!(night.allocated_hours, 0.0);
    assert_eq!(night.available_hours, 0.0);
}

// ==========================================
// 生产绩效
// ==========================================

#[test]
fn test_production_metrics_formulas() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_line(&conn, "L1", "一号线", 1.0);

    let start = morning_start();
    // 按期完成: 计划 8h，实际 6h，产出 400 件不良 8 件
    test_helpers::seed_schedule(
        &conn, "S1", None, Some("L1"), "SEW", "COMPLETED",
        start, start + Duration::hours(8),
        Some(start), Some(start + Duration::hours(6)),
        400, 400, 8,
    );
    // 逾期完成: 计划 4h，实际 6h，产出 100 件
    test_helpers::seed_schedule(
        &conn, "S2", None, Some("L1"), "CUT", "COMPLETED",
        start, start + Duration::hours(4),
        Some(start), Some(start + Duration::hours(6)),
        100, 100, 0,
    );

    let scheduler = build_scheduler(&conn);
    let metrics = scheduler
        .generate_production_metrics(work_date(), Some("L1"), None)
        .unwrap();

    assert_eq!(metrics.total_orders, 2);
    assert_eq!(metrics.completed_orders, 2);
    assert_eq!(metrics.on_time_delivery, 50.0); // 1/2
    assert_eq!(metrics.efficiency, 100.0); // 计划 12h / 实际 12h
    assert_eq!(metrics.defect_rate, 1.6); // 8/500
    assert!((metrics.throughput - 500.0 / 12.0).abs() < 1e-9);

    // 成本: 人工 12×150, 制造费用 12×50, 无领料
    assert_eq!(metrics.cost.labor, 1800.0);
    assert_eq!(metrics.cost.overhead, 600.0);
    assert_eq!(metrics.cost.material, 0.0);
    assert_eq!(metrics.cost.total, 2400.0);
}

#[test]
fn test_production_metrics_zero_actual_hours() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let start = morning_start();
    // 未开工排程: 实际工时 0 => 效率/吞吐均为 0
    test_helpers::seed_schedule(
        &conn, "S1", None, None, "SEW", "PLANNED",
        start, start + Duration::hours(8),
        None, None, 200, 0, 0,
    );

    let scheduler = build_scheduler(&conn);
    let metrics = scheduler.generate_production_metrics(work_date(), None, None).unwrap();

    assert_eq!(metrics.efficiency, 0.0);
    assert_eq!(metrics.throughput, 0.0);
    assert_eq!(metrics.cost.total, 0.0);
}

// ==========================================
// 排程优化
// ==========================================

#[test]
fn test_optimize_schedule_respects_constraints_and_is_deterministic() {
    let (_tmp, conn) = test_helpers::create_test_db();
    test_helpers::seed_line(&conn, "L1", "一号线", 1.0);

    let start = morning_start();
    // 缝制排程 (需要 ADVANCED)，计划 6h
    test_helpers::seed_schedule(
        &conn, "S1", None, Some("L1"), "SEW", "PLANNED",
        start, start + Duration::hours(6),
        None, None, 300, 0, 0,
    );

    // 候选: 高级工（贵）与中级工（便宜）；初级工不满足技能约束
    for (worker, skill, rate) in [
        ("W-ADV", SkillLevel::Advanced, 200.0),
        ("W-MID", SkillLevel::Intermediate, 120.0),
        ("W-BEG", SkillLevel::Beginner, 80.0),
    ] {
        test_helpers::seed_employee(&conn, worker, worker, true);
        test_helpers::seed_allocation(
            &conn, worker, Some("L1"), work_date(), ShiftType::Morning, 8.0, skill, rate,
        );
    }

    let scheduler = build_scheduler(&conn);

    // 时间优先: 选高级工（技能匹配 1.0）
    let time_first = scheduler
        .optimize_production_schedule(&["S1".to_string()], &OptimizationGoals::default())
        .unwrap();
    assert_eq!(time_first.optimized_schedule.len(), 1);
    assert_eq!(
        time_first.optimized_schedule[0].assigned_worker.as_deref(),
        Some("W-ADV")
    );
    assert!(!time_first.optimized_schedule[0].improvement_reasons.is_empty());

    // 成本优先: 选中级工（0.667 匹配度仍达标，费率低）
    let cost_goals = OptimizationGoals {
        minimize_time: 0.0,
        minimize_cost: 1.0,
        maximize_quality: 0.0,
        balance_workload: 0.0,
    };
    let cost_first = scheduler
        .optimize_production_schedule(&["S1".to_string()], &cost_goals)
        .unwrap();
    assert_eq!(
        cost_first.optimized_schedule[0].assigned_worker.as_deref(),
        Some("W-MID")
    );

    // 初级工绝不被选中（违反技能约束）
    for change in cost_first
        .optimized_schedule
        .iter()
        .chain(time_first.optimized_schedule.iter())
    {
        assert_ne!(change.assigned_worker.as_deref(), Some("W-BEG"));
    }

    // 确定性: 重复运行输出一致
    let again = scheduler
        .optimize_production_schedule(&["S1".to_string()], &OptimizationGoals::default())
        .unwrap();
    assert_eq!(
        serde_json::to_string(&again).unwrap(),
        serde_json::to_string(&time_first).unwrap()
    );
}

#[test]
fn test_optimize_schedule_rejects_bad_weights() {
    let (_tmp, conn) = test_helpers::create_test_db();
    let scheduler = build_scheduler(&conn);

    let bad = OptimizationGoals {
        minimize_time: 0.5,
        minimize_cost: 0.2,
        maximize_quality: 0.1,
        balance_workload: 0.1,
    };
    let result = scheduler.optimize_production_schedule(&[], &bad);
    assert!(matches!(result, Err(PlanningError::Validation(_))));
}
