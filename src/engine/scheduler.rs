// ==========================================
// 服装生产运营平台 - 生产排产引擎
// ==========================================
// 职责: 工人任务指派（技能/时间约束）、排程优化、产能与绩效计算
// 并发: 指派提交走"校验-提交"，冲突自动重试一次，二次冲突向调用方返回
// 说明: 技能不足/时间冲突返回类型化拒绝结果并附替代工人，不走错误通道
// ==========================================

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::domain::production::{ProductionCapacity, ProductionMetrics, ProductionSchedule};
use crate::domain::types::{Priority, ShiftType, SkillLevel};
use crate::domain::worker::{WorkerAllocation, WorkerAssignment, WorkerCapacity};
use crate::domain::CostBreakdown;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::repositories::PlanningRepositories;
use crate::repository::error::RepositoryError;

/// 日历换算用的标准工作日时长（小时）
const WORK_DAY_HOURS: f64 = 8.0;

/// 工时比较容差（小时）
const HOURS_EPSILON: f64 = 1e-9;

/// 权重归一化容差
const WEIGHT_EPSILON: f64 = 1e-3;

// ==========================================
// 指派请求与结果
// ==========================================

/// 工人指派请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAssignmentRequest {
    pub worker_id: String,
    pub schedule_id: Option<String>,
    pub station_id: Option<String>,
    pub required_skill: SkillLevel,
    pub estimated_hours: f64,
    pub preferred_start: DateTime<Utc>,
    pub shift: ShiftType,
    pub priority: Priority,
}

/// 指派拒绝原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConflictReason {
    /// 技能匹配度低于下限
    InsufficientSkill { skill_match: f64 },
    /// 时间冲突（排班缺失或剩余工时不足）
    Unavailable { available_hours: f64 },
    /// 并发提交竞争失败（重试一次后仍冲突）
    AssignmentRaceLost,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictReason::InsufficientSkill { skill_match } => {
                write!(f, "技能不足: 匹配度 {:.3}", skill_match)
            }
            ConflictReason::Unavailable { available_hours } => {
                write!(f, "时间冲突: 剩余可用 {:.1}h", available_hours)
            }
            ConflictReason::AssignmentRaceLost => write!(f, "并发指派冲突"),
        }
    }
}

/// 替代工人（按技能匹配度、剩余工时排序）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAlternative {
    pub worker_id: String,
    pub worker_name: String,
    pub skill_match: f64,
    pub available_hours: f64,
    pub hourly_rate: f64,
}

/// 已提交的指派与排程窗口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedAssignment {
    pub assignment_id: String,
    pub worker_id: String,
    pub worker_name: String,
    pub station_id: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub skill_match: f64,
}

/// 指派结果（类型化，拒绝时附替代工人）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAssignmentResult {
    pub success: bool,
    pub assignment: Option<CommittedAssignment>,
    pub conflict_reason: Option<ConflictReason>,
    pub alternatives: Vec<WorkerAlternative>,
}

impl WorkerAssignmentResult {
    fn committed(assignment: CommittedAssignment) -> Self {
        Self {
            success: true,
            assignment: Some(assignment),
            conflict_reason: None,
            alternatives: Vec::new(),
        }
    }

    fn rejected(reason: ConflictReason, alternatives: Vec<WorkerAlternative>) -> Self {
        Self {
            success: false,
            assignment: None,
            conflict_reason: Some(reason),
            alternatives,
        }
    }
}

// ==========================================
// 排程优化目标与结果
// ==========================================

/// 优化目标（归一化权重，和必须 ≈ 1）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizationGoals {
    pub minimize_time: f64,
    pub minimize_cost: f64,
    pub maximize_quality: f64,
    pub balance_workload: f64,
}

impl Default for OptimizationGoals {
    fn default() -> Self {
        Self {
            minimize_time: 1.0,
            minimize_cost: 0.0,
            maximize_quality: 0.0,
            balance_workload: 0.0,
        }
    }
}

impl OptimizationGoals {
    /// 权重校验: 全部非负且和 ≈ 1
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            self.minimize_time,
            self.minimize_cost,
            self.maximize_quality,
            self.balance_workload,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err("优化权重不允许为负".to_string());
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(format!("优化权重之和必须为 1 (当前 {:.3})", sum));
        }
        Ok(())
    }
}

/// 单条排程的优化结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleChange {
    pub schedule_id: String,
    pub original_start: DateTime<Utc>,
    pub original_end: DateTime<Utc>,
    pub optimized_start: DateTime<Utc>,
    pub optimized_end: DateTime<Utc>,
    pub assigned_worker: Option<String>,
    pub improvement_reasons: Vec<String>,
}

/// 优化收益汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationImprovements {
    pub time_reduction_hours: f64,
    pub cost_reduction: f64,
    pub efficiency_gain_pct: f64,
    pub quality_improvement_pct: f64,
}

/// OptimizeProductionSchedule 的输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionScheduleOptimization {
    pub optimized_schedule: Vec<ScheduleChange>,
    pub improvements: OptimizationImprovements,
}

// ==========================================
// ProductionScheduler - 排产引擎
// ==========================================
pub struct ProductionScheduler {
    repos: PlanningRepositories,
    config: PlanningConfig,
}

impl ProductionScheduler {
    /// 构造函数
    pub fn new(repos: PlanningRepositories, config: PlanningConfig) -> Self {
        Self { repos, config }
    }

    // ==========================================
    // 工人指派
    // ==========================================

    /// 指派工人到任务
    ///
    /// 校验顺序: 工人存在 → 技能匹配 → 时间可用 → 校验-提交。
    /// 提交冲突自动以刷新数据重试一次，二次冲突返回类型化拒绝。
    #[instrument(skip(self, request), fields(worker_id = %request.worker_id))]
    pub fn assign_worker_to_task(
        &self,
        request: &WorkerAssignmentRequest,
    ) -> PlanningResult<WorkerAssignmentResult> {
        let employee = self
            .repos
            .employee_repo
            .find_by_id(&request.worker_id)?
            .filter(|e| e.is_active)
            .ok_or_else(|| PlanningError::not_found("Employee", &request.worker_id))?;

        let date = request.preferred_start.date_naive();

        // 排班缺失视为时间不可用
        let Some(allocation) = self
            .repos
            .allocation_repo
            .find_for(&request.worker_id, date, request.shift)?
        else {
            return Ok(WorkerAssignmentResult::rejected(
                ConflictReason::Unavailable { available_hours: 0.0 },
                self.find_alternative_workers(request, date)?,
            ));
        };

        // 技能匹配
        let skill_match =
            Self::calculate_skill_match(allocation.skill_level, request.required_skill);
        if skill_match < self.config.min_skill_match {
            return Ok(WorkerAssignmentResult::rejected(
                ConflictReason::InsufficientSkill { skill_match },
                self.find_alternative_workers(request, date)?,
            ));
        }

        // 时间可用性
        let assigned = self
            .repos
            .assignment_repo
            .sum_assigned_hours(&request.worker_id, date, request.shift)?;
        let available = allocation.hours_allocated - assigned;
        if request.estimated_hours > available + HOURS_EPSILON {
            return Ok(WorkerAssignmentResult::rejected(
                ConflictReason::Unavailable { available_hours: available.max(0.0) },
                self.find_alternative_workers(request, date)?,
            ));
        }

        // 校验-提交；冲突重试一次
        let mut race_lost = false;
        for attempt in 0..2 {
            let assignment = WorkerAssignment {
                assignment_id: Uuid::new_v4().to_string(),
                worker_id: request.worker_id.clone(),
                schedule_id: request.schedule_id.clone(),
                station_id: request.station_id.clone(),
                assigned_date: date,
                shift: request.shift,
                assigned_hours: request.estimated_hours,
                created_at: Utc::now(),
            };

            match self
                .repos
                .assignment_repo
                .insert_checked(&assignment, allocation.hours_allocated)
            {
                Ok(()) => {
                    let (start, end) =
                        Self::schedule_window(request.preferred_start, request.estimated_hours);
                    tracing::info!(
                        assignment_id = %assignment.assignment_id,
                        skill_match,
                        "指派提交成功"
                    );
                    return Ok(WorkerAssignmentResult::committed(CommittedAssignment {
                        assignment_id: assignment.assignment_id,
                        worker_id: request.worker_id.clone(),
                        worker_name: employee.name.clone(),
                        station_id: request.station_id.clone(),
                        scheduled_start: start,
                        scheduled_end: end,
                        skill_match,
                    }));
                }
                Err(RepositoryError::AssignmentConflict { message, .. }) => {
                    tracing::warn!(attempt, "指派提交冲突: {}", message);
                    race_lost = true;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug_assert!(race_lost);
        Ok(WorkerAssignmentResult::rejected(
            ConflictReason::AssignmentRaceLost,
            self.find_alternative_workers(request, date)?,
        ))
    }

    /// 查找替代工人
    ///
    /// 同日同班次有排班、技能达标且有剩余工时的工人，
    /// 按技能匹配度降序、剩余工时降序排序，最多返回配置上限个。
    fn find_alternative_workers(
        &self,
        request: &WorkerAssignmentRequest,
        date: NaiveDate,
    ) -> PlanningResult<Vec<WorkerAlternative>> {
        let allocations = self
            .repos
            .allocation_repo
            .list_for_date_shift(date, request.shift, None)?;

        let mut alternatives = Vec::new();
        for alloc in allocations {
            if alloc.worker_id == request.worker_id {
                continue;
            }
            let skill_match =
                Self::calculate_skill_match(alloc.skill_level, request.required_skill);
            if skill_match < self.config.min_skill_match {
                continue;
            }
            let assigned = self
                .repos
                .assignment_repo
                .sum_assigned_hours(&alloc.worker_id, date, request.shift)?;
            let available = alloc.hours_allocated - assigned;
            if available <= 0.0 {
                continue;
            }
            let name = self
                .repos
                .employee_repo
                .find_by_id(&alloc.worker_id)?
                .filter(|e| e.is_active)
                .map(|e| e.name);
            let Some(worker_name) = name else {
                continue;
            };
            alternatives.push(WorkerAlternative {
                worker_id: alloc.worker_id.clone(),
                worker_name,
                skill_match,
                available_hours: available,
                hourly_rate: alloc.hourly_rate.unwrap_or(0.0),
            });
        }

        alternatives.sort_by(|a, b| {
            b.skill_match
                .total_cmp(&a.skill_match)
                .then(b.available_hours.total_cmp(&a.available_hours))
                .then(a.worker_id.cmp(&b.worker_id))
        });
        alternatives.truncate(self.config.max_alternatives);
        Ok(alternatives)
    }

    // ==========================================
    // 排程优化
    // ==========================================

    /// 优化生产排程
    ///
    /// 对每条排程在可用工人中按加权目标选择最优指派候选，
    /// 绝不产生违反技能/时间约束的指派；输出为建议，不直接落库。
    /// 同分候选按工人 ID 升序裁决，输出确定。
    #[instrument(skip(self, schedule_ids, goals), fields(schedule_count = schedule_ids.len()))]
    pub fn optimize_production_schedule(
        &self,
        schedule_ids: &[String],
        goals: &OptimizationGoals,
    ) -> PlanningResult<ProductionScheduleOptimization> {
        goals.validate().map_err(PlanningError::Validation)?;

        let schedules = self.repos.schedule_repo.find_by_ids(schedule_ids)?;

        let mut changes = Vec::with_capacity(schedules.len());
        let mut total_planned_hours = 0.0;
        let mut time_reduction = 0.0;
        let mut cost_reduction = 0.0;
        let mut quality_gain_sum = 0.0;
        let mut reassigned = 0usize;

        for schedule in &schedules {
            let planned_hours = schedule.planned_hours();
            total_planned_hours += planned_hours;

            match self.pick_best_worker(schedule, goals)? {
                Some(pick) => {
                    // 高技能提速: 每超出一级所需技能缩短 10% 工期
                    let over_skill = pick
                        .skill_level
                        .ordinal()
                        .saturating_sub(schedule.stage.required_skill().ordinal());
                    let speedup = f64::from(over_skill) * 0.10;
                    let optimized_hours = planned_hours * (1.0 - speedup);
                    let optimized_end = schedule.planned_start
                        + Duration::minutes((optimized_hours * 60.0).round() as i64);

                    let mut reasons = vec![format!(
                        "按加权目标重排工人: {} (技能匹配 {:.2})",
                        pick.worker_id, pick.skill_match
                    )];
                    if over_skill > 0 {
                        reasons.push(format!("高技能工人提速 {:.0}%", speedup * 100.0));
                    }
                    if goals.balance_workload > 0.0 {
                        reasons.push(format!("剩余工时 {:.1}h，负载均衡", pick.available_hours));
                    }

                    time_reduction += planned_hours - optimized_hours;
                    cost_reduction += (pick.baseline_rate - pick.hourly_rate).max(0.0)
                        * optimized_hours;
                    quality_gain_sum += (pick.skill_match - self.config.min_skill_match).max(0.0);
                    reassigned += 1;

                    changes.push(ScheduleChange {
                        schedule_id: schedule.schedule_id.clone(),
                        original_start: schedule.planned_start,
                        original_end: schedule.planned_end,
                        optimized_start: schedule.planned_start,
                        optimized_end,
                        assigned_worker: Some(pick.worker_id),
                        improvement_reasons: reasons,
                    });
                }
                None => {
                    // 无满足约束的候选: 保持原排程
                    changes.push(ScheduleChange {
                        schedule_id: schedule.schedule_id.clone(),
                        original_start: schedule.planned_start,
                        original_end: schedule.planned_end,
                        optimized_start: schedule.planned_start,
                        optimized_end: schedule.planned_end,
                        assigned_worker: None,
                        improvement_reasons: vec!["无满足约束的可用工人，保持原排程".to_string()],
                    });
                }
            }
        }

        let efficiency_gain_pct = if total_planned_hours > 0.0 {
            time_reduction / total_planned_hours * 100.0
        } else {
            0.0
        };
        let quality_improvement_pct = if reassigned > 0 {
            quality_gain_sum / reassigned as f64 * 100.0
        } else {
            0.0
        };

        Ok(ProductionScheduleOptimization {
            optimized_schedule: changes,
            improvements: OptimizationImprovements {
                time_reduction_hours: time_reduction,
                cost_reduction,
                efficiency_gain_pct,
                quality_improvement_pct,
            },
        })
    }

    /// 单条排程的最优工人选择（满足技能与时间约束的加权最优）
    fn pick_best_worker(
        &self,
        schedule: &ProductionSchedule,
        goals: &OptimizationGoals,
    ) -> PlanningResult<Option<WorkerPick>> {
        let date = schedule.planned_start.date_naive();
        let shift = Self::shift_for(schedule.planned_start);
        let required_skill = schedule.stage.required_skill();
        let needed_hours = schedule.planned_hours();

        let allocations = self.repos.allocation_repo.list_for_date_shift(date, shift, None)?;
        if allocations.is_empty() {
            return Ok(None);
        }

        let max_rate = allocations
            .iter()
            .filter_map(|a| a.hourly_rate)
            .fold(0.0_f64, f64::max)
            .max(1.0);
        let rate_sum: f64 = allocations.iter().map(|a| a.hourly_rate.unwrap_or(0.0)).sum();
        let baseline_rate = rate_sum / allocations.len() as f64;

        let mut best: Option<(f64, WorkerPick)> = None;
        for alloc in &allocations {
            let skill_match = Self::calculate_skill_match(alloc.skill_level, required_skill);
            if skill_match < self.config.min_skill_match {
                continue;
            }
            let assigned = self
                .repos
                .assignment_repo
                .sum_assigned_hours(&alloc.worker_id, date, shift)?;
            let available = alloc.hours_allocated - assigned;
            if needed_hours > available + HOURS_EPSILON {
                continue;
            }

            let score = Self::score_candidate(alloc, skill_match, available, max_rate, goals);
            let pick = WorkerPick {
                worker_id: alloc.worker_id.clone(),
                skill_level: alloc.skill_level,
                skill_match,
                available_hours: available,
                hourly_rate: alloc.hourly_rate.unwrap_or(0.0),
                baseline_rate,
            };

            let better = match &best {
                None => true,
                // 同分按工人 ID 升序裁决
                Some((best_score, best_pick)) => {
                    score > *best_score
                        || (score == *best_score && pick.worker_id < best_pick.worker_id)
                }
            };
            if better {
                best = Some((score, pick));
            }
        }

        Ok(best.map(|(_, pick)| pick))
    }

    /// 候选评分: 四个目标的加权和
    fn score_candidate(
        alloc: &WorkerAllocation,
        skill_match: f64,
        available: f64,
        max_rate: f64,
        goals: &OptimizationGoals,
    ) -> f64 {
        let time_score = skill_match;
        let cost_score = 1.0 - alloc.hourly_rate.unwrap_or(0.0) / max_rate;
        let quality_score = f64::from(alloc.skill_level.ordinal()) / 3.0;
        let balance_score = if alloc.hours_allocated > 0.0 {
            available / alloc.hours_allocated
        } else {
            0.0
        };

        goals.minimize_time * time_score
            + goals.minimize_cost * cost_score
            + goals.maximize_quality * quality_score
            + goals.balance_workload * balance_score
    }

    // ==========================================
    // 产能计算
    // ==========================================

    /// 计算产线单班产能
    ///
    /// totalHours = 排班工人数 × 班次时长（班次时长来自配置）
    #[instrument(skip(self))]
    pub fn calculate_production_capacity(
        &self,
        line_id: &str,
        date: NaiveDate,
        shift: ShiftType,
    ) -> PlanningResult<ProductionCapacity> {
        let line = self
            .repos
            .line_repo
            .find_by_id(line_id)?
            .ok_or_else(|| PlanningError::not_found("ProductionLine", line_id))?;

        let allocations = self
            .repos
            .allocation_repo
            .list_for_date_shift(date, shift, Some(line_id))?;
        let worker_count = allocations.len();
        let total_hours = worker_count as f64 * self.config.shift_hours(shift);

        let assigned_hours = self
            .repos
            .assignment_repo
            .sum_assigned_hours_for_line(line_id, date, shift)?;

        let utilization_rate = if total_hours > 0.0 {
            assigned_hours / total_hours * 100.0
        } else {
            0.0
        };

        Ok(ProductionCapacity {
            line_id: line.line_id,
            date,
            shift,
            total_hours,
            assigned_hours,
            available_hours: total_hours - assigned_hours,
            utilization_rate,
            worker_count,
            efficiency: line.efficiency,
        })
    }

    /// 计算工人单日单班产能
    ///
    /// 无排班时返回不可用（零工时），不视为错误
    #[instrument(skip(self))]
    pub fn get_worker_capacity(
        &self,
        worker_id: &str,
        date: NaiveDate,
        shift: ShiftType,
    ) -> PlanningResult<WorkerCapacity> {
        self.repos
            .employee_repo
            .find_by_id(worker_id)?
            .ok_or_else(|| PlanningError::not_found("Employee", worker_id))?;

        let Some(allocation) = self.repos.allocation_repo.find_for(worker_id, date, shift)? else {
            return Ok(WorkerCapacity::unavailable(worker_id, date, shift));
        };

        let assigned_hours = self
            .repos
            .assignment_repo
            .sum_assigned_hours(worker_id, date, shift)?;
        let available_hours = (allocation.hours_allocated - assigned_hours).max(0.0);

        Ok(WorkerCapacity {
            worker_id: worker_id.to_string(),
            date,
            shift,
            skill_level: allocation.skill_level,
            hourly_rate: allocation.hourly_rate.unwrap_or(0.0),
            allocated_hours: allocation.hours_allocated,
            assigned_hours,
            available_hours,
            is_available: available_hours > 0.0,
        })
    }

    // ==========================================
    // 生产绩效
    // ==========================================

    /// 生成生产绩效报表
    ///
    /// 对当日匹配排程计算交付/效率/质量/成本指标
    #[instrument(skip(self))]
    pub fn generate_production_metrics(
        &self,
        date: NaiveDate,
        line_id: Option<&str>,
        worker_id: Option<&str>,
    ) -> PlanningResult<ProductionMetrics> {
        let schedules = self.repos.schedule_repo.list_for_date(date, line_id, worker_id)?;

        let total_orders = schedules.len();
        let completed_orders = schedules
            .iter()
            .filter(|s| s.status == crate::domain::types::WorkflowStatus::Completed)
            .count();
        let on_time_orders = schedules.iter().filter(|s| s.completed_on_time()).count();

        let total_planned_hours: f64 = schedules.iter().map(|s| s.planned_hours()).sum();
        let total_actual_hours: f64 =
            schedules.iter().filter_map(|s| s.actual_hours()).sum();

        let on_time_delivery = if total_orders > 0 {
            on_time_orders as f64 / total_orders as f64 * 100.0
        } else {
            0.0
        };
        let efficiency = if total_actual_hours > 0.0 {
            total_planned_hours / total_actual_hours * 100.0
        } else {
            0.0
        };
        let utilization_rate = efficiency.min(100.0);

        let total_produced: i64 = schedules.iter().map(|s| s.completed_quantity).sum();
        let total_defects: i64 = schedules.iter().map(|s| s.rejected_quantity).sum();
        let defect_rate = if total_produced > 0 {
            total_defects as f64 / total_produced as f64 * 100.0
        } else {
            0.0
        };
        let throughput = if total_actual_hours > 0.0 {
            total_produced as f64 / total_actual_hours
        } else {
            0.0
        };

        let quality_score = self
            .repos
            .workflow_repo
            .avg_quality_score_for_date(date)?
            .unwrap_or(0.0);

        let labor = total_actual_hours * self.config.labor_rate_per_hour;
        let overhead = total_actual_hours * self.config.overhead_rate_per_hour;
        let material = self.repos.transaction_repo.sum_out_cost_for_date(date)?;

        Ok(ProductionMetrics {
            date,
            line_id: line_id.map(|s| s.to_string()),
            worker_id: worker_id.map(|s| s.to_string()),
            total_orders,
            completed_orders,
            on_time_delivery,
            efficiency,
            utilization_rate,
            throughput,
            quality_score,
            defect_rate,
            cost: CostBreakdown {
                labor,
                material,
                overhead,
                total: labor + material + overhead,
            },
        })
    }

    // ==========================================
    // 纯计算辅助
    // ==========================================

    /// 技能匹配度: min(1.0, worker / required)
    pub fn calculate_skill_match(worker: SkillLevel, required: SkillLevel) -> f64 {
        (f64::from(worker.ordinal()) / f64::from(required.ordinal())).min(1.0)
    }

    /// 排程窗口: start + estimatedHours 按 8 小时工作日折算为日历时长
    pub fn schedule_window(
        start: DateTime<Utc>,
        estimated_hours: f64,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let calendar_minutes = (estimated_hours / WORK_DAY_HOURS * 24.0 * 60.0).round() as i64;
        (start, start + Duration::minutes(calendar_minutes))
    }

    /// 按计划开始时刻推断班次（6-14 早班, 14-22 中班, 其余夜班）
    pub fn shift_for(start: DateTime<Utc>) -> ShiftType {
        match start.hour() {
            6..=13 => ShiftType::Morning,
            14..=21 => ShiftType::Afternoon,
            _ => ShiftType::Night,
        }
    }
}

/// 优化候选的选择结果
struct WorkerPick {
    worker_id: String,
    skill_level: SkillLevel,
    skill_match: f64,
    available_hours: f64,
    hourly_rate: f64,
    baseline_rate: f64,
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // 技能匹配度边界测试
    // ==========================================

    #[test]
    fn test_skill_match_over_qualified_is_one() {
        assert_eq!(
            ProductionScheduler::calculate_skill_match(SkillLevel::Advanced, SkillLevel::Beginner),
            1.0
        );
        assert_eq!(
            ProductionScheduler::calculate_skill_match(
                SkillLevel::Intermediate,
                SkillLevel::Intermediate
            ),
            1.0
        );
    }

    #[test]
    fn test_skill_match_under_qualified_boundary() {
        // INTERMEDIATE(2) vs ADVANCED(3) = 0.667 >= 0.5 => 通过
        let m = ProductionScheduler::calculate_skill_match(
            SkillLevel::Intermediate,
            SkillLevel::Advanced,
        );
        assert!((m - 2.0 / 3.0).abs() < 1e-9);
        assert!(m >= 0.5);

        // BEGINNER(1) vs ADVANCED(3) = 0.333 < 0.5 => 拒绝
        let m = ProductionScheduler::calculate_skill_match(SkillLevel::Beginner, SkillLevel::Advanced);
        assert!((m - 1.0 / 3.0).abs() < 1e-9);
        assert!(m < 0.5);

        // BEGINNER(1) vs INTERMEDIATE(2) = 0.5 => 恰好达标
        let m = ProductionScheduler::calculate_skill_match(
            SkillLevel::Beginner,
            SkillLevel::Intermediate,
        );
        assert_eq!(m, 0.5);
    }

    #[test]
    fn test_skill_match_always_in_unit_interval() {
        for worker in [SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Advanced] {
            for required in [SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Advanced] {
                let m = ProductionScheduler::calculate_skill_match(worker, required);
                assert!((0.0..=1.0).contains(&m));
                if worker >= required {
                    assert_eq!(m, 1.0);
                }
            }
        }
    }

    // ==========================================
    // 排程窗口测试
    // ==========================================

    #[test]
    fn test_schedule_window_eight_hour_day() {
        let start = Utc::now();
        // 8 工时 = 1 个日历日
        let (s, e) = ProductionScheduler::schedule_window(start, 8.0);
        assert_eq!(s, start);
        assert_eq!(e - s, Duration::days(1));

        // 4 工时 = 半个日历日
        let (_, e) = ProductionScheduler::schedule_window(start, 4.0);
        assert_eq!(e - start, Duration::hours(12));
    }

    #[test]
    fn test_shift_for_hour_bands() {
        let base = chrono::NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let at = |h: u32| {
            base.and_hms_opt(h, 0, 0).unwrap().and_utc()
        };
        assert_eq!(ProductionScheduler::shift_for(at(8)), ShiftType::Morning);
        assert_eq!(ProductionScheduler::shift_for(at(15)), ShiftType::Afternoon);
        assert_eq!(ProductionScheduler::shift_for(at(23)), ShiftType::Night);
        assert_eq!(ProductionScheduler::shift_for(at(2)), ShiftType::Night);
    }

    // ==========================================
    // 优化目标权重测试
    // ==========================================

    #[test]
    fn test_goals_must_sum_to_one() {
        assert!(OptimizationGoals::default().validate().is_ok());

        let balanced = OptimizationGoals {
            minimize_time: 0.4,
            minimize_cost: 0.3,
            maximize_quality: 0.2,
            balance_workload: 0.1,
        };
        assert!(balanced.validate().is_ok());

        let over = OptimizationGoals {
            minimize_time: 0.8,
            minimize_cost: 0.8,
            maximize_quality: 0.0,
            balance_workload: 0.0,
        };
        assert!(over.validate().is_err());

        let negative = OptimizationGoals {
            minimize_time: 1.5,
            minimize_cost: -0.5,
            maximize_quality: 0.0,
            balance_workload: 0.0,
        };
        assert!(negative.validate().is_err());
    }
}
