// ==========================================
// 服装生产运营平台 - 排产服务接口
// ==========================================
// 职责: 排产引擎的对外门面（指派/优化/产能/绩效）
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::api::error::ApiResult;
use crate::api::retry::with_upstream_retry;
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::production::{ProductionCapacity, ProductionMetrics};
use crate::domain::types::ShiftType;
use crate::domain::worker::WorkerCapacity;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::scheduler::{
    OptimizationGoals, ProductionScheduleOptimization, ProductionScheduler,
    WorkerAssignmentRequest, WorkerAssignmentResult,
};

// ==========================================
// ScheduleApi - 排产服务
// ==========================================
pub struct ScheduleApi {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleApi {
    /// 创建服务实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按当前配置快照构建排产引擎
    fn build_scheduler(conn: &Arc<Mutex<Connection>>) -> ApiResult<ProductionScheduler> {
        let config = ConfigManager::from_connection(conn.clone()).load_snapshot()?;
        let repos = PlanningRepositories::from_connection(conn.clone());
        Ok(ProductionScheduler::new(repos, config))
    }

    /// 指派工人到任务
    ///
    /// 拒绝（技能不足/时间冲突/并发冲突）以类型化结果返回并附替代工人
    pub async fn assign_worker(
        &self,
        request: WorkerAssignmentRequest,
    ) -> ApiResult<WorkerAssignmentResult> {
        validator::ensure_id("worker_id", &request.worker_id)?;
        validator::ensure_positive("estimated_hours", request.estimated_hours)?;
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let scheduler = Self::build_scheduler(&conn)?;
            Ok(scheduler.assign_worker_to_task(&request)?)
        })
        .await
    }

    /// 优化生产排程（输出为建议，不落库）
    pub async fn optimize_schedule(
        &self,
        schedule_ids: Vec<String>,
        goals: OptimizationGoals,
    ) -> ApiResult<ProductionScheduleOptimization> {
        validator::ensure_goals(&goals)?;
        for id in &schedule_ids {
            validator::ensure_id("schedule_id", id)?;
        }
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let scheduler = Self::build_scheduler(&conn)?;
            Ok(scheduler.optimize_production_schedule(&schedule_ids, &goals)?)
        })
        .await
    }

    /// 计算产线单班产能
    pub async fn production_capacity(
        &self,
        line_id: String,
        date: NaiveDate,
        shift: ShiftType,
    ) -> ApiResult<ProductionCapacity> {
        validator::ensure_id("line_id", &line_id)?;
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let scheduler = Self::build_scheduler(&conn)?;
            Ok(scheduler.calculate_production_capacity(&line_id, date, shift)?)
        })
        .await
    }

    /// 计算工人单日单班产能
    pub async fn worker_capacity(
        &self,
        worker_id: String,
        date: NaiveDate,
        shift: ShiftType,
    ) -> ApiResult<WorkerCapacity> {
        validator::ensure_id("worker_id", &worker_id)?;
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let scheduler = Self::build_scheduler(&conn)?;
            Ok(scheduler.get_worker_capacity(&worker_id, date, shift)?)
        })
        .await
    }

    /// 生成生产绩效报表
    pub async fn production_metrics(
        &self,
        date: NaiveDate,
        line_id: Option<String>,
        worker_id: Option<String>,
    ) -> ApiResult<ProductionMetrics> {
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let scheduler = Self::build_scheduler(&conn)?;
            Ok(scheduler.generate_production_metrics(
                date,
                line_id.as_deref(),
                worker_id.as_deref(),
            )?)
        })
        .await
    }
}
