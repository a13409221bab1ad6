// ==========================================
// 服装生产运营平台 - 工作流领域模型
// ==========================================
// 用途: 订单多阶段履约跟踪（接单 → ... → 交付）
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Priority, SkillLevel, Stage, StepStatus, WorkflowStatus};

// ==========================================
// WorkflowInstance - 工作流实例
// ==========================================
// 一张订单对应一个实例; COMPLETED/CANCELLED 为终态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub workflow_id: String,
    pub order_id: String,
    pub status: WorkflowStatus,
    pub priority: Priority,
    pub current_stage: Stage,

    // ===== 进度 =====
    pub total_steps: usize,
    pub completed_steps: usize,

    // ===== 工期 =====
    pub estimated_duration_hours: f64, // Σ 步骤基准工时
    pub start_date: DateTime<Utc>,
    pub estimated_end_date: DateTime<Utc>,
    pub actual_end_date: Option<DateTime<Utc>>,

    pub pause_reason: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    /// 进度百分比
    pub fn progress_pct(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.completed_steps as f64 / self.total_steps as f64 * 100.0
    }
}

// ==========================================
// WorkflowStep - 工作流步骤
// ==========================================
// 依赖步骤全部 COMPLETED 且存在工人指派后方可进入 IN_PROGRESS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: String,
    pub workflow_id: String,
    pub stage: Stage,
    pub step_name: String,
    pub seq_no: i32,
    pub dependencies: Vec<String>, // 前置步骤 step_id
    pub required_skill: SkillLevel,
    pub estimated_hours: f64,
    pub status: StepStatus,
    pub assigned_worker: Option<String>,

    // ===== 计划窗口 =====
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,

    // ===== 实际窗口 =====
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,

    pub quality_score: Option<f64>,
    pub notes: Option<String>,
}

impl WorkflowStep {
    /// 实际运行工时（小时）
    ///
    /// 已完成取实际区间; 进行中取 now - actual_start; 未开始返回 None
    pub fn actual_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        let start = self.actual_start?;
        let end = self.actual_end.unwrap_or(now);
        Some(((end - start).num_minutes() as f64 / 60.0).max(0.0))
    }
}
