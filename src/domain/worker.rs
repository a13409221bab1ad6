// ==========================================
// 服装生产运营平台 - 工人领域模型
// ==========================================
// 用途: 排班产能、技能匹配与任务指派
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ShiftType, SkillLevel};

// ==========================================
// Employee - 员工主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub base_salary: Option<f64>,
    pub is_active: bool,
}

// ==========================================
// WorkerAllocation - 工人排班
// ==========================================
// 一名工人在某日某班次的可用工时与技能档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAllocation {
    pub allocation_id: String,
    pub worker_id: String,
    pub line_id: Option<String>,
    pub allocation_date: NaiveDate,
    pub shift: ShiftType,
    pub hours_allocated: f64,
    pub skill_level: SkillLevel,
    pub hourly_rate: Option<f64>,
}

// ==========================================
// WorkerAssignment - 工人任务指派
// ==========================================
// 提交后不可变；改派 = 新记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAssignment {
    pub assignment_id: String,
    pub worker_id: String,
    pub schedule_id: Option<String>,
    pub station_id: Option<String>,
    pub assigned_date: NaiveDate,
    pub shift: ShiftType,
    pub assigned_hours: f64,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// WorkerCapacity - 工人单日产能
// ==========================================
// 计算值，不持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerCapacity {
    pub worker_id: String,
    pub date: NaiveDate,
    pub shift: ShiftType,
    pub skill_level: SkillLevel,
    pub hourly_rate: f64,
    pub allocated_hours: f64,
    pub assigned_hours: f64,
    pub available_hours: f64, // max(0, allocated - assigned)
    pub is_available: bool,
}

impl WorkerCapacity {
    /// 无排班时的空产能（不可用）
    pub fn unavailable(worker_id: &str, date: NaiveDate, shift: ShiftType) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            date,
            shift,
            skill_level: SkillLevel::Intermediate,
            hourly_rate: 0.0,
            allocated_hours: 0.0,
            assigned_hours: 0.0,
            available_hours: 0.0,
            is_available: false,
        }
    }
}
