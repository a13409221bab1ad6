// ==========================================
// 服装生产运营平台 - 生产领域模型
// ==========================================
// 用途: 产线/工位主数据、排程记录、产能与绩效报表
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Priority, ShiftType, Stage, WorkflowStatus};

// ==========================================
// ProductionLine - 产线
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLine {
    pub line_id: String,
    pub line_name: Option<String>,
    pub is_active: bool,
    pub efficiency: f64, // 历史效率系数 (1.0 = 基准)
}

// ==========================================
// WorkStation - 工位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkStation {
    pub station_id: String,
    pub line_id: String,
    pub station_name: Option<String>,
    pub is_active: bool,
}

// ==========================================
// ProductionSchedule - 生产排程
// ==========================================
// 一张订单在一个阶段上的排程窗口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSchedule {
    pub schedule_id: String,
    pub order_id: Option<String>,
    pub line_id: Option<String>,
    pub stage: Stage,
    pub status: WorkflowStatus,
    pub priority: Priority,

    // ===== 计划窗口 =====
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,

    // ===== 实际窗口 =====
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,

    // ===== 数量 =====
    pub planned_quantity: i64,
    pub completed_quantity: i64,
    pub rejected_quantity: i64,
}

impl ProductionSchedule {
    /// 计划工时（小时）
    pub fn planned_hours(&self) -> f64 {
        (self.planned_end - self.planned_start).num_minutes() as f64 / 60.0
    }

    /// 实际工时（小时）；未开始/未结束返回 None
    pub fn actual_hours(&self) -> Option<f64> {
        match (self.actual_start, self.actual_end) {
            (Some(s), Some(e)) => Some((e - s).num_minutes() as f64 / 60.0),
            _ => None,
        }
    }

    /// 是否按期完成
    pub fn completed_on_time(&self) -> bool {
        matches!(self.actual_end, Some(end) if end <= self.planned_end)
    }
}

// ==========================================
// ProductionCapacity - 产线单班产能
// ==========================================
// 计算值，不持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionCapacity {
    pub line_id: String,
    pub date: NaiveDate,
    pub shift: ShiftType,
    pub total_hours: f64,      // workerCount × 班次时长
    pub assigned_hours: f64,   // 已指派工时
    pub available_hours: f64,  // total - assigned
    pub utilization_rate: f64, // assigned / total × 100 (total=0 时为 0)
    pub worker_count: usize,
    pub efficiency: f64,       // 产线效率系数
}

// ==========================================
// ProductionMetrics - 生产绩效报表
// ==========================================

/// 成本拆解
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub labor: f64,    // actualHours × 人工费率
    pub material: f64, // 当日领料成本
    pub overhead: f64, // actualHours × 制造费用费率
    pub total: f64,    // labor + material + overhead
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionMetrics {
    pub date: NaiveDate,
    pub line_id: Option<String>,
    pub worker_id: Option<String>,

    // ===== 交付 =====
    pub total_orders: usize,
    pub completed_orders: usize,
    pub on_time_delivery: f64, // 按期完成率 (%)

    // ===== 效率 =====
    pub efficiency: f64,       // planned / actual × 100 (actual=0 时为 0)
    pub utilization_rate: f64,
    pub throughput: f64,       // 件/小时

    // ===== 质量 =====
    pub quality_score: f64,    // 平均质检评分
    pub defect_rate: f64,      // 不良率 (%)

    // ===== 成本 =====
    pub cost: CostBreakdown,
}
