// ==========================================
// 服装生产运营平台 - 调用截止时间
// ==========================================
// 用途: 大批量报表（MRP 全量/瓶颈检测）的调用方截止时间
// 语义: 超时即整体失败，不返回部分结果
// ==========================================

use std::time::{Duration, Instant};

/// 调用截止时间
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started_at: Instant,
    budget: Duration,
}

impl Deadline {
    /// 以预算时长创建截止时间（从当前时刻起算）
    pub fn from_timeout(budget: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
        }
    }

    /// 是否已超时
    pub fn expired(&self) -> bool {
        self.started_at.elapsed() >= self.budget
    }

    /// 预算毫秒数（用于错误报告）
    pub fn budget_ms(&self) -> u64 {
        self.budget.as_millis() as u64
    }
}
