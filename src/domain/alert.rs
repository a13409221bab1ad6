// ==========================================
// 服装生产运营平台 - 告警与瓶颈领域模型
// ==========================================
// 用途: 工作流事件产生的操作员通知与瓶颈诊断
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{AlertType, Severity, Stage};

// ==========================================
// ProductionAlert - 生产告警
// ==========================================
// expires_at 已过期的告警不出现在活跃列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionAlert {
    pub alert_id: String,
    pub workflow_id: Option<String>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ProductionAlert {
    /// 在给定时刻是否仍然活跃
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => true,
        }
    }
}

// ==========================================
// BottleneckAnalysis - 瓶颈诊断
// ==========================================
// 每次检测运行重新计算，不持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckAnalysis {
    pub workflow_id: String,
    pub step_id: String,
    pub stage: Stage,
    pub line_id: Option<String>,
    pub station_id: Option<String>,
    pub severity: Severity,
    pub cause: String,
    pub impact: String,
    pub suggestions: Vec<String>,
    pub estimated_delay_hours: f64,
    pub affected_orders: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_alert_expiry() {
        let now = Utc::now();
        let alert = ProductionAlert {
            alert_id: "A001".to_string(),
            workflow_id: None,
            alert_type: AlertType::Delay,
            severity: Severity::Medium,
            title: "步骤延误".to_string(),
            message: "缝制阶段超出计划工时".to_string(),
            is_read: false,
            expires_at: Some(now + Duration::hours(1)),
            created_at: now,
        };
        assert!(alert.is_active(now));
        assert!(!alert.is_active(now + Duration::hours(2)));

        let no_expiry = ProductionAlert { expires_at: None, ..alert };
        assert!(no_expiry.is_active(now + Duration::days(365)));
    }
}
