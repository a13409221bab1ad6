// ==========================================
// 服装生产运营平台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约定: 每次计划调用开始时加载一份快照，调用过程中不再读库
// ==========================================

use crate::domain::types::ShiftType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanningConfig - 计划配置快照
// ==========================================
// 引擎只消费快照，不直接访问 config_kv
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningConfig {
    // ===== MRP =====
    pub horizon_days: i64,            // 库存推演天数
    pub default_lead_time_days: i64,  // 默认采购提前期
    pub urgent_window_days: i64,      // 紧急需求窗口
    pub consolidation_saving: f64,    // 每张合并采购单的固定节省 (₱)
    pub bulk_discount_threshold: f64, // 批量折扣起点 (₱)
    pub bulk_discount_rate: f64,      // 批量折扣率

    // ===== 排产 =====
    pub shift_hours_morning: f64,   // 早班时长 (h)
    pub shift_hours_afternoon: f64, // 中班时长 (h)
    pub shift_hours_night: f64,     // 夜班时长 (h)
    pub labor_rate_per_hour: f64,   // 人工费率 (₱/h)
    pub overhead_rate_per_hour: f64, // 制造费用费率 (₱/h)
    pub min_skill_match: f64,       // 技能匹配度下限
    pub max_alternatives: usize,    // 替代工人返回上限

    // ===== 工作流 =====
    pub bottleneck_ratio_threshold: f64, // 瓶颈判定: 实际/计划工时比
    pub queue_length_threshold: usize,   // 瓶颈判定: 就绪待开工步骤数
    pub quality_alert_threshold: f64,    // 质检告警阈值 (分)
    pub alert_ttl_hours: i64,            // 自动生成告警的有效期 (h)
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            default_lead_time_days: 7,
            urgent_window_days: 7,
            consolidation_saving: 50.0,
            bulk_discount_threshold: 1000.0,
            bulk_discount_rate: 0.05,
            shift_hours_morning: 8.0,
            shift_hours_afternoon: 8.0,
            shift_hours_night: 8.0,
            labor_rate_per_hour: 150.0,
            overhead_rate_per_hour: 50.0,
            min_skill_match: 0.5,
            max_alternatives: 5,
            bottleneck_ratio_threshold: 1.2,
            queue_length_threshold: 3,
            quality_alert_threshold: 70.0,
            alert_ttl_hours: 72,
        }
    }
}

impl PlanningConfig {
    /// 班次时长（小时）
    ///
    /// 各班次独立配置，允许不等长班次
    pub fn shift_hours(&self, shift: ShiftType) -> f64 {
        match shift {
            ShiftType::Morning => self.shift_hours_morning,
            ShiftType::Afternoon => self.shift_hours_afternoon,
            ShiftType::Night => self.shift_hours_night,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值（scope_id='global'，UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default))
    }

    fn get_i64_or(&self, key: &str, default: i64) -> RepositoryResult<i64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default))
    }

    /// 加载计划配置快照
    ///
    /// 缺失键回退到默认值；非法值同样回退（不让脏配置打断计划运行）
    pub fn load_snapshot(&self) -> RepositoryResult<PlanningConfig> {
        let d = PlanningConfig::default();
        Ok(PlanningConfig {
            horizon_days: self.get_i64_or("planning/horizon_days", d.horizon_days)?,
            default_lead_time_days: self
                .get_i64_or("planning/default_lead_time_days", d.default_lead_time_days)?,
            urgent_window_days: self
                .get_i64_or("planning/urgent_window_days", d.urgent_window_days)?,
            consolidation_saving: self
                .get_f64_or("planning/consolidation_saving", d.consolidation_saving)?,
            bulk_discount_threshold: self
                .get_f64_or("planning/bulk_discount_threshold", d.bulk_discount_threshold)?,
            bulk_discount_rate: self
                .get_f64_or("planning/bulk_discount_rate", d.bulk_discount_rate)?,
            shift_hours_morning: self
                .get_f64_or("schedule/shift_hours_morning", d.shift_hours_morning)?,
            shift_hours_afternoon: self
                .get_f64_or("schedule/shift_hours_afternoon", d.shift_hours_afternoon)?,
            shift_hours_night: self.get_f64_or("schedule/shift_hours_night", d.shift_hours_night)?,
            labor_rate_per_hour: self
                .get_f64_or("schedule/labor_rate_per_hour", d.labor_rate_per_hour)?,
            overhead_rate_per_hour: self
                .get_f64_or("schedule/overhead_rate_per_hour", d.overhead_rate_per_hour)?,
            min_skill_match: self.get_f64_or("schedule/min_skill_match", d.min_skill_match)?,
            max_alternatives: self
                .get_i64_or("schedule/max_alternatives", d.max_alternatives as i64)?
                .max(0) as usize,
            bottleneck_ratio_threshold: self.get_f64_or(
                "workflow/bottleneck_ratio_threshold",
                d.bottleneck_ratio_threshold,
            )?,
            queue_length_threshold: self
                .get_i64_or(
                    "workflow/queue_length_threshold",
                    d.queue_length_threshold as i64,
                )?
                .max(0) as usize,
            quality_alert_threshold: self
                .get_f64_or("workflow/quality_alert_threshold", d.quality_alert_threshold)?,
            alert_ttl_hours: self.get_i64_or("workflow/alert_ttl_hours", d.alert_ttl_hours)?,
        })
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_table_empty() {
        let mgr = setup();
        let cfg = mgr.load_snapshot().unwrap();
        assert_eq!(cfg.horizon_days, 30);
        assert_eq!(cfg.default_lead_time_days, 7);
        assert_eq!(cfg.shift_hours(ShiftType::Morning), 8.0);
        assert_eq!(cfg.shift_hours(ShiftType::Night), 8.0);
        assert_eq!(cfg.min_skill_match, 0.5);
        assert_eq!(cfg.bottleneck_ratio_threshold, 1.2);
    }

    #[test]
    fn test_override_and_unequal_shift_hours() {
        let mgr = setup();
        mgr.set_config_value("schedule/shift_hours_night", "6.5").unwrap();
        mgr.set_config_value("planning/horizon_days", "14").unwrap();

        let cfg = mgr.load_snapshot().unwrap();
        assert_eq!(cfg.shift_hours(ShiftType::Night), 6.5);
        assert_eq!(cfg.shift_hours(ShiftType::Morning), 8.0);
        assert_eq!(cfg.horizon_days, 14);
    }

    #[test]
    fn test_invalid_value_falls_back() {
        let mgr = setup();
        mgr.set_config_value("planning/horizon_days", "not-a-number").unwrap();
        let cfg = mgr.load_snapshot().unwrap();
        assert_eq!(cfg.horizon_days, 30);
    }
}
