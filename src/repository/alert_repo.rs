// ==========================================
// 服装生产运营平台 - 告警数据仓储
// ==========================================
// 职责: production_alert 数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::alert::ProductionAlert;
use crate::domain::types::{AlertType, Severity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ProductionAlertRepository - 告警仓储
// ==========================================
pub struct ProductionAlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionAlertRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入告警
    pub fn insert(&self, alert: &ProductionAlert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_alert (
                alert_id, workflow_id, alert_type, severity, title, message,
                is_read, expires_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                alert.alert_id,
                alert.workflow_id,
                alert.alert_type.to_string(),
                alert.severity.to_string(),
                alert.title,
                alert.message,
                alert.is_read as i64,
                alert.expires_at,
                alert.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询活跃告警（未读且未过期），按创建时间倒序
    pub fn list_active(&self, now: DateTime<Utc>) -> RepositoryResult<Vec<ProductionAlert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT alert_id, workflow_id, alert_type, severity, title, message,
                   is_read, expires_at, created_at
            FROM production_alert
            WHERE is_read = 0
              AND (expires_at IS NULL OR expires_at > ?1)
            ORDER BY created_at DESC
            "#,
        )?;
        let alerts = stmt
            .query_map(params![now], |row| {
                Ok(ProductionAlert {
                    alert_id: row.get(0)?,
                    workflow_id: row.get(1)?,
                    alert_type: AlertType::from_str(&row.get::<_, String>(2)?),
                    severity: Severity::from_str(&row.get::<_, String>(3)?),
                    title: row.get(4)?,
                    message: row.get(5)?,
                    is_read: row.get::<_, i64>(6)? != 0,
                    expires_at: row.get(7)?,
                    created_at: row.get::<_, DateTime<Utc>>(8)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 标记告警已读
    pub fn mark_read(&self, alert_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE production_alert SET is_read = 1 WHERE alert_id = ?1",
            params![alert_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionAlert".to_string(),
                id: alert_id.to_string(),
            });
        }
        Ok(())
    }
}
