// ==========================================
// 服装生产运营平台 - 产线与排程数据仓储
// ==========================================
// 职责: production_line / work_station / production_schedule 数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::production::{ProductionLine, ProductionSchedule, WorkStation};
use crate::domain::types::{Priority, Stage, WorkflowStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ProductionLineRepository - 产线仓储
// ==========================================
pub struct ProductionLineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionLineRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 ID 查询产线
    pub fn find_by_id(&self, line_id: &str) -> RepositoryResult<Option<ProductionLine>> {
        let conn = self.get_conn()?;
        let line = conn
            .query_row(
                "SELECT line_id, line_name, is_active, efficiency FROM production_line WHERE line_id = ?1",
                params![line_id],
                |row| {
                    Ok(ProductionLine {
                        line_id: row.get(0)?,
                        line_name: row.get(1)?,
                        is_active: row.get::<_, i64>(2)? != 0,
                        efficiency: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(line)
    }

    /// 查询产线的活跃工位
    pub fn list_active_stations(&self, line_id: &str) -> RepositoryResult<Vec<WorkStation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT station_id, line_id, station_name, is_active
            FROM work_station
            WHERE line_id = ?1 AND is_active = 1
            ORDER BY station_id
            "#,
        )?;
        let list = stmt
            .query_map(params![line_id], |row| {
                Ok(WorkStation {
                    station_id: row.get(0)?,
                    line_id: row.get(1)?,
                    station_name: row.get(2)?,
                    is_active: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}

// ==========================================
// ProductionScheduleRepository - 排程仓储
// ==========================================
pub struct ProductionScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionScheduleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductionSchedule> {
        Ok(ProductionSchedule {
            schedule_id: row.get(0)?,
            order_id: row.get(1)?,
            line_id: row.get(2)?,
            stage: Stage::from_str(&row.get::<_, String>(3)?),
            status: WorkflowStatus::from_str(&row.get::<_, String>(4)?),
            priority: Priority::from_str(&row.get::<_, String>(5)?),
            planned_start: row.get::<_, DateTime<Utc>>(6)?,
            planned_end: row.get::<_, DateTime<Utc>>(7)?,
            actual_start: row.get(8)?,
            actual_end: row.get(9)?,
            planned_quantity: row.get(10)?,
            completed_quantity: row.get(11)?,
            rejected_quantity: row.get(12)?,
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        schedule_id, order_id, line_id, stage, status, priority,
        planned_start, planned_end, actual_start, actual_end,
        planned_quantity, completed_quantity, rejected_quantity
    "#;

    /// 按 ID 查询排程
    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<ProductionSchedule>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_schedule WHERE schedule_id = ?1",
            Self::SELECT_COLUMNS
        );
        let schedule = conn
            .query_row(&sql, params![schedule_id], Self::row_to_schedule)
            .optional()?;
        Ok(schedule)
    }

    /// 按 ID 列表查询排程（保持入参顺序无关的稳定排序）
    pub fn find_by_ids(&self, schedule_ids: &[String]) -> RepositoryResult<Vec<ProductionSchedule>> {
        if schedule_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let placeholders = schedule_ids
            .iter()
            .enumerate()
            .map(|(i, _)| format!("?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM production_schedule WHERE schedule_id IN ({}) ORDER BY schedule_id",
            Self::SELECT_COLUMNS,
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(rusqlite::params_from_iter(schedule_ids.iter()), Self::row_to_schedule)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 查询某日排程（可按产线/工人过滤）
    ///
    /// 工人过滤经 worker_assignment 关联
    pub fn list_for_date(
        &self,
        date: NaiveDate,
        line_id: Option<&str>,
        worker_id: Option<&str>,
    ) -> RepositoryResult<Vec<ProductionSchedule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT
                ps.schedule_id, ps.order_id, ps.line_id, ps.stage, ps.status, ps.priority,
                ps.planned_start, ps.planned_end, ps.actual_start, ps.actual_end,
                ps.planned_quantity, ps.completed_quantity, ps.rejected_quantity
            FROM production_schedule ps
            LEFT JOIN worker_assignment wa ON wa.schedule_id = ps.schedule_id
            WHERE date(ps.planned_start) = ?1
              AND (?2 IS NULL OR ps.line_id = ?2)
              AND (?3 IS NULL OR wa.worker_id = ?3)
            ORDER BY ps.schedule_id
            "#,
        )?;
        let list = stmt
            .query_map(params![date, line_id, worker_id], Self::row_to_schedule)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 插入排程
    pub fn insert(&self, s: &ProductionSchedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_schedule (
                schedule_id, order_id, line_id, stage, status, priority,
                planned_start, planned_end, actual_start, actual_end,
                planned_quantity, completed_quantity, rejected_quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                s.schedule_id,
                s.order_id,
                s.line_id,
                s.stage.to_string(),
                s.status.to_string(),
                s.priority.to_string(),
                s.planned_start,
                s.planned_end,
                s.actual_start,
                s.actual_end,
                s.planned_quantity,
                s.completed_quantity,
                s.rejected_quantity,
            ],
        )?;
        Ok(())
    }

    /// 更新排程实际窗口与状态
    pub fn update_progress(
        &self,
        schedule_id: &str,
        status: WorkflowStatus,
        actual_start: Option<DateTime<Utc>>,
        actual_end: Option<DateTime<Utc>>,
        completed_quantity: i64,
        rejected_quantity: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE production_schedule
            SET status = ?2, actual_start = ?3, actual_end = ?4,
                completed_quantity = ?5, rejected_quantity = ?6
            WHERE schedule_id = ?1
            "#,
            params![
                schedule_id,
                status.to_string(),
                actual_start,
                actual_end,
                completed_quantity,
                rejected_quantity,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionSchedule".to_string(),
                id: schedule_id.to_string(),
            });
        }
        Ok(())
    }
}
