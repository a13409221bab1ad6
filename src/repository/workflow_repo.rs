// ==========================================
// 服装生产运营平台 - 工作流数据仓储
// ==========================================
// 职责: workflow_instance / workflow_step 数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::types::{Priority, SkillLevel, Stage, StepStatus, WorkflowStatus};
use crate::domain::workflow::{WorkflowInstance, WorkflowStep};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkflowRepository - 工作流仓储
// ==========================================
pub struct WorkflowRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkflowRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入工作流实例及其全部步骤（单事务）
    pub fn insert_workflow(
        &self,
        instance: &WorkflowInstance,
        steps: &[WorkflowStep],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO workflow_instance (
                workflow_id, order_id, status, priority, current_stage,
                total_steps, completed_steps, estimated_duration_hours,
                start_date, estimated_end_date, actual_end_date,
                pause_reason, metadata, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                instance.workflow_id,
                instance.order_id,
                instance.status.to_string(),
                instance.priority.to_string(),
                instance.current_stage.to_string(),
                instance.total_steps as i64,
                instance.completed_steps as i64,
                instance.estimated_duration_hours,
                instance.start_date,
                instance.estimated_end_date,
                instance.actual_end_date,
                instance.pause_reason,
                instance.metadata.to_string(),
                instance.created_at,
                instance.updated_at,
            ],
        )?;

        for step in steps {
            let deps = serde_json::to_string(&step.dependencies)
                .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
            tx.execute(
                r#"
                INSERT INTO workflow_step (
                    step_id, workflow_id, stage, step_name, seq_no, dependencies,
                    required_skill, estimated_hours, status, assigned_worker,
                    planned_start, planned_end, actual_start, actual_end,
                    quality_score, notes
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
                params![
                    step.step_id,
                    step.workflow_id,
                    step.stage.to_string(),
                    step.step_name,
                    step.seq_no,
                    deps,
                    step.required_skill.to_string(),
                    step.estimated_hours,
                    step.status.to_string(),
                    step.assigned_worker,
                    step.planned_start,
                    step.planned_end,
                    step.actual_start,
                    step.actual_end,
                    step.quality_score,
                    step.notes,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按 ID 查询工作流实例
    pub fn find_instance(&self, workflow_id: &str) -> RepositoryResult<Option<WorkflowInstance>> {
        let conn = self.get_conn()?;
        let instance = conn
            .query_row(
                r#"
                SELECT workflow_id, order_id, status, priority, current_stage,
                       total_steps, completed_steps, estimated_duration_hours,
                       start_date, estimated_end_date, actual_end_date,
                       pause_reason, metadata, created_at, updated_at
                FROM workflow_instance
                WHERE workflow_id = ?1
                "#,
                params![workflow_id],
                |row| {
                    let metadata_raw: Option<String> = row.get(12)?;
                    Ok(WorkflowInstance {
                        workflow_id: row.get(0)?,
                        order_id: row.get(1)?,
                        status: WorkflowStatus::from_str(&row.get::<_, String>(2)?),
                        priority: Priority::from_str(&row.get::<_, String>(3)?),
                        current_stage: Stage::from_str(&row.get::<_, String>(4)?),
                        total_steps: row.get::<_, i64>(5)? as usize,
                        completed_steps: row.get::<_, i64>(6)? as usize,
                        estimated_duration_hours: row.get(7)?,
                        start_date: row.get::<_, DateTime<Utc>>(8)?,
                        estimated_end_date: row.get::<_, DateTime<Utc>>(9)?,
                        actual_end_date: row.get(10)?,
                        pause_reason: row.get(11)?,
                        metadata: metadata_raw
                            .and_then(|s| serde_json::from_str(&s).ok())
                            .unwrap_or(serde_json::Value::Null),
                        created_at: row.get::<_, DateTime<Utc>>(13)?,
                        updated_at: row.get::<_, DateTime<Utc>>(14)?,
                    })
                },
            )
            .optional()?;
        Ok(instance)
    }

    /// 更新工作流实例进度与状态
    pub fn update_instance(&self, instance: &WorkflowInstance) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE workflow_instance
            SET status = ?2, current_stage = ?3, completed_steps = ?4,
                actual_end_date = ?5, pause_reason = ?6, updated_at = ?7
            WHERE workflow_id = ?1
            "#,
            params![
                instance.workflow_id,
                instance.status.to_string(),
                instance.current_stage.to_string(),
                instance.completed_steps as i64,
                instance.actual_end_date,
                instance.pause_reason,
                instance.updated_at,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkflowInstance".to_string(),
                id: instance.workflow_id.clone(),
            });
        }
        Ok(())
    }

    fn row_to_step(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkflowStep> {
        let deps_raw: String = row.get(5)?;
        Ok(WorkflowStep {
            step_id: row.get(0)?,
            workflow_id: row.get(1)?,
            stage: Stage::from_str(&row.get::<_, String>(2)?),
            step_name: row.get(3)?,
            seq_no: row.get(4)?,
            dependencies: serde_json::from_str(&deps_raw).unwrap_or_default(),
            required_skill: SkillLevel::from_str(&row.get::<_, String>(6)?),
            estimated_hours: row.get(7)?,
            status: StepStatus::from_str(&row.get::<_, String>(8)?),
            assigned_worker: row.get(9)?,
            planned_start: row.get::<_, DateTime<Utc>>(10)?,
            planned_end: row.get::<_, DateTime<Utc>>(11)?,
            actual_start: row.get(12)?,
            actual_end: row.get(13)?,
            quality_score: row.get(14)?,
            notes: row.get(15)?,
        })
    }

    const STEP_COLUMNS: &'static str = r#"
        step_id, workflow_id, stage, step_name, seq_no, dependencies,
        required_skill, estimated_hours, status, assigned_worker,
        planned_start, planned_end, actual_start, actual_end,
        quality_score, notes
    "#;

    /// 按 ID 查询步骤
    pub fn find_step(&self, step_id: &str) -> RepositoryResult<Option<WorkflowStep>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM workflow_step WHERE step_id = ?1",
            Self::STEP_COLUMNS
        );
        let step = conn
            .query_row(&sql, params![step_id], Self::row_to_step)
            .optional()?;
        Ok(step)
    }

    /// 查询工作流全部步骤（按序号）
    pub fn list_steps(&self, workflow_id: &str) -> RepositoryResult<Vec<WorkflowStep>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM workflow_step WHERE workflow_id = ?1 ORDER BY seq_no",
            Self::STEP_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let steps = stmt
            .query_map(params![workflow_id], Self::row_to_step)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(steps)
    }

    /// 统计某日完成步骤的平均质检评分（无样本返回 None）
    pub fn avg_quality_score_for_date(
        &self,
        date: chrono::NaiveDate,
    ) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let avg: Option<f64> = conn.query_row(
            r#"
            SELECT AVG(quality_score)
            FROM workflow_step
            WHERE quality_score IS NOT NULL
              AND actual_end IS NOT NULL
              AND date(actual_end) = ?1
            "#,
            params![date],
            |row| row.get(0),
        )?;
        Ok(avg)
    }

    /// 更新步骤可变字段
    pub fn update_step(&self, step: &WorkflowStep) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE workflow_step
            SET status = ?2, assigned_worker = ?3, actual_start = ?4,
                actual_end = ?5, quality_score = ?6, notes = ?7
            WHERE step_id = ?1
            "#,
            params![
                step.step_id,
                step.status.to_string(),
                step.assigned_worker,
                step.actual_start,
                step.actual_end,
                step.quality_score,
                step.notes,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkflowStep".to_string(),
                id: step.step_id.clone(),
            });
        }
        Ok(())
    }
}
