// ==========================================
// 服装生产运营平台 - 工人数据仓储
// ==========================================
// 职责: employee / worker_allocation / worker_assignment 数据访问
// 红线: Repository 不含业务逻辑
// 并发: 指派提交走"校验-提交"单事务，绝不静默重复占用工时
// ==========================================

use crate::domain::types::{ShiftType, SkillLevel};
use crate::domain::worker::{Employee, WorkerAllocation, WorkerAssignment};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 工时比较容差（小时）
const HOURS_EPSILON: f64 = 1e-9;

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 ID 查询员工
    pub fn find_by_id(&self, employee_id: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let emp = conn
            .query_row(
                "SELECT employee_id, name, base_salary, is_active FROM employee WHERE employee_id = ?1",
                params![employee_id],
                |row| {
                    Ok(Employee {
                        employee_id: row.get(0)?,
                        name: row.get(1)?,
                        base_salary: row.get(2)?,
                        is_active: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(emp)
    }

    /// 查询全部在职员工
    pub fn list_active(&self) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT employee_id, name, base_salary, is_active FROM employee
             WHERE is_active = 1 ORDER BY employee_id",
        )?;
        let list = stmt
            .query_map([], |row| {
                Ok(Employee {
                    employee_id: row.get(0)?,
                    name: row.get(1)?,
                    base_salary: row.get(2)?,
                    is_active: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}

// ==========================================
// WorkerAllocationRepository - 工人排班仓储
// ==========================================
pub struct WorkerAllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerAllocationRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_allocation(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkerAllocation> {
        Ok(WorkerAllocation {
            allocation_id: row.get(0)?,
            worker_id: row.get(1)?,
            line_id: row.get(2)?,
            allocation_date: row.get(3)?,
            shift: ShiftType::from_str(&row.get::<_, String>(4)?),
            hours_allocated: row.get(5)?,
            skill_level: SkillLevel::from_str(&row.get::<_, String>(6)?),
            hourly_rate: row.get(7)?,
        })
    }

    /// 查询某工人在某日某班次的排班
    pub fn find_for(
        &self,
        worker_id: &str,
        date: NaiveDate,
        shift: ShiftType,
    ) -> RepositoryResult<Option<WorkerAllocation>> {
        let conn = self.get_conn()?;
        let alloc = conn
            .query_row(
                r#"
                SELECT allocation_id, worker_id, line_id, allocation_date, shift,
                       hours_allocated, skill_level, hourly_rate
                FROM worker_allocation
                WHERE worker_id = ?1 AND allocation_date = ?2 AND shift = ?3
                "#,
                params![worker_id, date, shift.to_string()],
                Self::row_to_allocation,
            )
            .optional()?;
        Ok(alloc)
    }

    /// 查询某日某班次的全部排班（可按产线过滤）
    pub fn list_for_date_shift(
        &self,
        date: NaiveDate,
        shift: ShiftType,
        line_id: Option<&str>,
    ) -> RepositoryResult<Vec<WorkerAllocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT allocation_id, worker_id, line_id, allocation_date, shift,
                   hours_allocated, skill_level, hourly_rate
            FROM worker_allocation
            WHERE allocation_date = ?1 AND shift = ?2
              AND (?3 IS NULL OR line_id = ?3)
            ORDER BY worker_id
            "#,
        )?;
        let list = stmt
            .query_map(params![date, shift.to_string(), line_id], Self::row_to_allocation)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 插入排班（测试与排班导入用）
    pub fn insert(&self, alloc: &WorkerAllocation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO worker_allocation (
                allocation_id, worker_id, line_id, allocation_date, shift,
                hours_allocated, skill_level, hourly_rate
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                alloc.allocation_id,
                alloc.worker_id,
                alloc.line_id,
                alloc.allocation_date,
                alloc.shift.to_string(),
                alloc.hours_allocated,
                alloc.skill_level.to_string(),
                alloc.hourly_rate,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// WorkerAssignmentRepository - 工人指派仓储
// ==========================================
pub struct WorkerAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerAssignmentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 统计某工人在某日某班次已提交的指派工时
    pub fn sum_assigned_hours(
        &self,
        worker_id: &str,
        date: NaiveDate,
        shift: ShiftType,
    ) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(assigned_hours), 0)
            FROM worker_assignment
            WHERE worker_id = ?1 AND assigned_date = ?2 AND shift = ?3
            "#,
            params![worker_id, date, shift.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 统计某产线某日某班次已指派工时（经排程关联产线）
    pub fn sum_assigned_hours_for_line(
        &self,
        line_id: &str,
        date: NaiveDate,
        shift: ShiftType,
    ) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(wa.assigned_hours), 0)
            FROM worker_assignment wa
            JOIN production_schedule ps ON ps.schedule_id = wa.schedule_id
            WHERE ps.line_id = ?1 AND wa.assigned_date = ?2 AND wa.shift = ?3
            "#,
            params![line_id, date, shift.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 校验-提交式插入指派（单事务，串行化防止重复占用）
    ///
    /// 在写事务内重新校验 (worker, date, shift) 的已占用工时，
    /// 超出排班工时立即失败，调用方可刷新数据后重试一次。
    ///
    /// # 参数
    /// - `assignment`: 待提交指派
    /// - `hours_allocated`: 该工人该班次的排班工时上限
    pub fn insert_checked(
        &self,
        assignment: &WorkerAssignment,
        hours_allocated: f64,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        // IMMEDIATE 事务先取写锁，校验与插入之间不存在写入窗口
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let committed: f64 = tx.query_row(
            r#"
            SELECT COALESCE(SUM(assigned_hours), 0)
            FROM worker_assignment
            WHERE worker_id = ?1 AND assigned_date = ?2 AND shift = ?3
            "#,
            params![
                assignment.worker_id,
                assignment.assigned_date,
                assignment.shift.to_string()
            ],
            |row| row.get(0),
        )?;

        if committed + assignment.assigned_hours > hours_allocated + HOURS_EPSILON {
            return Err(RepositoryError::AssignmentConflict {
                worker_id: assignment.worker_id.clone(),
                date: assignment.assigned_date.to_string(),
                message: format!(
                    "已占用 {:.1}h + 新增 {:.1}h 超出排班 {:.1}h",
                    committed, assignment.assigned_hours, hours_allocated
                ),
            });
        }

        tx.execute(
            r#"
            INSERT INTO worker_assignment (
                assignment_id, worker_id, schedule_id, station_id,
                assigned_date, shift, assigned_hours, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                assignment.assignment_id,
                assignment.worker_id,
                assignment.schedule_id,
                assignment.station_id,
                assignment.assigned_date,
                assignment.shift.to_string(),
                assignment.assigned_hours,
                assignment.created_at,
            ],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 查询某工人某日的全部指派
    pub fn list_for_worker_date(
        &self,
        worker_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<WorkerAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT assignment_id, worker_id, schedule_id, station_id,
                   assigned_date, shift, assigned_hours, created_at
            FROM worker_assignment
            WHERE worker_id = ?1 AND assigned_date = ?2
            ORDER BY created_at
            "#,
        )?;
        let list = stmt
            .query_map(params![worker_id, date], |row| {
                Ok(WorkerAssignment {
                    assignment_id: row.get(0)?,
                    worker_id: row.get(1)?,
                    schedule_id: row.get(2)?,
                    station_id: row.get(3)?,
                    assigned_date: row.get(4)?,
                    shift: ShiftType::from_str(&row.get::<_, String>(5)?),
                    assigned_hours: row.get(6)?,
                    created_at: row.get::<_, DateTime<Utc>>(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}
