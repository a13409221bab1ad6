// ==========================================
// 服装生产运营平台 - 物料数据仓储
// ==========================================
// 职责: material_inventory / material_requirement / material_transaction 数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::material::{MaterialDemand, MaterialInventory, MaterialTransaction, SupplyPlan};
use crate::domain::types::{Priority, SupplyStatus, TransactionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// MaterialInventoryRepository - 物料库存仓储
// ==========================================
pub struct MaterialInventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialInventoryRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_inventory(row: &rusqlite::Row<'_>) -> rusqlite::Result<MaterialInventory> {
        Ok(MaterialInventory {
            material_id: row.get(0)?,
            material_name: row.get(1)?,
            unit: row.get(2)?,
            current_stock: row.get(3)?,
            minimum_stock: row.get(4)?,
            reorder_point: row.get(5)?,
            supplier: row.get(6)?,
        })
    }

    /// 按 ID 查询物料
    pub fn find_by_id(&self, material_id: &str) -> RepositoryResult<Option<MaterialInventory>> {
        let conn = self.get_conn()?;
        let inv = conn
            .query_row(
                r#"
                SELECT material_id, material_name, unit, current_stock,
                       minimum_stock, reorder_point, supplier
                FROM material_inventory
                WHERE material_id = ?1
                "#,
                params![material_id],
                Self::row_to_inventory,
            )
            .optional()?;
        Ok(inv)
    }

    /// 查询全部物料
    pub fn list_all(&self) -> RepositoryResult<Vec<MaterialInventory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, material_name, unit, current_stock,
                   minimum_stock, reorder_point, supplier
            FROM material_inventory
            ORDER BY material_id
            "#,
        )?;
        let list = stmt
            .query_map([], Self::row_to_inventory)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 查询物料需求（关联开放订单取交期与优先级）
    ///
    /// # 参数
    /// - `order_id`: 仅查询单个订单的需求; None 时查询全部开放订单
    /// - `material_id`: 仅查询单个物料的需求; None 时不限物料
    /// - `fallback_required_date`: 订单无交期时使用的需求日期
    pub fn list_demands(
        &self,
        order_id: Option<&str>,
        material_id: Option<&str>,
        fallback_required_date: NaiveDate,
    ) -> RepositoryResult<Vec<MaterialDemand>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT mr.material_id,
                   COALESCE(mi.material_name, mr.material_id),
                   mr.order_id,
                   mr.required_quantity,
                   o.delivery_date,
                   COALESCE(mi.unit, 'pcs'),
                   o.priority
            FROM material_requirement mr
            JOIN orders o ON o.order_id = mr.order_id
            LEFT JOIN material_inventory mi ON mi.material_id = mr.material_id
            WHERE o.status IN ('OPEN', 'IN_PRODUCTION')
              AND (?1 IS NULL OR mr.order_id = ?1)
              AND (?2 IS NULL OR mr.material_id = ?2)
            ORDER BY mr.material_id, mr.order_id
            "#,
        )?;

        let demands = stmt
            .query_map(params![order_id, material_id], |row| {
                Ok(MaterialDemand {
                    material_id: row.get(0)?,
                    material_name: row.get(1)?,
                    order_id: row.get(2)?,
                    required_quantity: row.get(3)?,
                    required_date: row
                        .get::<_, Option<NaiveDate>>(4)?
                        .unwrap_or(fallback_required_date),
                    unit: row.get(5)?,
                    priority: Priority::from_str(&row.get::<_, String>(6)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(demands)
    }
}

// ==========================================
// MaterialTransactionRepository - 物料事务仓储
// ==========================================
pub struct MaterialTransactionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialTransactionRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入物料事务
    pub fn insert(&self, tx: &MaterialTransaction) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO material_transaction (
                transaction_id, material_id, transaction_type, quantity, unit_cost,
                reference_type, reference_id, planned_date, notes, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                tx.transaction_id,
                tx.material_id,
                tx.transaction_type.to_string(),
                tx.quantity,
                tx.unit_cost,
                tx.reference_type,
                tx.reference_id,
                tx.planned_date,
                tx.notes,
                tx.created_by,
                tx.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询计划收货（未来的采购入库事务）
    ///
    /// # 参数
    /// - `material_id`: 仅查询单个物料; None 时查询全部
    /// - `from_date`: 计划收货日下界（含）
    pub fn list_planned_receipts(
        &self,
        material_id: Option<&str>,
        from_date: NaiveDate,
    ) -> RepositoryResult<Vec<SupplyPlan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT material_id, quantity, planned_date, unit_cost
            FROM material_transaction
            WHERE transaction_type = 'IN'
              AND reference_type IN ('PURCHASE_ORDER', 'PURCHASE_REQUISITION')
              AND planned_date IS NOT NULL
              AND planned_date >= ?1
              AND (?2 IS NULL OR material_id = ?2)
            ORDER BY material_id, planned_date
            "#,
        )?;

        let supplies = stmt
            .query_map(params![from_date, material_id], |row| {
                Ok(SupplyPlan {
                    material_id: row.get(0)?,
                    planned_quantity: row.get(1)?,
                    planned_date: row.get(2)?,
                    lead_time_days: 0,
                    cost: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    status: SupplyStatus::Planned,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(supplies)
    }

    /// 查询物料最近一次入库单价（用于采购成本估算）
    pub fn latest_in_unit_cost(&self, material_id: &str) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let cost = conn
            .query_row(
                r#"
                SELECT unit_cost
                FROM material_transaction
                WHERE material_id = ?1
                  AND transaction_type = 'IN'
                  AND unit_cost IS NOT NULL
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                params![material_id],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?
            .flatten();
        Ok(cost)
    }

    /// 统计某日领料成本（OUT 事务 quantity × unit_cost 求和）
    pub fn sum_out_cost_for_date(&self, date: NaiveDate) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(quantity * COALESCE(unit_cost, 0)), 0)
            FROM material_transaction
            WHERE transaction_type = 'OUT'
              AND date(created_at) = ?1
            "#,
            params![date],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 按引用 ID 查询事务（测试与审计用）
    pub fn find_by_reference(
        &self,
        reference_id: &str,
    ) -> RepositoryResult<Option<MaterialTransaction>> {
        let conn = self.get_conn()?;
        let tx = conn
            .query_row(
                r#"
                SELECT transaction_id, material_id, transaction_type, quantity, unit_cost,
                       reference_type, reference_id, planned_date, notes, created_by, created_at
                FROM material_transaction
                WHERE reference_id = ?1
                "#,
                params![reference_id],
                |row| {
                    Ok(MaterialTransaction {
                        transaction_id: row.get(0)?,
                        material_id: row.get(1)?,
                        transaction_type: TransactionType::from_str(&row.get::<_, String>(2)?),
                        quantity: row.get(3)?,
                        unit_cost: row.get(4)?,
                        reference_type: row.get(5)?,
                        reference_id: row.get(6)?,
                        planned_date: row.get(7)?,
                        notes: row.get(8)?,
                        created_by: row.get(9)?,
                        created_at: row.get::<_, DateTime<Utc>>(10)?,
                    })
                },
            )
            .optional()?;
        Ok(tx)
    }
}
