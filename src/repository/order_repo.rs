// ==========================================
// 服装生产运营平台 - 订单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::order::{Order, OrderLineItem};
use crate::domain::types::{OrderStatus, Priority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 ID 查询订单（含订单行）
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;

        let head = conn
            .query_row(
                r#"
                SELECT order_id, order_number, client_name, status, priority,
                       delivery_date, created_at
                FROM orders
                WHERE order_id = ?1
                "#,
                params![order_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<chrono::NaiveDate>>(5)?,
                        row.get::<_, DateTime<Utc>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, number, client, status, priority, delivery, created_at)) = head else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT line_item_id, order_id, description, quantity
            FROM order_line_item
            WHERE order_id = ?1
            ORDER BY line_item_id
            "#,
        )?;
        let line_items = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderLineItem {
                    line_item_id: row.get(0)?,
                    order_id: row.get(1)?,
                    description: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<OrderLineItem>>>()?;

        Ok(Some(Order {
            order_id: id,
            order_number: number,
            client_name: client,
            status: OrderStatus::from_str(&status),
            priority: Priority::from_str(&priority),
            delivery_date: delivery,
            line_items,
            created_at,
        }))
    }

    /// 插入订单（含订单行，单事务）
    pub fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO orders (order_id, order_number, client_name, status, priority,
                                delivery_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                order.order_id,
                order.order_number,
                order.client_name,
                order.status.to_string(),
                order.priority.to_string(),
                order.delivery_date,
                order.created_at,
            ],
        )?;

        for li in &order.line_items {
            tx.execute(
                r#"
                INSERT INTO order_line_item (line_item_id, order_id, description, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![li.line_item_id, li.order_id, li.description, li.quantity],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
