// ==========================================
// 服装生产运营平台 - 订单领域模型
// ==========================================
// 用途: 需求来源（交期/件数）与工作流挂载点
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{OrderStatus, Priority};

// ==========================================
// OrderLineItem - 订单行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub line_item_id: String,
    pub order_id: String,
    pub description: Option<String>,
    pub quantity: i64,
}

// ==========================================
// Order - 订单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub order_number: Option<String>,
    pub client_name: Option<String>,
    pub status: OrderStatus,
    pub priority: Priority,
    pub delivery_date: Option<NaiveDate>,
    pub line_items: Vec<OrderLineItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// 订单总件数（各订单行数量求和）
    pub fn total_quantity(&self) -> i64 {
        self.line_items.iter().map(|li| li.quantity).sum()
    }
}
