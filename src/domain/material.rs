// ==========================================
// 服装生产运营平台 - 物料领域模型
// ==========================================
// 用途: MRP 需求净额计算、库存推演、采购申请
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Priority, RecommendedAction, SupplyStatus, TransactionType};

// ==========================================
// MaterialInventory - 物料库存主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialInventory {
    pub material_id: String,
    pub material_name: String,
    pub unit: String,              // 计量单位 (m / kg / pcs)
    pub current_stock: f64,        // 当前库存
    pub minimum_stock: f64,        // 最低库存
    pub reorder_point: f64,        // 再订货点
    pub supplier: Option<String>,  // 首选供应商
}

// ==========================================
// MaterialDemand - 物料需求
// ==========================================
// 由订单物料需求行派生，不单独持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDemand {
    pub material_id: String,
    pub material_name: String,
    pub order_id: String,
    pub required_quantity: f64,
    pub required_date: NaiveDate, // 取订单交期
    pub unit: String,
    pub priority: Priority,
}

// ==========================================
// SupplyPlan - 计划收货
// ==========================================
// 由采购申请/采购单产生的计划入库记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyPlan {
    pub material_id: String,
    pub planned_quantity: f64,
    pub planned_date: NaiveDate,
    pub lead_time_days: i64,
    pub cost: f64,
    pub status: SupplyStatus,
}

// ==========================================
// MaterialTransaction - 物料事务
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialTransaction {
    pub transaction_id: String,
    pub material_id: String,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub unit_cost: Option<f64>,
    pub reference_type: Option<String>, // PURCHASE_ORDER / PURCHASE_REQUISITION / PRODUCTION
    pub reference_id: Option<String>,
    pub planned_date: Option<NaiveDate>, // 计划收货日（IN 事务）
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// MrpResult - 单物料净额计算结果
// ==========================================
// 每次计划运行重新计算，属于报表而非持久化实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrpResult {
    pub material_id: String,
    pub material_name: String,

    // ===== 净额计算 =====
    pub current_stock: f64,
    pub total_demand: f64,
    pub planned_supply: f64,  // 所有匹配供应记录的真实求和
    pub projected_stock: f64, // current + supply - demand
    pub shortfall: f64,       // max(0, -projected)

    // ===== 建议 =====
    pub recommended_action: RecommendedAction,
    pub urgent_orders: Vec<String>, // 紧急需要此物料的订单
    pub recommendations: Vec<String>,
}

// ==========================================
// StockProjection - 单日库存推演
// ==========================================
// 不变式: ending = beginning + receipts - demands
//         下一日 beginning = 当日 ending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockProjection {
    pub date: NaiveDate,
    pub beginning_stock: f64,
    pub receipts: f64,
    pub demands: f64,
    pub ending_stock: f64,
    pub shortfall: f64,
    pub actions: Vec<String>,
}

impl StockProjection {
    /// 校验单日库存恒等式
    pub fn balances(&self) -> bool {
        (self.ending_stock - (self.beginning_stock + self.receipts - self.demands)).abs() < 1e-9
    }
}

// ==========================================
// 采购计划优化输出
// ==========================================

/// 合并采购单中的一行物料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedOrderLine {
    pub material_id: String,
    pub quantity: f64,
    pub estimated_cost: f64,
}

/// 按供应商合并后的采购单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedOrder {
    pub supplier: String,
    pub materials: Vec<ConsolidatedOrderLine>,
    pub total_cost: f64,
    pub recommended_date: NaiveDate,
}

/// 合并采购的节省估算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSavings {
    pub consolidation_savings: f64,
    pub bulk_discount_savings: f64,
    pub total_savings: f64,
}

/// OptimizeMaterialPlan 的输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialPlanOptimization {
    pub consolidated_orders: Vec<ConsolidatedOrder>,
    pub savings: PlanSavings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_projection_balances() {
        let p = StockProjection {
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            beginning_stock: 100.0,
            receipts: 80.0,
            demands: 20.0,
            ending_stock: 160.0,
            shortfall: 0.0,
            actions: vec![],
        };
        assert!(p.balances());

        let broken = StockProjection { ending_stock: 150.0, ..p };
        assert!(!broken.balances());
    }
}
