// ==========================================
// 服装生产运营平台 - 物料需求计划引擎 (MRP)
// ==========================================
// 职责: 需求净额计算、库存推演、采购申请、供应商合并优化
// 输入: 开放订单物料需求 + 当前库存 + 计划收货
// 输出: MrpResult 报表 / StockProjection 序列 / 采购申请
// 规则: 计划供应量为全部匹配供应记录的真实求和
// ==========================================

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::domain::material::{
    ConsolidatedOrder, ConsolidatedOrderLine, MaterialDemand, MaterialInventory,
    MaterialPlanOptimization, MaterialTransaction, MrpResult, PlanSavings, StockProjection,
    SupplyPlan,
};
use crate::domain::types::{Priority, RecommendedAction, TransactionType};
use crate::engine::deadline::Deadline;
use crate::engine::error::{PlanningError, PlanningResult};
use crate::engine::repositories::PlanningRepositories;

/// 无历史入库单价时的成本估算 (₱/单位)
const FALLBACK_UNIT_COST: f64 = 10.0;

/// 无供应商主数据时的合并分组名
const DEFAULT_SUPPLIER: &str = "Default Supplier";

// ==========================================
// MaterialRequirementPlanner - MRP 引擎
// ==========================================
pub struct MaterialRequirementPlanner {
    repos: PlanningRepositories,
    config: PlanningConfig,
}

impl MaterialRequirementPlanner {
    /// 构造函数
    ///
    /// # 参数
    /// - `repos`: 仓储集合
    /// - `config`: 调用开始时加载的配置快照
    pub fn new(repos: PlanningRepositories, config: PlanningConfig) -> Self {
        Self { repos, config }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成 MRP 计划
    ///
    /// 汇总开放订单（或单个订单）的物料需求，按物料净额计算并分类。
    /// 排序规则: 有缺口的物料在前，缺口降序，再按物料 ID 升序（幂等）。
    ///
    /// # 参数
    /// - `order_id`: 仅计算单个订单; None 时计算全部开放订单
    /// - `today`: 计划基准日
    /// - `deadline`: 调用截止时间; 超时则整体失败，不返回部分结果
    #[instrument(skip(self, deadline, order_id), fields(scope = order_id.unwrap_or("ALL")))]
    pub fn generate_mrp_plan(
        &self,
        order_id: Option<&str>,
        today: NaiveDate,
        deadline: Option<&Deadline>,
    ) -> PlanningResult<Vec<MrpResult>> {
        // 订单无交期时的需求日期回退值
        let fallback_date = today + Duration::days(self.config.horizon_days);

        let demands = self
            .repos
            .inventory_repo
            .list_demands(order_id, None, fallback_date)?;
        let inventory = self.repos.inventory_repo.list_all()?;
        let supplies = self.repos.transaction_repo.list_planned_receipts(None, today)?;

        // 按物料分组（BTreeMap 保证遍历顺序稳定）
        let mut demands_by_material: BTreeMap<String, Vec<MaterialDemand>> = BTreeMap::new();
        for demand in demands {
            demands_by_material
                .entry(demand.material_id.clone())
                .or_default()
                .push(demand);
        }

        let mut results = Vec::with_capacity(demands_by_material.len());
        for (material_id, material_demands) in &demands_by_material {
            if let Some(d) = deadline {
                if d.expired() {
                    return Err(PlanningError::Timeout {
                        operation: "generate_mrp_plan".to_string(),
                        budget_ms: d.budget_ms(),
                    });
                }
            }

            let material_inventory = inventory.iter().find(|inv| &inv.material_id == material_id);
            let material_supplies: Vec<&SupplyPlan> = supplies
                .iter()
                .filter(|s| &s.material_id == material_id)
                .collect();

            results.push(Self::calculate_material_requirement(
                material_id,
                material_demands,
                material_inventory,
                &material_supplies,
                today,
                &self.config,
            ));
        }

        // 有缺口优先，缺口降序，物料 ID 升序兜底
        results.sort_by(|a, b| {
            let a_short = a.shortfall > 0.0;
            let b_short = b.shortfall > 0.0;
            b_short
                .cmp(&a_short)
                .then(b.shortfall.total_cmp(&a.shortfall))
                .then(a.material_id.cmp(&b.material_id))
        });

        Ok(results)
    }

    /// 推演单物料库存水位
    ///
    /// 从基准日起逐日推演计划窗口（默认 30 天）:
    ///   ending = beginning + receipts - demands, 次日 beginning = 当日 ending
    ///
    /// 当日缺口时附带"立即采购"动作，跌破最低库存/再订货点时附带标记。
    #[instrument(skip(self))]
    pub fn project_stock_levels(
        &self,
        material_id: &str,
        today: NaiveDate,
    ) -> PlanningResult<Vec<StockProjection>> {
        let inventory = self
            .repos
            .inventory_repo
            .find_by_id(material_id)?
            .ok_or_else(|| PlanningError::not_found("MaterialInventory", material_id))?;

        let fallback_date = today + Duration::days(self.config.horizon_days);
        let demands = self
            .repos
            .inventory_repo
            .list_demands(None, Some(material_id), fallback_date)?;
        let supplies = self
            .repos
            .transaction_repo
            .list_planned_receipts(Some(material_id), today)?;

        let mut projections = Vec::with_capacity(self.config.horizon_days as usize + 1);
        let mut running_stock = inventory.current_stock;

        for offset in 0..=self.config.horizon_days {
            let date = today + Duration::days(offset);

            let day_demand: f64 = demands
                .iter()
                .filter(|d| d.required_date == date)
                .map(|d| d.required_quantity)
                .sum();
            let day_receipts: f64 = supplies
                .iter()
                .filter(|s| s.planned_date == date)
                .map(|s| s.planned_quantity)
                .sum();

            let beginning_stock = running_stock;
            let ending_stock = beginning_stock + day_receipts - day_demand;
            let shortfall = (day_demand - (beginning_stock + day_receipts)).max(0.0);

            let mut actions = Vec::new();
            if shortfall > 0.0 {
                actions.push(format!("立即采购 {} {}", shortfall, inventory.unit));
            }
            if ending_stock < inventory.minimum_stock {
                actions.push("低于最低库存".to_string());
            }
            if ending_stock < inventory.reorder_point {
                actions.push("已达再订货点".to_string());
            }

            projections.push(StockProjection {
                date,
                beginning_stock,
                receipts: day_receipts,
                demands: day_demand,
                ending_stock,
                shortfall,
                actions,
            });

            running_stock = ending_stock;
        }

        Ok(projections)
    }

    /// 创建采购申请
    ///
    /// 按提前期倒推下单日，向数据存储写入计划收货事务。
    ///
    /// # 参数
    /// - `material_id`: 物料 ID（不存在则 NotFound）
    /// - `quantity`: 采购数量
    /// - `required_date`: 需求日期（即计划收货日）
    /// - `justification`: 申请理由
    /// - `now`: 当前时刻
    ///
    /// # 返回
    /// 采购申请单号 (PR-*)
    #[instrument(skip(self, justification))]
    pub fn create_purchase_requisition(
        &self,
        material_id: &str,
        quantity: f64,
        required_date: NaiveDate,
        justification: &str,
        now: DateTime<Utc>,
    ) -> PlanningResult<String> {
        if quantity <= 0.0 {
            return Err(PlanningError::Validation(format!(
                "采购数量必须为正数: {}",
                quantity
            )));
        }

        let material = self
            .repos
            .inventory_repo
            .find_by_id(material_id)?
            .ok_or_else(|| PlanningError::not_found("MaterialInventory", material_id))?;

        let lead_time_days = self.config.default_lead_time_days;
        let order_date = required_date - Duration::days(lead_time_days);
        let requisition_id = format!("PR-{}", Uuid::new_v4());

        self.repos.transaction_repo.insert(&MaterialTransaction {
            transaction_id: Uuid::new_v4().to_string(),
            material_id: material.material_id.clone(),
            transaction_type: TransactionType::In,
            quantity,
            unit_cost: None,
            reference_type: Some("PURCHASE_REQUISITION".to_string()),
            reference_id: Some(requisition_id.clone()),
            planned_date: Some(required_date),
            notes: Some(format!("MRP 自动生成: {} (建议下单日 {})", justification, order_date)),
            created_by: Some("system".to_string()),
            created_at: now,
        })?;

        tracing::info!(
            material_id,
            quantity,
            %required_date,
            %order_date,
            lead_time_days,
            "采购申请已创建: {}",
            requisition_id
        );

        Ok(requisition_id)
    }

    /// 优化采购计划
    ///
    /// 将有缺口的物料按首选供应商合并，估算合并节省与批量折扣。
    /// 同一输入集输出确定（供应商按名称稳定排序）。
    #[instrument(skip(self, results), fields(result_count = results.len()))]
    pub fn optimize_material_plan(
        &self,
        results: &[MrpResult],
        today: NaiveDate,
    ) -> PlanningResult<MaterialPlanOptimization> {
        // 按供应商分组（BTreeMap 保证稳定顺序）
        let mut by_supplier: BTreeMap<String, Vec<ConsolidatedOrderLine>> = BTreeMap::new();

        for result in results.iter().filter(|r| r.shortfall > 0.0) {
            let supplier = self
                .repos
                .inventory_repo
                .find_by_id(&result.material_id)?
                .and_then(|inv| inv.supplier)
                .unwrap_or_else(|| DEFAULT_SUPPLIER.to_string());

            let unit_cost = self
                .repos
                .transaction_repo
                .latest_in_unit_cost(&result.material_id)?
                .unwrap_or(FALLBACK_UNIT_COST);

            by_supplier.entry(supplier).or_default().push(ConsolidatedOrderLine {
                material_id: result.material_id.clone(),
                quantity: result.shortfall,
                estimated_cost: result.shortfall * unit_cost,
            });
        }

        let recommended_date = today + Duration::days(self.config.default_lead_time_days);
        let mut consolidated_orders = Vec::with_capacity(by_supplier.len());
        let mut bulk_discount_savings = 0.0;

        for (supplier, mut materials) in by_supplier {
            materials.sort_by(|a, b| a.material_id.cmp(&b.material_id));
            let total_cost: f64 = materials.iter().map(|m| m.estimated_cost).sum();

            if total_cost > self.config.bulk_discount_threshold {
                bulk_discount_savings += total_cost * self.config.bulk_discount_rate;
            }

            consolidated_orders.push(ConsolidatedOrder {
                supplier,
                materials,
                total_cost,
                recommended_date,
            });
        }

        let consolidation_savings =
            consolidated_orders.len() as f64 * self.config.consolidation_saving;

        Ok(MaterialPlanOptimization {
            consolidated_orders,
            savings: PlanSavings {
                consolidation_savings,
                bulk_discount_savings,
                total_savings: consolidation_savings + bulk_discount_savings,
            },
        })
    }

    // ==========================================
    // 净额计算（纯函数）
    // ==========================================

    /// 单物料需求净额计算
    ///
    /// 无库存记录的需求按 current_stock = 0 处理，不视为错误。
    fn calculate_material_requirement(
        material_id: &str,
        demands: &[MaterialDemand],
        inventory: Option<&MaterialInventory>,
        supplies: &[&SupplyPlan],
        today: NaiveDate,
        config: &PlanningConfig,
    ) -> MrpResult {
        let current_stock = inventory.map(|inv| inv.current_stock).unwrap_or(0.0);
        let minimum_stock = inventory.map(|inv| inv.minimum_stock).unwrap_or(0.0);
        let reorder_point = inventory.map(|inv| inv.reorder_point).unwrap_or(0.0);
        let unit = inventory.map(|inv| inv.unit.as_str()).unwrap_or("pcs");

        let total_demand: f64 = demands.iter().map(|d| d.required_quantity).sum();
        // 全部匹配供应记录的真实求和
        let planned_supply: f64 = supplies.iter().map(|s| s.planned_quantity).sum();
        let projected_stock = current_stock + planned_supply - total_demand;
        let shortfall = (-projected_stock).max(0.0);

        let recommended_action = if shortfall > 0.0 {
            RecommendedAction::OrderNow
        } else if projected_stock < minimum_stock {
            RecommendedAction::OrderSoon
        } else if projected_stock > current_stock * 2.0 {
            RecommendedAction::Excess
        } else {
            RecommendedAction::Adequate
        };

        // 紧急订单: 优先级 URGENT 或需求日落在紧急窗口内
        let mut urgent_orders: Vec<String> = demands
            .iter()
            .filter(|d| {
                d.priority == Priority::Urgent
                    || (d.required_date - today).num_days() < config.urgent_window_days
            })
            .map(|d| d.order_id.clone())
            .collect();
        urgent_orders.sort();
        urgent_orders.dedup();

        let mut recommendations = Vec::new();
        if shortfall > 0.0 {
            recommendations.push(format!("立即采购 {} {}", shortfall, unit));
        }
        if !urgent_orders.is_empty() {
            recommendations.push(format!("{} 个紧急订单需要此物料", urgent_orders.len()));
        }
        if projected_stock < reorder_point {
            recommendations.push("库存水位低于再订货点".to_string());
        }

        MrpResult {
            material_id: material_id.to_string(),
            material_name: inventory
                .map(|inv| inv.material_name.clone())
                .unwrap_or_else(|| material_id.to_string()),
            current_stock,
            total_demand,
            planned_supply,
            projected_stock,
            shortfall,
            recommended_action,
            urgent_orders,
            recommendations,
        }
    }
}
