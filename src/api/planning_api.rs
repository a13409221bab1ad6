// ==========================================
// 服装生产运营平台 - MRP 服务接口
// ==========================================
// 职责: MRP 引擎的对外门面
//       - 每次调用开始时加载配置快照
//       - 数据存储边界有界重试
//       - 批量报表支持调用方超时预算
//       - 多物料库存推演并发展开后汇合
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use crate::api::error::ApiResult;
use crate::api::retry::with_upstream_retry;
use crate::api::validator;
use crate::config::ConfigManager;
use crate::domain::material::{MaterialPlanOptimization, MrpResult, StockProjection};
use crate::engine::deadline::Deadline;
use crate::engine::mrp::MaterialRequirementPlanner;
use crate::engine::repositories::PlanningRepositories;

// ==========================================
// PlanningApi - MRP 服务
// ==========================================
pub struct PlanningApi {
    conn: Arc<Mutex<Connection>>,
}

impl PlanningApi {
    /// 创建服务实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按当前配置快照构建 MRP 引擎
    fn build_planner(conn: &Arc<Mutex<Connection>>) -> ApiResult<MaterialRequirementPlanner> {
        let config = ConfigManager::from_connection(conn.clone()).load_snapshot()?;
        let repos = PlanningRepositories::from_connection(conn.clone());
        Ok(MaterialRequirementPlanner::new(repos, config))
    }

    /// 生成 MRP 计划
    ///
    /// # 参数
    /// - `order_id`: 仅计算单个订单; None 时计算全部开放订单
    /// - `timeout_ms`: 调用超时预算; 超时整体失败，不返回部分结果
    pub async fn generate_mrp_plan(
        &self,
        order_id: Option<String>,
        timeout_ms: Option<u64>,
    ) -> ApiResult<Vec<MrpResult>> {
        if let Some(id) = &order_id {
            validator::ensure_id("order_id", id)?;
        }
        let deadline = timeout_ms.map(|ms| Deadline::from_timeout(StdDuration::from_millis(ms)));
        let today = Utc::now().date_naive();
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let planner = Self::build_planner(&conn)?;
            Ok(planner.generate_mrp_plan(order_id.as_deref(), today, deadline.as_ref())?)
        })
        .await
    }

    /// 推演单物料库存水位
    pub async fn project_stock_levels(
        &self,
        material_id: String,
    ) -> ApiResult<Vec<StockProjection>> {
        validator::ensure_id("material_id", &material_id)?;
        let today = Utc::now().date_naive();
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let planner = Self::build_planner(&conn)?;
            Ok(planner.project_stock_levels(&material_id, today)?)
        })
        .await
    }

    /// 批量推演多物料库存水位（按物料并发展开后汇合）
    ///
    /// 各物料相互独立，任一失败则整体失败。
    /// 返回顺序与入参物料顺序一致。
    pub async fn project_stock_levels_batch(
        &self,
        material_ids: Vec<String>,
    ) -> ApiResult<Vec<Vec<StockProjection>>> {
        for id in &material_ids {
            validator::ensure_id("material_id", id)?;
        }
        let today = Utc::now().date_naive();

        let futures = material_ids.into_iter().map(|material_id| {
            let conn = self.conn.clone();
            with_upstream_retry(move || {
                let planner = Self::build_planner(&conn)?;
                Ok(planner.project_stock_levels(&material_id, today)?)
            })
        });

        futures::future::try_join_all(futures).await
    }

    /// 创建采购申请
    pub async fn create_purchase_requisition(
        &self,
        material_id: String,
        quantity: f64,
        required_date: NaiveDate,
        justification: String,
    ) -> ApiResult<String> {
        validator::ensure_id("material_id", &material_id)?;
        validator::ensure_positive("quantity", quantity)?;
        let now = Utc::now();
        validator::ensure_not_past("required_date", required_date, now.date_naive())?;
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let planner = Self::build_planner(&conn)?;
            Ok(planner.create_purchase_requisition(
                &material_id,
                quantity,
                required_date,
                &justification,
                now,
            )?)
        })
        .await
    }

    /// 优化采购计划（按供应商合并，估算节省）
    pub async fn optimize_material_plan(
        &self,
        results: Vec<MrpResult>,
    ) -> ApiResult<MaterialPlanOptimization> {
        let today = Utc::now().date_naive();
        let conn = self.conn.clone();

        with_upstream_retry(move || {
            let planner = Self::build_planner(&conn)?;
            Ok(planner.optimize_material_plan(&results, today)?)
        })
        .await
    }
}
