// ==========================================
// 服装生产运营平台 - 引擎层错误类型
// ==========================================
// 职责: 业务规则错误，包装仓储层错误向上传递
// 说明: 技能不足/时间冲突等"可提供替代方案"的拒绝走类型化结果，
//       不走错误通道（调用方需要展示替代工人列表）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("资源未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据验证失败: {0}")]
    Validation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("批量报表超时: operation={operation}, budget_ms={budget_ms}")]
    Timeout { operation: String, budget_ms: u64 },

    #[error("并发指派冲突: {0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PlanningError {
    /// NotFound 便捷构造
    pub fn not_found(entity: &str, id: &str) -> Self {
        PlanningError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
