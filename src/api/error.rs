// ==========================================
// 服装生产运营平台 - API层错误类型
// ==========================================
// 职责: 对外服务错误分类，转换引擎/仓储错误为用户可理解的错误
// 说明: 技能不足/时间冲突不在此处——它们作为类型化指派结果返回，
//       便于界面展示替代工人，不用异常做控制流
// ==========================================

use crate::engine::error::PlanningError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("并发冲突: {0}")]
    Conflict(String),

    #[error("调用超时: {0}")]
    Timeout(String),

    #[error("数据存储不可用: {0}")]
    UpstreamUnavailable(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为可重试的上游不可用错误
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, ApiError::UpstreamUnavailable(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::AssignmentConflict { worker_id, date, message } => {
                ApiError::Conflict(format!("worker={} date={}: {}", worker_id, date, message))
            }
            RepositoryError::DatabaseConnectionError(msg) | RepositoryError::LockError(msg) => {
                ApiError::UpstreamUnavailable(msg)
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::BusinessRuleViolation(msg) => ApiError::ValidationError(msg),
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::ValidationError(format!("无效的状态转换: from={} to={}", from, to))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 PlanningError 转换
// ==========================================
impl From<PlanningError> for ApiError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            PlanningError::Validation(msg) => ApiError::ValidationError(msg),
            PlanningError::InvalidStateTransition { from, to } => {
                ApiError::ValidationError(format!("无效的状态转换: from={} to={}", from, to))
            }
            PlanningError::Timeout { operation, budget_ms } => {
                ApiError::Timeout(format!("{} 超出预算 {}ms", operation, budget_ms))
            }
            PlanningError::Conflict(msg) => ApiError::Conflict(msg),
            PlanningError::Repository(repo_err) => repo_err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
