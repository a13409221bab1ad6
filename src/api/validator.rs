// ==========================================
// 服装生产运营平台 - API层输入校验
// ==========================================
// 职责: 在边界完成必填/取值校验，业务逻辑内部不再散布默认值回退
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::engine::scheduler::OptimizationGoals;

/// 校验数值为正
pub fn ensure_positive(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::ValidationError(format!(
            "字段 {} 必须为正数 (当前 {})",
            field, value
        )));
    }
    Ok(())
}

/// 校验数值非负
pub fn ensure_non_negative(field: &str, value: f64) -> ApiResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::ValidationError(format!(
            "字段 {} 不允许为负 (当前 {})",
            field, value
        )));
    }
    Ok(())
}

/// 校验日期不早于基准日
pub fn ensure_not_past(field: &str, date: NaiveDate, today: NaiveDate) -> ApiResult<()> {
    if date < today {
        return Err(ApiError::ValidationError(format!(
            "字段 {} 不允许早于今天 ({} < {})",
            field, date, today
        )));
    }
    Ok(())
}

/// 校验非空 ID
pub fn ensure_id(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!("字段 {} 不允许为空", field)));
    }
    Ok(())
}

/// 校验优化目标权重（非负、归一化）
pub fn ensure_goals(goals: &OptimizationGoals) -> ApiResult<()> {
    goals.validate().map_err(ApiError::ValidationError)
}
