// ==========================================
// 服装生产运营平台 - 数据存储边界重试
// ==========================================
// 职责: 仅在数据存储边界对"上游不可用"类错误做有界退避重试
// 规则: 最多 3 次尝试，重试耗尽即快速失败，绝不返回部分/错误计划
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};

/// 最大尝试次数
const MAX_ATTEMPTS: u32 = 3;

/// 退避基准时长
const BACKOFF_BASE: Duration = Duration::from_millis(50);

/// 在阻塞线程执行数据存储操作，上游不可用时有界退避重试
///
/// 其余错误不重试，立即返回。
pub(crate) async fn with_upstream_retry<T, F>(op: F) -> ApiResult<T>
where
    F: Fn() -> ApiResult<T> + Send + Sync + 'static,
    T: Send + 'static,
{
    let op = Arc::new(op);

    for attempt in 0..MAX_ATTEMPTS {
        let op_clone = op.clone();
        let result = tokio::task::spawn_blocking(move || (*op_clone)())
            .await
            .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?;

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_upstream_unavailable() && attempt + 1 < MAX_ATTEMPTS => {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt);
                tracing::warn!(attempt, backoff_ms = backoff.as_millis() as u64, "上游不可用，退避重试: {}", e);
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("重试循环必然在最后一次尝试时返回")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_passes_through() {
        let result = with_upstream_retry(|| Ok(42)).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_retries_upstream_unavailable_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_upstream_retry(move || {
            if calls_clone.fetch_add(1, Ordering::SeqCst) < 1 {
                Err(ApiError::UpstreamUnavailable("database is locked".to_string()))
            } else {
                Ok("ok")
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: ApiResult<()> = with_upstream_retry(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::UpstreamUnavailable("database is locked".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ApiError::UpstreamUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_non_retryable_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: ApiResult<()> = with_upstream_retry(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::ValidationError("bad input".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
