use std::sync::Arc;

use rotation_core::{traits::DealerRepository, RotationError, RotationResult};
use tracing::{debug, error, info, warn};

use crate::metrics::RotationMetrics;
use crate::retry::BackoffPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetMode {
    /// 仅当池已耗尽时重置
    IfExhausted,
    /// 无条件重置全部经销商
    Forced,
}

/// 轮询周期重置控制器
///
/// 所有经销商都被领取后开启新的周期。重置写入失败或写入后校验不通过时
/// 整体重试，超过 `max_attempts` 次后返回 [`RotationError::ResetFailed`]。
pub struct CycleResetController {
    dealer_repo: Arc<dyn DealerRepository>,
    backoff: BackoffPolicy,
    max_attempts: u32,
    metrics: RotationMetrics,
}

impl CycleResetController {
    pub fn new(
        dealer_repo: Arc<dyn DealerRepository>,
        backoff: BackoffPolicy,
        max_attempts: u32,
    ) -> Self {
        Self {
            dealer_repo,
            backoff,
            max_attempts: max_attempts.max(1),
            metrics: RotationMetrics::new(),
        }
    }

    /// 池耗尽时开启新周期，返回被重置的经销商数量
    ///
    /// 重复调用是安全的：另一个调用方已经完成重置时返回 0。
    pub async fn reset_cycle(&self) -> RotationResult<u64> {
        self.run(ResetMode::IfExhausted).await
    }

    /// 管理员手动重置，不检查当前是否耗尽
    pub async fn force_reset(&self) -> RotationResult<u64> {
        self.run(ResetMode::Forced).await
    }

    async fn run(&self, mode: ResetMode) -> RotationResult<u64> {
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts {
            match self.attempt(mode).await {
                Ok(Some(count)) => {
                    if count > 0 {
                        self.metrics.record_reset();
                        info!(
                            reset_count = count,
                            forced = mode == ResetMode::Forced,
                            "轮询周期已重置"
                        );
                    } else {
                        debug!("轮询周期无需重置，已由其他请求完成");
                    }
                    return Ok(count);
                }
                Ok(None) => {
                    last_failure = "重置后校验失败，经销商状态未更新".to_string();
                    warn!(attempt, "轮询周期重置后校验失败");
                }
                Err(e) => {
                    last_failure = e.to_string();
                    warn!(attempt, error = %e, "轮询周期重置写入失败");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff.delay_for(attempt)).await;
            }
        }

        error!(
            attempts = self.max_attempts,
            error = %last_failure,
            "轮询周期重置多次失败，需要人工介入"
        );
        Err(RotationError::ResetFailed {
            attempts: self.max_attempts,
            message: last_failure,
        })
    }

    /// 执行一次重置并校验结果，校验失败返回 `Ok(None)`
    async fn attempt(&self, mode: ResetMode) -> RotationResult<Option<u64>> {
        let count = match mode {
            ResetMode::IfExhausted => self.dealer_repo.reset_if_exhausted().await?,
            ResetMode::Forced => self.dealer_repo.reset_all_available().await?,
        };

        let dealers = self.dealer_repo.list_dealers().await?;
        if dealers.is_empty() {
            return Ok(Some(count));
        }

        let verified = match mode {
            ResetMode::IfExhausted => dealers.iter().any(|d| d.available),
            // 强制重置与并发领取交错时，只要本次写入的行数生效即可
            ResetMode::Forced => count > 0 || dealers.iter().all(|d| d.available),
        };

        Ok(verified.then_some(count))
    }
}
