use std::sync::Arc;

use rotation_core::{
    config::RotationConfig,
    models::{Dealer, RotationProgress},
    traits::DealerRepository,
    RotationError, RotationResult,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::cycle_reset::CycleResetController;
use crate::metrics::RotationMetrics;
use crate::retry::BackoffPolicy;

/// 轮询分配引擎
///
/// 每次领取都重新读取经销商池，选出位置最靠前的可用经销商，
/// 再通过比较并设置把它标记为已领取。输掉竞争的请求退避后重新扫描，
/// 池耗尽时由 [`CycleResetController`] 开启新周期。
pub struct AssignmentEngine {
    dealer_repo: Arc<dyn DealerRepository>,
    reset_controller: Arc<CycleResetController>,
    backoff: BackoffPolicy,
    max_attempts: u32,
    metrics: RotationMetrics,
}

impl AssignmentEngine {
    pub fn new(
        dealer_repo: Arc<dyn DealerRepository>,
        reset_controller: Arc<CycleResetController>,
        config: &RotationConfig,
    ) -> Self {
        Self {
            dealer_repo,
            reset_controller,
            backoff: BackoffPolicy::from_config(config),
            max_attempts: config.claim_max_attempts.max(1),
            metrics: RotationMetrics::new(),
        }
    }

    /// 根据配置创建引擎及其重置控制器
    pub fn from_config(dealer_repo: Arc<dyn DealerRepository>, config: &RotationConfig) -> Self {
        let reset_controller = Arc::new(CycleResetController::new(
            dealer_repo.clone(),
            BackoffPolicy::from_config(config),
            config.reset_max_attempts,
        ));
        Self::new(dealer_repo, reset_controller, config)
    }

    pub fn reset_controller(&self) -> &Arc<CycleResetController> {
        &self.reset_controller
    }

    /// 领取下一个经销商
    pub async fn claim_next_dealer(&self) -> RotationResult<Dealer> {
        self.claim(None).await
    }

    /// 领取下一个经销商，截止时间之后不再发起新的领取尝试
    pub async fn claim_next_dealer_before(&self, deadline: Instant) -> RotationResult<Dealer> {
        self.claim(Some(deadline)).await
    }

    /// 当前轮询进度，仅供展示
    pub async fn progress(&self) -> RotationResult<RotationProgress> {
        let dealers = self.dealer_repo.list_dealers().await?;
        Ok(RotationProgress::from_dealers(&dealers))
    }

    /// 比较并设置失败与周期重置分别计数：每次重置之后必定重新扫描一次，
    /// 冲突次数达到上限时返回 `Contended`
    #[instrument(skip(self))]
    async fn claim(&self, deadline: Option<Instant>) -> RotationResult<Dealer> {
        let mut conflicts = 0u32;
        let mut resets = 0u32;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                debug!(conflicts, resets, "领取前已超过截止时间");
                return Err(RotationError::DeadlineExceeded);
            }

            let dealers = self.dealer_repo.list_dealers().await?;
            if dealers.is_empty() {
                return Err(RotationError::PoolEmpty);
            }

            let Some(candidate) = Self::select_candidate(&dealers) else {
                // 重置成功后池里至少有一个可用经销商，再次耗尽只能是被并发请求领走
                if resets >= self.max_attempts {
                    warn!(
                        resets,
                        total = dealers.len(),
                        "周期重置后经销商池仍被并发领取耗尽"
                    );
                    return Err(RotationError::Contended {
                        attempts: conflicts + resets,
                    });
                }

                debug!(total = dealers.len(), resets, "经销商池已耗尽，开启新的轮询周期");
                self.reset_controller.reset_cycle().await?;
                resets += 1;
                continue;
            };

            if self.dealer_repo.try_claim(&candidate.id).await? {
                self.metrics.record_claim();
                info!(
                    dealer_id = %candidate.id,
                    pool_position = candidate.pool_position,
                    conflicts,
                    resets,
                    "经销商领取成功"
                );
                let mut claimed = candidate.clone();
                claimed.available = false;
                return Ok(claimed);
            }

            conflicts += 1;
            self.metrics.record_claim_conflict();
            debug!(dealer_id = %candidate.id, conflicts, "领取冲突，经销商已被其他请求领取");

            if conflicts >= self.max_attempts {
                warn!(conflicts, "领取冲突次数已达上限");
                return Err(RotationError::Contended {
                    attempts: conflicts,
                });
            }

            let wake_at = Instant::now() + self.backoff.delay_for(conflicts);
            let wake_at = match deadline {
                Some(d) if d < wake_at => d,
                _ => wake_at,
            };
            tokio::time::sleep_until(wake_at).await;
        }
    }

    /// 选出位置最靠前的可用经销商，位置相同时取ID较小者
    fn select_candidate(dealers: &[Dealer]) -> Option<&Dealer> {
        let candidate = dealers
            .iter()
            .filter(|d| d.available)
            .min_by(|a, b| a.rotation_key().cmp(&b.rotation_key()))?;

        let duplicates = dealers
            .iter()
            .filter(|d| d.pool_position == candidate.pool_position)
            .count();
        if duplicates > 1 {
            warn!(
                pool_position = candidate.pool_position,
                dealer_id = %candidate.id,
                "发现重复的轮询位置，按经销商ID选择"
            );
        }

        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rotation_testing_utils::{fast_rotation_config, numbered_dealers, MockDealerRepository};
    use std::time::Duration;

    fn engine(repo: &MockDealerRepository) -> AssignmentEngine {
        AssignmentEngine::from_config(Arc::new(repo.clone()), &fast_rotation_config())
    }

    #[tokio::test]
    async fn test_claims_follow_pool_order() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(3));
        let engine = engine(&repo);

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(engine.claim_next_dealer().await.unwrap().id);
        }
        assert_eq!(ids, vec!["d0", "d1", "d2"]);
        assert!(repo.available_ids().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_pool_starts_new_cycle() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        let engine = engine(&repo);

        engine.claim_next_dealer().await.unwrap();
        engine.claim_next_dealer().await.unwrap();

        let dealer = engine.claim_next_dealer().await.unwrap();
        assert_eq!(dealer.id, "d0");
        assert!(!dealer.available);
        assert_eq!(repo.available_ids(), vec!["d1"]);
        assert_eq!(repo.reset_writes(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_budget_still_rescans_after_reset() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        let config = RotationConfig {
            claim_max_attempts: 1,
            ..fast_rotation_config()
        };
        let engine = AssignmentEngine::from_config(Arc::new(repo.clone()), &config);

        engine.claim_next_dealer().await.unwrap();
        engine.claim_next_dealer().await.unwrap();

        let dealer = engine.claim_next_dealer().await.unwrap();
        assert_eq!(dealer.id, "d0");
        assert_eq!(repo.available_ids(), vec!["d1"]);
        assert_eq!(repo.reset_writes(), 1);
    }

    #[tokio::test]
    async fn test_empty_pool_fails() {
        let repo = MockDealerRepository::new();
        let result = engine(&repo).claim_next_dealer().await;
        assert!(matches!(result, Err(RotationError::PoolEmpty)));
    }

    #[tokio::test]
    async fn test_lost_race_is_retried() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        repo.lose_next_claims(3);

        let dealer = engine(&repo).claim_next_dealer().await.unwrap();
        assert_eq!(dealer.id, "d0");
        assert_eq!(repo.claim_attempts(), 4);
    }

    #[tokio::test]
    async fn test_contention_is_bounded() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        repo.lose_next_claims(u32::MAX);

        let config = RotationConfig {
            claim_max_attempts: 4,
            ..fast_rotation_config()
        };
        let engine = AssignmentEngine::from_config(Arc::new(repo.clone()), &config);

        let result = engine.claim_next_dealer().await;
        assert!(matches!(
            result,
            Err(RotationError::Contended { attempts: 4 })
        ));
        assert_eq!(repo.available_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_failure_surfaces() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(1));
        let engine = engine(&repo);
        engine.claim_next_dealer().await.unwrap();

        repo.fail_next_resets(u32::MAX);
        let result = engine.claim_next_dealer().await;
        assert!(matches!(result, Err(RotationError::ResetFailed { .. })));
    }

    #[tokio::test]
    async fn test_expired_deadline_starts_no_claim() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        let deadline = Instant::now() - Duration::from_millis(1);

        let result = engine(&repo).claim_next_dealer_before(deadline).await;
        assert!(matches!(result, Err(RotationError::DeadlineExceeded)));
        assert_eq!(repo.claim_attempts(), 0);
        assert_eq!(repo.available_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_in_flight_claim_survives_deadline() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(2));
        repo.set_claim_delay(Duration::from_millis(50));
        let deadline = Instant::now() + Duration::from_millis(10);

        let dealer = engine(&repo).claim_next_dealer_before(deadline).await.unwrap();
        assert_eq!(dealer.id, "d0");
        assert_eq!(repo.available_ids(), vec!["d1"]);
    }

    #[tokio::test]
    async fn test_duplicate_position_breaks_tie_by_id() {
        let repo = MockDealerRepository::new();
        for id in ["beta", "alpha"] {
            repo.insert_raw(Dealer {
                id: id.to_string(),
                display_name: id.to_string(),
                contact_channel: format!("{id}@example.com"),
                avatar_ref: None,
                available: true,
                pool_position: 0,
                created_at: Utc::now(),
            });
        }

        let dealer = engine(&repo).claim_next_dealer().await.unwrap();
        assert_eq!(dealer.id, "alpha");
    }

    #[tokio::test]
    async fn test_progress_reports_next_dealer() {
        let repo = MockDealerRepository::with_dealers(numbered_dealers(3));
        let engine = engine(&repo);
        engine.claim_next_dealer().await.unwrap();

        let progress = engine.progress().await.unwrap();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.claimed, 1);
        assert_eq!(progress.next_dealer_id.as_deref(), Some("d1"));
    }
}
