//! Test helper utilities

use std::sync::Arc;

use rotation_core::{
    config::{DatabaseConfig, RotationConfig},
    models::NewDealer,
    traits::{DealerRepository, LeadRepository},
};
use rotation_infrastructure::DatabaseManager;

/// 退避极短的轮询配置，测试中避免无谓等待
pub fn fast_rotation_config() -> RotationConfig {
    RotationConfig {
        claim_max_attempts: 32,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
        backoff_jitter_factor: 0.5,
        reset_max_attempts: 3,
        submit_timeout_seconds: 5,
    }
}

/// 已迁移的 SQLite 内存数据库及其仓储
pub struct SqliteTestDatabase {
    pub manager: DatabaseManager,
    pub dealers: Arc<dyn DealerRepository>,
    pub leads: Arc<dyn LeadRepository>,
}

impl SqliteTestDatabase {
    pub async fn new() -> Self {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let manager = DatabaseManager::new(&config)
            .await
            .expect("failed to open in-memory sqlite");
        manager.migrate().await.expect("failed to run migrations");

        let dealers = manager.dealer_repository();
        let leads = manager.lead_repository();
        Self {
            manager,
            dealers,
            leads,
        }
    }

    /// 按给定顺序注册经销商
    pub async fn with_dealers(dealers: &[NewDealer]) -> Self {
        let db = Self::new().await;
        for dealer in dealers {
            db.dealers
                .register(dealer)
                .await
                .expect("failed to register dealer");
        }
        db
    }
}
