use async_trait::async_trait;
use chrono::Utc;
use rotation_core::{
    models::{Dealer, NewDealer},
    traits::DealerRepository,
    RotationError, RotationResult,
};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use crate::database::mapping::MappingHelpers;

const DEALER_COLUMNS: &str =
    "id, display_name, contact_channel, avatar_ref, available, pool_position, created_at";

pub struct PostgresDealerRepository {
    pool: PgPool,
}

impl PostgresDealerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_dealer(row: &sqlx::postgres::PgRow) -> RotationResult<Dealer> {
        Ok(Dealer {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            contact_channel: row.try_get("contact_channel")?,
            avatar_ref: row.try_get("avatar_ref")?,
            available: row.try_get("available")?,
            pool_position: row.try_get("pool_position")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl DealerRepository for PostgresDealerRepository {
    #[instrument(skip(self))]
    async fn list_dealers(&self) -> RotationResult<Vec<Dealer>> {
        let rows = sqlx::query(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers ORDER BY pool_position ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        rows.iter().map(Self::row_to_dealer).collect()
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, dealer_id: &str) -> RotationResult<Option<Dealer>> {
        let row = sqlx::query(&format!("SELECT {DEALER_COLUMNS} FROM dealers WHERE id = $1"))
            .bind(dealer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        row.as_ref().map(Self::row_to_dealer).transpose()
    }

    #[instrument(skip(self, dealer), fields(dealer_id = %dealer.id))]
    async fn register(&self, dealer: &NewDealer) -> RotationResult<Dealer> {
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await.map_err(RotationError::Database)?;

        // 并发注册时 MAX(pool_position) 需要在表锁下读取
        sqlx::query("LOCK TABLE dealers IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(RotationError::Database)?;

        let result = sqlx::query(
            r#"
            INSERT INTO dealers (id, display_name, contact_channel, avatar_ref, available, pool_position, created_at)
            SELECT $1, $2, $3, $4, TRUE, COALESCE(MAX(pool_position) + 1, 0), $5 FROM dealers
            RETURNING pool_position
            "#,
        )
        .bind(&dealer.id)
        .bind(&dealer.display_name)
        .bind(&dealer.contact_channel)
        .bind(&dealer.avatar_ref)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(e) if MappingHelpers::is_unique_violation(&e) => {
                return Err(RotationError::DealerAlreadyExists {
                    id: dealer.id.clone(),
                });
            }
            Err(e) => return Err(RotationError::Database(e)),
        };

        let pool_position: i64 = row.try_get("pool_position")?;
        tx.commit().await.map_err(RotationError::Database)?;
        debug!("注册经销商成功: {} (位置: {})", dealer.id, pool_position);

        Ok(Dealer {
            id: dealer.id.clone(),
            display_name: dealer.display_name.clone(),
            contact_channel: dealer.contact_channel.clone(),
            avatar_ref: dealer.avatar_ref.clone(),
            available: true,
            pool_position,
            created_at,
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, dealer_id: &str) -> RotationResult<()> {
        let result = sqlx::query("DELETE FROM dealers WHERE id = $1")
            .bind(dealer_id)
            .execute(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        if result.rows_affected() == 0 {
            return Err(RotationError::DealerNotFound {
                id: dealer_id.to_string(),
            });
        }

        debug!("移除经销商成功: {}", dealer_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_available(&self, dealer_id: &str, available: bool) -> RotationResult<()> {
        let result = sqlx::query("UPDATE dealers SET available = $1 WHERE id = $2")
            .bind(available)
            .bind(dealer_id)
            .execute(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        if result.rows_affected() == 0 {
            return Err(RotationError::DealerNotFound {
                id: dealer_id.to_string(),
            });
        }

        debug!("更新经销商可用状态: {} -> {}", dealer_id, available);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn try_claim(&self, dealer_id: &str) -> RotationResult<bool> {
        let result = sqlx::query(
            "UPDATE dealers SET available = FALSE WHERE id = $1 AND available = TRUE",
        )
        .bind(dealer_id)
        .execute(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn reset_all_available(&self) -> RotationResult<u64> {
        let result = sqlx::query("UPDATE dealers SET available = TRUE WHERE available = FALSE")
            .execute(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        debug!("重置 {} 个经销商为可用", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn reset_if_exhausted(&self) -> RotationResult<u64> {
        let mut tx = self.pool.begin().await.map_err(RotationError::Database)?;

        // 读已提交隔离级别下 NOT EXISTS 子查询看不到并发领取，
        // 先锁表再判断是否耗尽，避免把新周期已领取的经销商重新置为可用
        sqlx::query("LOCK TABLE dealers IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(RotationError::Database)?;

        let available: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM dealers WHERE available = TRUE")
                .fetch_one(&mut *tx)
                .await
                .map_err(RotationError::Database)?;

        if available > 0 {
            tx.commit().await.map_err(RotationError::Database)?;
            debug!("仍有 {} 个可用经销商，跳过重置", available);
            return Ok(0);
        }

        let result = sqlx::query("UPDATE dealers SET available = TRUE WHERE available = FALSE")
            .execute(&mut *tx)
            .await
            .map_err(RotationError::Database)?;
        tx.commit().await.map_err(RotationError::Database)?;

        debug!("条件重置 {} 个经销商为可用", result.rows_affected());
        Ok(result.rows_affected())
    }
}
