use async_trait::async_trait;
use chrono::Utc;
use rotation_core::{
    models::{Dealer, NewDealer},
    traits::DealerRepository,
    RotationError, RotationResult,
};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::mapping::MappingHelpers;

const DEALER_COLUMNS: &str =
    "id, display_name, contact_channel, avatar_ref, available, pool_position, created_at";

pub struct SqliteDealerRepository {
    pool: SqlitePool,
}

impl SqliteDealerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_dealer(row: &sqlx::sqlite::SqliteRow) -> RotationResult<Dealer> {
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
impl DealerRepository for SqliteDealerRepository {
    async fn list_dealers(&self) -> RotationResult<Vec<Dealer>> {
        let rows = sqlx::query(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers ORDER BY pool_position ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        rows.iter().map(Self::row_to_dealer).collect()
    }

    async fn get_by_id(&self, dealer_id: &str) -> RotationResult<Option<Dealer>> {
        let row = sqlx::query(&format!("SELECT {DEALER_COLUMNS} FROM dealers WHERE id = $1"))
            .bind(dealer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        row.as_ref().map(Self::row_to_dealer).transpose()
    }

    async fn register(&self, dealer: &NewDealer) -> RotationResult<Dealer> {
        let created_at = Utc::now();

        // 位置计算和插入在同一条语句中完成，SQLite 写入串行化保证位置唯一
        let result = sqlx::query(
            r#"
            INSERT INTO dealers (id, display_name, contact_channel, avatar_ref, available, pool_position, created_at)
            SELECT $1, $2, $3, $4, 1, COALESCE(MAX(pool_position) + 1, 0), $5 FROM dealers
            RETURNING pool_position
            "#,
        )
        .bind(&dealer.id)
        .bind(&dealer.display_name)
        .bind(&dealer.contact_channel)
        .bind(&dealer.avatar_ref)
        .bind(created_at)
        .fetch_one(&self.pool)
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

    async fn try_claim(&self, dealer_id: &str) -> RotationResult<bool> {
        let result =
            sqlx::query("UPDATE dealers SET available = 0 WHERE id = $1 AND available = 1")
                .bind(dealer_id)
                .execute(&self.pool)
                .await
                .map_err(RotationError::Database)?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset_all_available(&self) -> RotationResult<u64> {
        let result = sqlx::query("UPDATE dealers SET available = 1 WHERE available = 0")
            .execute(&self.pool)
            .await
            .map_err(RotationError::Database)?;

        debug!("重置 {} 个经销商为可用", result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn reset_if_exhausted(&self) -> RotationResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE dealers SET available = 1
            WHERE available = 0
              AND NOT EXISTS (SELECT 1 FROM dealers WHERE available = 1)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        debug!("条件重置 {} 个经销商为可用", result.rows_affected());
        Ok(result.rows_affected())
    }
}
