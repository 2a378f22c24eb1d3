use std::{sync::Arc, time::Duration};

use rotation_core::{
    config::DatabaseConfig,
    traits::{DealerRepository, LeadRepository},
    RotationError, RotationResult,
};
use tracing::info;

use super::postgres::{PostgresDealerRepository, PostgresLeadRepository};
use super::sqlite::{SqliteDealerRepository, SqliteLeadRepository};

/// Database type detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// 内存数据库每个连接都是独立的库，只能使用单连接并保持常驻
fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Database connection pool enum
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create pool from config with automatic type detection
    pub async fn connect(config: &DatabaseConfig) -> RotationResult<Self> {
        let acquire_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let idle_timeout = Duration::from_secs(config.idle_timeout_seconds);

        match DatabaseType::from_url(&config.url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect(&config.url)
                    .await
                    .map_err(RotationError::Database)?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite if is_memory_url(&config.url) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect(&config.url)
                    .await
                    .map_err(RotationError::Database)?;
                Ok(DatabasePool::SQLite(pool))
            }
            DatabaseType::SQLite => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .connect(&config.url)
                    .await
                    .map_err(RotationError::Database)?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> RotationResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(RotationError::Database)?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(RotationError::Database)?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// 统一的数据库管理器，负责连接池、迁移和仓储创建
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> RotationResult<Self> {
        let pool = DatabasePool::connect(config).await?;
        info!(
            "数据库连接池已创建: {:?} (最大连接数: {})",
            pool.database_type(),
            config.max_connections
        );
        Ok(Self { pool })
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    /// 执行内置迁移脚本
    pub async fn migrate(&self) -> RotationResult<()> {
        let result = match &self.pool {
            DatabasePool::PostgreSQL(pool) => sqlx::migrate!("./migrations/postgres").run(pool).await,
            DatabasePool::SQLite(pool) => sqlx::migrate!("./migrations/sqlite").run(pool).await,
        };
        result.map_err(|e| RotationError::Database(sqlx::Error::Migrate(Box::new(e))))?;

        info!("数据库迁移完成");
        Ok(())
    }

    pub async fn health_check(&self) -> RotationResult<()> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    pub fn dealer_repository(&self) -> Arc<dyn DealerRepository> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresDealerRepository::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteDealerRepository::new(pool.clone())),
        }
    }

    pub fn lead_repository(&self) -> Arc<dyn LeadRepository> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(PostgresLeadRepository::new(pool.clone())),
            DatabasePool::SQLite(pool) => Arc::new(SqliteLeadRepository::new(pool.clone())),
        }
    }
}
