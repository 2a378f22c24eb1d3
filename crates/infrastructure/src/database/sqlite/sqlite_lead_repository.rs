use async_trait::async_trait;
use chrono::Utc;
use rotation_core::{
    models::{DeliveryStatus, LeadSubmission, NewLeadSubmission},
    traits::LeadRepository,
    RotationError, RotationResult,
};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::mapping::MappingHelpers;

const LEAD_COLUMNS: &str = "id, full_name, id_number, email, phone, agreement_accepted, \
     assigned_dealer_id, assigned_at, delivery_status, delivery_error, created_at, updated_at";

pub struct SqliteLeadRepository {
    pool: SqlitePool,
}

impl SqliteLeadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> RotationResult<LeadSubmission> {
        let status: String = row.try_get("delivery_status")?;

        Ok(LeadSubmission {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            id_number: row.try_get("id_number")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            agreement_accepted: row.try_get("agreement_accepted")?,
            assigned_dealer_id: row.try_get("assigned_dealer_id")?,
            assigned_at: row.try_get("assigned_at")?,
            delivery_status: MappingHelpers::parse_delivery_status(&status)?,
            delivery_error: row.try_get("delivery_error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn create(&self, lead: &NewLeadSubmission) -> RotationResult<LeadSubmission> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO lead_submissions (full_name, id_number, email, phone, agreement_accepted,
                assigned_dealer_id, assigned_at, delivery_status, delivery_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, $9, $9)
            "#,
        )
        .bind(&lead.form.full_name)
        .bind(&lead.form.id_number)
        .bind(&lead.form.email)
        .bind(&lead.form.phone)
        .bind(lead.form.agreement_accepted)
        .bind(&lead.assigned_dealer_id)
        .bind(lead.assigned_at)
        .bind(DeliveryStatus::Pending.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        let id = result.last_insert_rowid();
        debug!(
            "创建线索记录成功: {} (经销商: {})",
            id, lead.assigned_dealer_id
        );

        Ok(LeadSubmission {
            id,
            full_name: lead.form.full_name.clone(),
            id_number: lead.form.id_number.clone(),
            email: lead.form.email.clone(),
            phone: lead.form.phone.clone(),
            agreement_accepted: lead.form.agreement_accepted,
            assigned_dealer_id: lead.assigned_dealer_id.clone(),
            assigned_at: lead.assigned_at,
            delivery_status: DeliveryStatus::Pending,
            delivery_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> RotationResult<Option<LeadSubmission>> {
        let row = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM lead_submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        row.as_ref().map(Self::row_to_lead).transpose()
    }

    async fn update_delivery_status(
        &self,
        id: i64,
        status: DeliveryStatus,
        delivery_error: Option<&str>,
    ) -> RotationResult<bool> {
        MappingHelpers::ensure_delivery_transition(status)?;

        let result = sqlx::query(
            r#"
            UPDATE lead_submissions
            SET delivery_status = $1, delivery_error = $2, updated_at = $3
            WHERE id = $4 AND delivery_status = $5
            "#,
        )
        .bind(status.as_str())
        .bind(delivery_error)
        .bind(Utc::now())
        .bind(id)
        .bind(DeliveryStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        if result.rows_affected() == 0 {
            if self.get_by_id(id).await?.is_none() {
                return Err(RotationError::LeadNotFound { id });
            }
            debug!("线索 {} 已处于终态，忽略状态更新 {}", id, status);
            return Ok(false);
        }

        debug!("更新线索投递状态: {} -> {}", id, status);
        Ok(true)
    }

    async fn list_by_dealer(
        &self,
        dealer_id: &str,
        limit: i64,
    ) -> RotationResult<Vec<LeadSubmission>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM lead_submissions WHERE assigned_dealer_id = $1 \
             ORDER BY id DESC LIMIT $2"
        ))
        .bind(dealer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(RotationError::Database)?;

        rows.iter().map(Self::row_to_lead).collect()
    }
}
