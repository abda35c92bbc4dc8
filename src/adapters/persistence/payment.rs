use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::PaymentRepo,
    domain::entities::payment::{PaymentProfile, PaymentStatus},
};

const SELECT_COLS: &str =
    "tx_ref, user_id, plan_id, amount_cents, currency, status, created_at, paid_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> PaymentProfile {
    let status: String = row.get("status");
    PaymentProfile {
        tx_ref: row.get("tx_ref"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        amount_cents: row.get("amount_cents"),
        currency: row.get("currency"),
        status: PaymentStatus::from_str(&status),
        created_at: row.get("created_at"),
        paid_at: row.get("paid_at"),
    }
}

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn create_pending(
        &self,
        tx_ref: &str,
        user_id: Uuid,
        plan_id: Uuid,
        amount_cents: i64,
        currency: &str,
    ) -> AppResult<PaymentProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscription_payments (tx_ref, user_id, plan_id, amount_cents, currency, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(tx_ref)
        .bind(user_id)
        .bind(plan_id)
        .bind(amount_cents)
        .bind(currency)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn get_by_tx_ref(&self, tx_ref: &str) -> AppResult<Option<PaymentProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscription_payments WHERE tx_ref = $1",
            SELECT_COLS
        ))
        .bind(tx_ref)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    // The conditional flip is the serialization point for concurrent
    // deliveries of the same tx_ref: the row lock taken by the first UPDATE
    // makes every later attempt see status != 'pending' and bail out, so the
    // expiry extension below runs at most once per payment.
    async fn apply_successful_payment(
        &self,
        tx_ref: &str,
        duration_days: i32,
    ) -> AppResult<Option<NaiveDateTime>> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;
        let now = Utc::now().naive_utc();

        let flipped = sqlx::query(
            r#"
            UPDATE subscription_payments
            SET status = 'applied', paid_at = $2
            WHERE tx_ref = $1 AND status = 'pending'
            RETURNING user_id
            "#,
        )
        .bind(tx_ref)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let Some(row) = flipped else {
            tx.rollback().await.map_err(AppError::from)?;
            return Ok(None);
        };
        let user_id: Uuid = row.get("user_id");

        // Additive extension: renewing before expiry keeps the remaining
        // paid-for time.
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET is_subscribed = TRUE,
                subscription_expiry =
                    GREATEST(COALESCE(subscription_expiry, $2), $2) + make_interval(days => $3)
            WHERE id = $1
            RETURNING subscription_expiry
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(duration_days)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let expiry: Option<NaiveDateTime> = updated.get("subscription_expiry");
        tx.commit().await.map_err(AppError::from)?;
        Ok(expiry)
    }

    async fn latest_applied_for_user(&self, user_id: Uuid) -> AppResult<Option<PaymentProfile>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM subscription_payments
            WHERE user_id = $1 AND status = 'applied'
            ORDER BY paid_at DESC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }
}
