use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::{NewPlanInput, SubscriptionPlanRepo},
    domain::entities::subscription_plan::SubscriptionPlanProfile,
};

const SELECT_COLS: &str =
    "id, name, description, price_cents, currency, duration_days, is_active, created_at, updated_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> SubscriptionPlanProfile {
    SubscriptionPlanProfile {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price_cents: row.get("price_cents"),
        currency: row.get("currency"),
        duration_days: row.get("duration_days"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl SubscriptionPlanRepo for PostgresPersistence {
    async fn create(&self, input: NewPlanInput) -> AppResult<SubscriptionPlanProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscription_plans (id, name, description, price_cents, currency, duration_days, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(&input.currency)
        .bind(input.duration_days)
        .bind(input.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn list(&self, active_only: bool) -> AppResult<Vec<SubscriptionPlanProfile>> {
        let rows = if active_only {
            sqlx::query(&format!(
                "SELECT {} FROM subscription_plans WHERE is_active = TRUE ORDER BY price_cents",
                SELECT_COLS
            ))
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?
        } else {
            sqlx::query(&format!(
                "SELECT {} FROM subscription_plans ORDER BY price_cents",
                SELECT_COLS
            ))
            .fetch_all(self.pool())
            .await
            .map_err(AppError::from)?
        };

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn get_by_id(&self, plan_id: Uuid) -> AppResult<Option<SubscriptionPlanProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE id = $1",
            SELECT_COLS
        ))
        .bind(plan_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }
}
