use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::auth::{NewUser, UserRepo},
    domain::entities::user::UserProfile,
};

const SELECT_COLS: &str = "id, username, email, first_name, last_name, phone_number, is_admin, \
     is_subscribed, subscription_expiry, avatar_url, created_at, hashed_password, reset_token";

fn row_to_profile(row: sqlx::postgres::PgRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        phone_number: row.get("phone_number"),
        is_admin: row.get("is_admin"),
        is_subscribed: row.get("is_subscribed"),
        subscription_expiry: row.get("subscription_expiry"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        hashed_password: row.get("hashed_password"),
        reset_token: row.get("reset_token"),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn create(&self, input: NewUser) -> AppResult<UserProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, phone_number, hashed_password)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone_number)
        .bind(&input.hashed_password)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row_to_profile(row))
    }

    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", SELECT_COLS))
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            SELECT_COLS
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            SELECT_COLS
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_profile))
    }

    async fn set_reset_token(&self, user_id: Uuid, token: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE users SET reset_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET hashed_password = $2, reset_token = NULL WHERE id = $1")
            .bind(user_id)
            .bind(hashed_password)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
