use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde::Deserialize;
use validator::Validate;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

#[derive(Deserialize, Validate)]
struct ForgotPasswordPayload {
    #[validate(email)]
    email: String,
}

#[derive(Deserialize)]
struct ResetPasswordPayload {
    token: String,
    new_password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

async fn forgot_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    app_state
        .password_reset_use_cases
        .forgot_password(&payload.email)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Password reset token sent to your email"
    })))
}

async fn reset_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .password_reset_use_cases
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Password reset successfully"
    })))
}
