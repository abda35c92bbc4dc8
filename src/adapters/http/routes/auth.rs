use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser},
    app_error::{AppError, AppResult},
    use_cases::auth::RegisterInput,
};

#[derive(Deserialize, Validate)]
struct RegisterPayload {
    #[validate(length(min = 3, max = 50))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 50))]
    first_name: String,
    #[validate(length(min = 1, max = 50))]
    last_name: String,
    #[validate(length(min = 5, max = 20))]
    phone_number: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshPayload {
    refresh_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/user-details", get(user_details))
        .route("/verify-token", get(verify_token))
}

async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let tokens = app_state
        .auth_use_cases
        .register(RegisterInput {
            username: payload.username,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
            password: payload.password,
        })
        .await?;
    Ok(Json(tokens))
}

async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let tokens = app_state
        .auth_use_cases
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(tokens))
}

async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> AppResult<impl IntoResponse> {
    let access_token = app_state
        .auth_use_cases
        .refresh(&payload.refresh_token)
        .await?;
    Ok(Json(serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer",
    })))
}

async fn user_details(CurrentUser(user): CurrentUser) -> AppResult<impl IntoResponse> {
    // Credential fields are skipped by the profile's Serialize impl.
    Ok(Json(user))
}

async fn verify_token(CurrentUser(user): CurrentUser) -> AppResult<impl IntoResponse> {
    Ok(Json(serde_json::json!({
        "message": "Token is valid",
        "username": user.username,
        "user_id": user.id,
        "is_admin": user.is_admin,
        "is_subscribed": user.is_subscribed,
        "subscription_expiry": user.subscription_expiry,
    })))
}
