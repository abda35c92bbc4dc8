use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    domain::entities::user::UserProfile,
    use_cases::auth::require_active_subscription,
};

/// The resolved principal for a protected request: bearer token verified
/// with kind=access, then re-read from the store so deleted accounts and
/// subscription changes take effect immediately.
pub struct CurrentUser(pub UserProfile);

/// `CurrentUser` plus the subscription gate. Handlers taking this get 403
/// `SUBSCRIPTION_REQUIRED` for authenticated-but-unentitled callers.
pub struct Subscriber(pub UserProfile);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .map(str::to_owned)
            .ok_or(AppError::InvalidCredentials)?;
        let user = state.auth_use_cases.resolve_access_token(&token).await?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for Subscriber {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(Subscriber(require_active_subscription(user)?))
    }
}
