use std::sync::Arc;

use secrecy::SecretString;
use time::Duration;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{jwt, password, ports::email::EmailSender, use_cases::auth::UserRepo, validators},
};

#[derive(Clone)]
pub struct PasswordResetUseCases {
    users: Arc<dyn UserRepo>,
    email: Arc<dyn EmailSender>,
    jwt_secret: SecretString,
    reset_token_ttl: Duration,
}

impl PasswordResetUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        email: Arc<dyn EmailSender>,
        jwt_secret: SecretString,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            email,
            jwt_secret,
            reset_token_ttl,
        }
    }

    /// Issues a short-lived reset token, persists it on the user row (a
    /// later issue overwrites it) and mails it out.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        let token = jwt::issue_reset(email, &self.jwt_secret, self.reset_token_ttl)?;
        self.users.set_reset_token(user.id, Some(&token)).await?;

        self.email
            .send(
                email,
                "Password Reset Request",
                &format!("Use this token to reset your password: {token}"),
            )
            .await
    }

    /// The token must verify as kind=reset AND equal the stored single-use
    /// copy; replacing the password clears that copy.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let claims = jwt::verify_reset(token, &self.jwt_secret)
            .map_err(|_| AppError::InvalidInput("Invalid or expired token".into()))?;

        let user = self
            .users
            .get_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::InvalidInput("Invalid or expired token".into()))?;
        if user.reset_token.as_deref() != Some(token) {
            return Err(AppError::InvalidInput("Invalid or expired token".into()));
        }

        if let Some(msg) = validators::password_strength(new_password) {
            return Err(AppError::InvalidInput(msg.into()));
        }

        let hashed = password::hash_password(new_password)?;
        self.users.set_password(user.id, &hashed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        factories::create_test_user,
        mocks::{InMemoryUserRepo, RecordingEmailSender},
    };

    fn use_cases(
        users: Arc<InMemoryUserRepo>,
        email: Arc<RecordingEmailSender>,
    ) -> PasswordResetUseCases {
        PasswordResetUseCases::new(
            users,
            email,
            SecretString::from("reset-test-secret"),
            Duration::minutes(30),
        )
    }

    #[tokio::test]
    async fn full_reset_flow_replaces_the_credential_once() {
        let user = create_test_user(|u| u.email = "marcus@example.com".into());
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user.clone()]));
        let email = Arc::new(RecordingEmailSender::new());
        let reset = use_cases(users.clone(), email.clone());

        reset.forgot_password("marcus@example.com").await.unwrap();
        let token = users.get(user.id).unwrap().reset_token.unwrap();
        assert!(email.last_body().unwrap().contains(&token));

        reset.reset_password(&token, "FreshPass1").await.unwrap();

        let updated = users.get(user.id).unwrap();
        assert!(password::verify_password("FreshPass1", &updated.hashed_password));
        assert!(updated.reset_token.is_none());

        // Single-use: the consumed token no longer matches anything stored.
        let err = reset.reset_password(&token, "AnotherPass1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn token_must_match_the_stored_copy() {
        let user = create_test_user(|u| u.email = "marcus@example.com".into());
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user]));
        let email = Arc::new(RecordingEmailSender::new());
        let reset = use_cases(users.clone(), email.clone());

        reset.forgot_password("marcus@example.com").await.unwrap();

        // Correctly signed, kind=reset, but never stored (shorter TTL keeps
        // the encoded string distinct from the issued one).
        let stray = jwt::issue_reset(
            "marcus@example.com",
            &SecretString::from("reset-test-secret"),
            Duration::minutes(10),
        )
        .unwrap();

        let err = reset.reset_password(&stray, "FreshPass1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let users = Arc::new(InMemoryUserRepo::new());
        let email = Arc::new(RecordingEmailSender::new());
        let reset = use_cases(users, email);

        let err = reset.forgot_password("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn weak_replacement_password_is_rejected() {
        let user = create_test_user(|u| u.email = "marcus@example.com".into());
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user.clone()]));
        let email = Arc::new(RecordingEmailSender::new());
        let reset = use_cases(users.clone(), email);

        reset.forgot_password("marcus@example.com").await.unwrap();
        let token = users.get(user.id).unwrap().reset_token.unwrap();

        let err = reset.reset_password(&token, "weak").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
