use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use serde::Serialize;
use time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{jwt, password, validators},
    domain::entities::user::UserProfile,
};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub hashed_password: String,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails `DuplicateIdentity` on username/email collision; the unique
    /// constraints in the store are the backstop for racing registrations.
    async fn create(&self, input: NewUser) -> AppResult<UserProfile>;
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserProfile>>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<UserProfile>>;
    async fn set_reset_token(&self, user_id: Uuid, token: Option<&str>) -> AppResult<()>;
    /// Replaces the credential and clears any outstanding reset token in the
    /// same update (reset tokens are single-use).
    async fn set_password(&self, user_id: Uuid, hashed_password: &str) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthUseCases {
    users: Arc<dyn UserRepo>,
    jwt_secret: SecretString,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl AuthUseCases {
    pub fn new(
        users: Arc<dyn UserRepo>,
        jwt_secret: SecretString,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> AppResult<SessionTokens> {
        if let Some(msg) = validators::password_strength(&input.password) {
            return Err(AppError::InvalidInput(msg.into()));
        }
        if self.users.get_by_username(&input.username).await?.is_some() {
            return Err(AppError::DuplicateIdentity(
                "Username already registered".into(),
            ));
        }
        if self.users.get_by_email(&input.email).await?.is_some() {
            return Err(AppError::DuplicateIdentity("Email already registered".into()));
        }

        let hashed_password = password::hash_password(&input.password)?;
        let user = self
            .users
            .create(NewUser {
                username: input.username,
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                phone_number: input.phone_number,
                hashed_password,
            })
            .await?;

        self.issue_session(&user)
    }

    /// Credential check. A missing user and a wrong password produce the
    /// same error value, and the missing-user path burns a bcrypt round so
    /// the two are not separable by response time either.
    #[instrument(skip(self, plaintext_password))]
    pub async fn login(
        &self,
        username: &str,
        plaintext_password: &str,
    ) -> AppResult<SessionTokens> {
        let user = self.authenticate(username, plaintext_password).await?;
        self.issue_session(&user)
    }

    pub async fn authenticate(
        &self,
        username: &str,
        plaintext_password: &str,
    ) -> AppResult<UserProfile> {
        match self.users.get_by_username(username).await? {
            Some(user) if password::verify_password(plaintext_password, &user.hashed_password) => {
                Ok(user)
            }
            Some(_) => Err(AppError::InvalidCredentials),
            None => {
                password::equalize_timing(plaintext_password);
                Err(AppError::InvalidCredentials)
            }
        }
    }

    pub fn issue_session(&self, user: &UserProfile) -> AppResult<SessionTokens> {
        let access_token = jwt::issue_access(user, &self.jwt_secret, self.access_token_ttl)?;
        let refresh_token =
            jwt::issue_refresh(&user.username, &self.jwt_secret, self.refresh_token_ttl)?;
        Ok(SessionTokens {
            access_token,
            refresh_token,
            token_type: "bearer",
        })
    }

    /// Mints a fresh access token from a refresh token. The principal is
    /// re-read so a deleted account cannot keep refreshing.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = jwt::verify_refresh(refresh_token, &self.jwt_secret)?;
        let user = self
            .users
            .get_by_username(&claims.sub)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        jwt::issue_access(&user, &self.jwt_secret, self.access_token_ttl)
    }

    /// Session resolution for protected requests: verify the token with
    /// kind=access, then re-read the principal. Everything downstream (the
    /// subscription guard in particular) sees the live record, never claims
    /// frozen at issuance time.
    #[instrument(skip(self, token))]
    pub async fn resolve_access_token(&self, token: &str) -> AppResult<UserProfile> {
        let claims = jwt::verify_access(token, &self.jwt_secret)?;
        self.users
            .get_by_id(claims.user_id)
            .await?
            .ok_or(AppError::InvalidCredentials)
    }
}

/// Subscription gate for protected handlers. Resolution failures are 401s;
/// an authenticated principal without entitlement gets the distinct
/// `SubscriptionRequired` (403) so clients know to re-subscribe, not re-login.
pub fn require_active_subscription(user: UserProfile) -> AppResult<UserProfile> {
    if user.has_active_subscription(Utc::now().naive_utc()) {
        Ok(user)
    } else {
        Err(AppError::SubscriptionRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{factories::create_test_user, mocks::InMemoryUserRepo};
    use chrono::Duration as ChronoDuration;

    fn use_cases(users: Arc<InMemoryUserRepo>) -> AuthUseCases {
        AuthUseCases::new(
            users,
            SecretString::from("auth-test-secret"),
            Duration::hours(2),
            Duration::days(7),
        )
    }

    fn seeded_user(username: &str, plain: &str) -> UserProfile {
        create_test_user(|u| {
            u.username = username.to_string();
            u.email = format!("{username}@example.com");
            u.hashed_password = password::hash_password(plain).unwrap();
        })
    }

    #[tokio::test]
    async fn authenticate_then_resolve_returns_same_principal() {
        let user = seeded_user("marcus", "Sufficient1");
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user.clone()]));
        let auth = use_cases(users);

        let tokens = auth.login("marcus", "Sufficient1").await.unwrap();
        let resolved = auth
            .resolve_access_token(&tokens.access_token)
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_are_indistinguishable() {
        let users = Arc::new(InMemoryUserRepo::with_users(vec![seeded_user(
            "marcus",
            "Sufficient1",
        )]));
        let auth = use_cases(users);

        let missing = auth.authenticate("nobody", "Sufficient1").await.unwrap_err();
        let wrong = auth.authenticate("marcus", "WrongPass1").await.unwrap_err();
        assert!(matches!(missing, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_token_is_rejected_by_the_resolver() {
        let user = seeded_user("marcus", "Sufficient1");
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user]));
        let auth = use_cases(users);

        let tokens = auth.login("marcus", "Sufficient1").await.unwrap();
        let err = auth
            .resolve_access_token(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn refresh_mints_a_usable_access_token() {
        let user = seeded_user("marcus", "Sufficient1");
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user.clone()]));
        let auth = use_cases(users);

        let tokens = auth.login("marcus", "Sufficient1").await.unwrap();
        let access = auth.refresh(&tokens.refresh_token).await.unwrap();
        let resolved = auth.resolve_access_token(&access).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn deleted_principal_invalidates_outstanding_tokens() {
        let user = seeded_user("marcus", "Sufficient1");
        let users = Arc::new(InMemoryUserRepo::with_users(vec![user.clone()]));
        let auth = use_cases(users.clone());

        let tokens = auth.login("marcus", "Sufficient1").await.unwrap();
        users.remove(user.id);

        let resolve_err = auth
            .resolve_access_token(&tokens.access_token)
            .await
            .unwrap_err();
        assert!(matches!(resolve_err, AppError::InvalidCredentials));

        let refresh_err = auth.refresh(&tokens.refresh_token).await.unwrap_err();
        assert!(matches!(refresh_err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_registration_fails_and_leaves_first_account_intact() {
        let users = Arc::new(InMemoryUserRepo::new());
        let auth = use_cases(users.clone());

        let input = RegisterInput {
            username: "marcus".into(),
            email: "marcus@example.com".into(),
            first_name: "Marcus".into(),
            last_name: "Banda".into(),
            phone_number: "+265991234567".into(),
            password: "Sufficient1".into(),
        };
        auth.register(input.clone()).await.unwrap();

        let err = auth.register(input).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity(_)));

        // First registration still logs in.
        auth.login("marcus", "Sufficient1").await.unwrap();
    }

    #[test]
    fn subscription_guard_passes_active_and_rejects_lapsed() {
        let now = Utc::now().naive_utc();
        let active = create_test_user(|u| {
            u.is_subscribed = true;
            u.subscription_expiry = Some(now + ChronoDuration::days(3));
        });
        assert!(require_active_subscription(active).is_ok());

        let lapsed = create_test_user(|u| {
            u.is_subscribed = true;
            u.subscription_expiry = Some(now - ChronoDuration::hours(1));
        });
        let err = require_active_subscription(lapsed).unwrap_err();
        assert!(matches!(err, AppError::SubscriptionRequired));
    }
}
