use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub is_admin: bool,
    pub is_subscribed: bool,
    pub subscription_expiry: Option<NaiveDateTime>,
    pub avatar_url: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
}

impl UserProfile {
    /// Entitlement is computed at check time, never cached. A set flag with
    /// a past expiry is a lapsed subscription; a set flag with no expiry is
    /// non-expiring (manually granted access) and must stay that way.
    pub fn has_active_subscription(&self, now: NaiveDateTime) -> bool {
        self.is_subscribed && self.subscription_expiry.is_none_or(|expiry| expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::factories::create_test_user;
    use chrono::{Duration, Utc};

    #[test]
    fn entitlement_truth_table() {
        let now = Utc::now().naive_utc();

        let unsubscribed = create_test_user(|u| {
            u.is_subscribed = false;
            u.subscription_expiry = None;
        });
        assert!(!unsubscribed.has_active_subscription(now));

        let granted = create_test_user(|u| {
            u.is_subscribed = true;
            u.subscription_expiry = None;
        });
        assert!(granted.has_active_subscription(now));

        let active = create_test_user(|u| {
            u.is_subscribed = true;
            u.subscription_expiry = Some(now + Duration::days(10));
        });
        assert!(active.has_active_subscription(now));

        let lapsed = create_test_user(|u| {
            u.is_subscribed = true;
            u.subscription_expiry = Some(now - Duration::days(1));
        });
        assert!(!lapsed.has_active_subscription(now));
    }
}
