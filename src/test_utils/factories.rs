//! Test data factories for creating valid test fixtures.
//!
//! Each factory creates a complete object with sensible defaults; use the
//! closure parameter to override specific fields as needed.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::entities::{
    payment::{PaymentProfile, PaymentStatus},
    subscription_plan::SubscriptionPlanProfile,
    user::UserProfile,
    video::VideoProfile,
};

/// Create a test user with sensible defaults. The default password hash is a
/// placeholder; tests exercising credential checks set a real bcrypt hash.
pub fn create_test_user(overrides: impl FnOnce(&mut UserProfile)) -> UserProfile {
    let mut user = UserProfile {
        id: Uuid::new_v4(),
        username: format!("user{}", Uuid::new_v4().simple()),
        email: format!("user{}@example.com", Uuid::new_v4().simple()),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone_number: "+265991234567".to_string(),
        is_admin: false,
        is_subscribed: false,
        subscription_expiry: None,
        avatar_url: None,
        created_at: Some(test_datetime()),
        hashed_password: "$2b$12$placeholderplaceholderplaceholder".to_string(),
        reset_token: None,
    };
    overrides(&mut user);
    user
}

/// Create a test subscription plan with sensible defaults.
pub fn create_test_plan(
    overrides: impl FnOnce(&mut SubscriptionPlanProfile),
) -> SubscriptionPlanProfile {
    let mut plan = SubscriptionPlanProfile {
        id: Uuid::new_v4(),
        name: "Monthly".to_string(),
        description: Some("Thirty days of full access".to_string()),
        price_cents: 500_000,
        currency: "MWK".to_string(),
        duration_days: 30,
        is_active: true,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut plan);
    plan
}

/// Create a test payment row with sensible defaults (pending).
pub fn create_test_payment(
    user_id: Uuid,
    plan_id: Uuid,
    overrides: impl FnOnce(&mut PaymentProfile),
) -> PaymentProfile {
    let mut payment = PaymentProfile {
        tx_ref: format!("sub-{}-{}", user_id, Uuid::new_v4()),
        user_id,
        plan_id,
        amount_cents: 500_000,
        currency: "MWK".to_string(),
        status: PaymentStatus::Pending,
        created_at: Some(test_datetime()),
        paid_at: None,
    };
    overrides(&mut payment);
    payment
}

/// Create a test video with sensible defaults.
pub fn create_test_video(overrides: impl FnOnce(&mut VideoProfile)) -> VideoProfile {
    let mut video = VideoProfile {
        id: Uuid::new_v4(),
        title: "Test Video".to_string(),
        thumbnail_url: Some("https://cdn.example.com/thumb.jpg".to_string()),
        vimeo_url: Some("https://vimeo.com/123456789".to_string()),
        vimeo_id: Some("123456789".to_string()),
        category_id: None,
        created_date: Some(test_datetime()),
    };
    overrides(&mut video);
    video
}

/// Returns a consistent test datetime (2024-01-15 12:00:00 UTC).
fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_with_overrides() {
        let user = create_test_user(|u| {
            u.username = "custom".to_string();
            u.is_admin = true;
        });
        assert_eq!(user.username, "custom");
        assert!(user.is_admin);
        assert!(!user.is_subscribed);
    }

    #[test]
    fn test_create_plan_with_defaults() {
        let plan = create_test_plan(|_| {});
        assert_eq!(plan.duration_days, 30);
        assert!(plan.is_active);
    }

    #[test]
    fn test_create_payment_links_user_and_plan() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let payment = create_test_payment(user_id, plan_id, |_| {});
        assert_eq!(payment.user_id, user_id);
        assert_eq!(payment.plan_id, plan_id);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.tx_ref.starts_with("sub-"));
    }
}
