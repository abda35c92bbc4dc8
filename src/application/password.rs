use bcrypt::{DEFAULT_COST, hash, verify};

use crate::app_error::{AppError, AppResult};

pub fn hash_password(plain: &str) -> AppResult<String> {
    hash(plain, DEFAULT_COST).map_err(|e| AppError::Internal(e.to_string()))
}

/// Malformed stored hashes count as a mismatch rather than an error; the
/// login path must emit a single undifferentiated failure signal.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}

/// Burn a bcrypt round on the no-such-user path so a lookup miss costs the
/// same as a password mismatch and usernames cannot be enumerated by timing.
pub fn equalize_timing(plain: &str) {
    let _ = hash(plain, DEFAULT_COST);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hashed = hash_password("s3cret-Passw0rd").unwrap();
        assert!(verify_password("s3cret-Passw0rd", &hashed));
        assert!(!verify_password("wrong-password", &hashed));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
