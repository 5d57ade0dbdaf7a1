// Session tokens
// HS256 JWTs with 8-hour expiry; the subject is the user's UID

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a session token
pub const SESSION_HOURS: i64 = 8;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch)
    pub iat: usize,
    /// Expiry timestamp (seconds since epoch)
    pub exp: usize,
    /// Whether the session came from anonymous sign-in
    #[serde(default)]
    pub anon: bool,
}

/// Creates a session token for a user
///
/// # Example
/// ```
/// use teambuilder_api::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let uid = Uuid::new_v4();
/// let token = create_token(uid, true, "secret").expect("valid token");
/// let claims = verify_token(&token, "secret").expect("valid token");
/// assert_eq!(claims.sub, uid);
/// assert!(claims.anon);
/// ```
pub fn create_token(user_id: Uuid, anonymous: bool, secret: &str) -> Result<String, String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(SESSION_HOURS)).timestamp() as usize,
        anon: anonymous,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Verifies and decodes a session token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn create_and_verify_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, false, TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert_eq!(claims.sub, user_id);
        assert!(!claims.anon);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_token(Uuid::new_v4(), false, TEST_SECRET).expect("valid token");
        assert!(verify_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn invalid_token_fails() {
        assert!(verify_token("invalid.token.string", TEST_SECRET).is_err());
    }

    #[test]
    fn token_expiry_set() {
        let token = create_token(Uuid::new_v4(), true, TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        let now = Utc::now().timestamp();
        let limit = (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp();

        assert!(claims.exp as i64 > now);
        assert!(claims.exp as i64 <= limit + 10);
        assert!(claims.iat as i64 <= now);
    }
}
