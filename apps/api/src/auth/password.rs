// Password hashing for email sign-in
// Uses bcrypt; the admin account's password doubles as the admin code

use bcrypt::{hash, verify, DEFAULT_COST};

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use teambuilder_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("pallet-town").unwrap();
/// assert!(verify_password("pallet-town", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

/// Checks the registration length rule
pub fn check_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let hash = hash_password("test_password_123").expect("valid hash");
        assert!(verify_password("test_password_123", &hash).expect("valid verification"));
    }

    #[test]
    fn verify_wrong_password() {
        let hash = hash_password("test_password_123").expect("valid hash");
        assert!(!verify_password("wrong_password", &hash).expect("valid verification"));
    }

    #[test]
    fn strength_requires_eight_chars() {
        assert!(check_strength("short").is_err());
        assert!(check_strength("longenough").is_ok());
    }
}
