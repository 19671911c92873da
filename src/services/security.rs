use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;
use crate::error::{AppError, Result};

/// Name of the HttpOnly cookie carrying the session token
pub const SESSION_COOKIE: &str = "reminder_session";

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // User id
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // Token id
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid session subject".to_string()))
    }
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create a session token for `user_id` signed with the configured secret
pub fn create_session_token(user_id: i64) -> Result<String> {
    create_session_token_with(user_id, &CONFIG.auth.secret_key, CONFIG.auth.session_ttl_secs)
}

pub fn create_session_token_with(user_id: i64, secret: &[u8], ttl_secs: i64) -> Result<String> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Decode and validate a session token
pub fn decode_session_token(token: &str) -> Result<SessionClaims> {
    decode_session_token_with(token, &CONFIG.auth.secret_key)
}

pub fn decode_session_token_with(token: &str, secret: &[u8]) -> Result<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    // No clock skew tolerance for expiration check
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-sessions";

    #[test]
    fn test_session_token_round_trip() {
        let token = create_session_token_with(42, SECRET, 60).unwrap();
        let claims = decode_session_token_with(&token, SECRET).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let token = create_session_token_with(42, SECRET, -10).unwrap();

        assert!(decode_session_token_with(&token, SECRET).is_err());
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let token = create_session_token_with(42, b"another-secret", 60).unwrap();

        assert!(matches!(
            decode_session_token_with(&token, SECRET),
            Err(AppError::Jwt(_))
        ));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = bcrypt::hash("Secr3t!pass", 4).unwrap();

        assert!(verify_password("Secr3t!pass", &hash));
        assert!(!verify_password("secr3t!pass", &hash));
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
