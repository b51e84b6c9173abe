//! JWT token generation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{Role, TokenClaims};

/// Default access token lifetime in minutes.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// Issue a signed HS256 access token for `subject` with the given role.
///
/// `exp` is `now + ttl_minutes`; a negative TTL yields an already expired
/// token.
pub fn issue_token(
    subject: &str,
    role: Role,
    ttl_minutes: i64,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject.to_string(),
        role,
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify signature and expiry, returning the claims on success.
///
/// Tampered, malformed and expired tokens all yield `None`.
pub fn validate_token(token: &str, secret: &[u8]) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    match decode::<TokenClaims>(token, &key, &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => debug!("jwt expired"),
                _ => debug!(error = %e, "invalid jwt"),
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_validates() {
        let token = issue_token("alice", Role::Admin, 60, SECRET).unwrap();
        let claims = validate_token(&token, SECRET).expect("valid token");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("alice", Role::User, 60, SECRET).unwrap();
        assert!(validate_token(&token, b"other-secret").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("alice", Role::User, -10, SECRET).unwrap();
        assert!(validate_token(&token, SECRET).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token("alice", Role::User, 60, SECRET).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = issue_token("mallory", Role::Admin, 60, b"attacker").unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        parts[1] = forged_payload;
        assert!(validate_token(&parts.join("."), SECRET).is_none());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_none());
        assert!(validate_token("", SECRET).is_none());
    }
}
