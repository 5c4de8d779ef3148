// server/src/services/token_service.rs

//! Signed bearer tokens.

use crate::errors::AppError;
use baoleme_core::domain::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub user_id: i64,
  pub role: Role,
  pub username: String,
  pub iat: i64,
  pub exp: i64,
}

pub struct TokenService {
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
  validation: Validation,
  ttl: Duration,
}

impl TokenService {
  pub fn new(secret: &[u8], ttl: Duration) -> Self {
    Self {
      encoding_key: EncodingKey::from_secret(secret),
      decoding_key: DecodingKey::from_secret(secret),
      validation: Validation::default(),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  #[instrument(name = "token_service::issue", skip(self, username), err(Display))]
  pub fn issue(&self, user_id: i64, role: Role, username: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
      user_id,
      role,
      username: username.to_string(),
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    self.encode(&claims)
  }

  fn encode(&self, claims: &Claims) -> Result<String, AppError> {
    encode(&Header::default(), claims, &self.encoding_key)
      .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
  }

  /// Signature and expiry only; the session registry decides whether the token is still live.
  pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &self.decoding_key, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| {
        debug!(error = %e, "Token rejected.");
        AppError::token_invalid()
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn service() -> TokenService {
    TokenService::new(b"unit-test-secret", Duration::hours(1))
  }

  #[test]
  fn issued_token_verifies() {
    let tokens = service();
    let token = tokens.issue(42, Role::Rider, "小王").unwrap();
    let claims = tokens.verify(&token).unwrap();
    assert_eq!(claims.user_id, 42);
    assert_eq!(claims.role, Role::Rider);
    assert_eq!(claims.username, "小王");
    assert_eq!(claims.exp - claims.iat, 3600);
  }

  #[test]
  fn tampered_and_foreign_tokens_fail() {
    let tokens = service();
    let token = tokens.issue(1, Role::User, "alice").unwrap();
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", signed, flipped, &signature[1..]);
    assert!(matches!(tokens.verify(&tampered), Err(AppError::Auth(_))));

    let other = TokenService::new(b"another-secret", Duration::hours(1));
    assert!(other.verify(&token).is_err());
    assert!(tokens.verify("not-a-jwt").is_err());
  }

  #[test]
  fn expired_token_fails() {
    let tokens = service();
    let past = Utc::now() - Duration::hours(2);
    let stale = tokens
      .encode(&Claims {
        user_id: 1,
        role: Role::Admin,
        username: "admin".to_string(),
        iat: past.timestamp(),
        exp: (past + Duration::minutes(5)).timestamp(),
      })
      .unwrap();
    assert!(tokens.verify(&stale).is_err());
  }
}
