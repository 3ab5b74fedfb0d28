use crate::error::ServiceError;
use chrono::Utc;
use common::model::user::UserProfile;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub user_name: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and checks HS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("keys", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
        }
    }

    pub fn issue(&self, user: &UserProfile) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            user_name: user.user_name.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.expires_in.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("rejected token: {}", e);
                ServiceError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserProfile {
        UserProfile {
            id: 7,
            name: "Ops".to_string(),
            user_name: "ops".to_string(),
            email: None,
            mobile: None,
            status: 1,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new("k", Duration::from_secs(60));
        let claims = issuer.verify(&issuer.issue(&user()).unwrap()).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.user_name, "ops");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenIssuer::new("ours", Duration::from_secs(60));
        let theirs = TokenIssuer::new("theirs", Duration::from_secs(60));
        let token = theirs.issue(&user()).unwrap();
        assert!(matches!(ours.verify(&token), Err(ServiceError::Unauthorized(_))));
        assert!(ours.verify("not-a-jwt").is_err());
    }
}
