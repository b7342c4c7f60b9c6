use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT service for admin session tokens (HS256).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_minutes: i64,
}

/// Claims for admin session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject (admin ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl JwtService {
    pub fn new(secret: &str, token_expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_minutes,
        }
    }

    pub fn generate_token(&self, admin_id: &str, email: &str) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.token_expiry_minutes);

        let claims = AdminClaims {
            sub: admin_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode admin token: {}", e))
    }

    pub fn validate_token(&self, token: &str) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
        let data = decode::<AdminClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    pub fn token_expiry_seconds(&self) -> i64 {
        self.token_expiry_minutes * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let jwt = JwtService::new("test-secret", 60);
        let token = jwt
            .generate_token("9f6c1a1e-0000-0000-0000-000000000000", "admin@example.com")
            .expect("generate");

        let claims = jwt.validate_token(&token).expect("validate");
        assert_eq!(claims.sub, "9f6c1a1e-0000-0000-0000-000000000000");
        assert_eq!(claims.email, "admin@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let jwt = JwtService::new("test-secret", 60);
        let other = JwtService::new("other-secret", 60);
        let token = other
            .generate_token("admin-id", "admin@example.com")
            .expect("generate");

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = JwtService::new("test-secret", 60);
        assert!(jwt.validate_token("not-a-token").is_err());
    }
}
