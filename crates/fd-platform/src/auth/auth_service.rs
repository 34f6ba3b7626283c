//! Authentication Service
//!
//! HMAC-signed JWT access tokens carrying the user name.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation, Algorithm};
use serde::{Deserialize, Serialize};

use crate::shared::error::{PlatformError, Result};

/// JWT Claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User name of the authenticated user
    pub user_name: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret
    pub secret_key: String,

    /// One of HS256, HS384, HS512
    pub algorithm: Algorithm,

    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,
}

impl TokenConfig {
    pub fn from_config(config: &fd_config::AuthConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm.to_uppercase())
            .map_err(|_| PlatformError::internal(format!(
                "Unsupported token algorithm: {}", config.algorithm
            )))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(PlatformError::internal(format!(
                "Token algorithm must be HMAC based, got {:?}", algorithm
            )));
        }

        Ok(Self {
            secret_key: config.secret_key.clone(),
            algorithm,
            access_token_expire_minutes: config.access_token_expire_minutes,
        })
    }
}

/// Authentication service for JWT operations
pub struct AuthService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Configured access token lifetime
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::minutes(self.config.access_token_expire_minutes)
    }

    /// Generate an access token valid for the configured lifetime
    pub fn generate_access_token(&self, user_name: &str) -> Result<String> {
        self.issue_token(user_name, self.access_token_lifetime())
    }

    /// Generate a token with an explicit lifetime, which may be negative
    pub fn issue_token(&self, user_name: &str, lifetime: Duration) -> Result<String> {
        let claims = AccessTokenClaims {
            user_name: user_name.to_string(),
            exp: (Utc::now() + lifetime).timestamp(),
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to encode token: {}", e)))
    }

    /// Validate and decode an access token
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = 0;

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: format!("{}", e) },
            })
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> AuthService {
        AuthService::new(TokenConfig {
            secret_key: secret.to_string(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = service("secret");
        let token = service.generate_access_token("alice").unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.user_name, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token() {
        let service = service("secret");
        let token = service.issue_token("alice", Duration::minutes(-5)).unwrap();

        assert!(matches!(service.validate_token(&token), Err(PlatformError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service("one").generate_access_token("alice").unwrap();

        assert!(matches!(
            service("two").validate_token(&token),
            Err(PlatformError::InvalidToken { .. })
        ));
        assert!(matches!(
            service("one").validate_token("not.a.token"),
            Err(PlatformError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_token_config_from_config() {
        let mut config = fd_config::AuthConfig {
            secret_key: "k".to_string(),
            ..Default::default()
        };
        config.algorithm = "hs512".to_string();
        assert_eq!(TokenConfig::from_config(&config).unwrap().algorithm, Algorithm::HS512);

        config.algorithm = "RS256".to_string();
        assert!(TokenConfig::from_config(&config).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
