//! Authentication Service
//!
//! Validates the bearer tokens presented on REST calls and real-time
//! handshakes. Tokens are HS256 JWTs whose `user_guid` claim carries the
//! caller's user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::shared::error::AppError;

/// Authentication service trait for dependency injection
pub trait AuthService: Send + Sync {
    /// Validate an access token and extract the user id
    fn validate_token(&self, access_token: &str) -> Result<Uuid, AuthError>;

    /// Issue an access token for a user
    fn issue_access_token(&self, user_id: Uuid) -> Result<AuthTokens, AuthError>;
}

/// Issued access token
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub user_guid: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(msg) => AppError::Internal(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

/// AuthService implementation backed by a shared HMAC secret
pub struct JwtAuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    jwt_settings: JwtSettings,
}

impl JwtAuthService {
    pub fn new(jwt_settings: JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_settings.secret.as_bytes()),
            jwt_settings,
        }
    }

    /// Decode and validate access token
    fn decode_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }
}

impl AuthService for JwtAuthService {
    fn validate_token(&self, access_token: &str) -> Result<Uuid, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.decode_access_token(access_token)?;

        Uuid::parse_str(&claims.user_guid).map_err(|_| AuthError::InvalidToken)
    }

    fn issue_access_token(&self, user_id: Uuid) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.jwt_settings.access_token_expiry_minutes);

        let claims = Claims {
            user_guid: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            expires_in: self.jwt_settings.access_token_expiry_minutes * 60,
            token_type: "Bearer".to_string(),
        })
    }
}
