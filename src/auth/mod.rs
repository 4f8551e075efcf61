use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod password;

pub use password::{PasswordError, PasswordHasher};

/// Signed claim set carried by every bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Absent, empty, or not a bearer credential
    #[error("Missing or malformed JWT")]
    Malformed,

    #[error("Expired JWT")]
    Expired,

    /// Could not be decoded, or failed signature or claim checks
    #[error("Invalid JWT")]
    Invalid,

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Issues and verifies HS256 tokens with a server-held secret
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, issued_at, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Malformed);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Verify the value of an `Authorization` header. The scheme is
    /// matched case-insensitively.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Claims, TokenError> {
        let token = header
            .and_then(|value| value.trim_start().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
            .map(|(_, token)| token)
            .ok_or(TokenError::Malformed)?;
        self.verify(token)
    }
}
