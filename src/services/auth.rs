use crate::{config::Config, error::{AppError, Result}};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // 用户ID
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    pub exp: i64,           // 过期时间
    pub iat: i64,           // 签发时间
}

/// An authenticated visitor, as asserted by a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_staff: bool,
}

impl User {
    /// Authors manage their own comments; staff may remove anyone's.
    pub fn can_delete(&self, author_id: &str) -> bool {
        self.id == author_id || self.is_staff
    }

    pub fn can_edit(&self, author_id: &str) -> bool {
        self.id == author_id
    }
}

impl From<Claims> for User {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            is_staff: claims.is_staff,
        }
    }
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::hours(config.jwt_expiry_hours),
        }
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    /// Signs a token for a user already authenticated by the login front-end.
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            is_staff: user.is_staff,
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn authenticate(&self, token: &str) -> Result<User> {
        self.verify_jwt(token).map(User::from)
    }
}
