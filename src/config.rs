use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

const DEVELOPMENT_JWT_SECRET: &str = "newsdesk-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub login_url: String,

    // CORS configuration
    pub cors_allowed_origins: String,

    // Content settings
    pub max_comment_length: usize,
    pub comments_initial_visible: usize,
    pub comments_load_more_batch: usize,

    // Feature flags
    pub enable_comments: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // 开发环境允许使用默认密钥，其余环境必须显式配置
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if environment == "development" => DEVELOPMENT_JWT_SECRET.to_string(),
            Err(e) => return Err(e).context("JWT_SECRET must be set"),
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT")?,
            environment,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://newsdesk.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS")?,

            jwt_secret,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .context("JWT_EXPIRY_HOURS")?,
            login_url: env::var("LOGIN_URL").unwrap_or_else(|_| "/accounts/login/".to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),

            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("MAX_COMMENT_LENGTH")?,
            comments_initial_visible: env::var("COMMENTS_INITIAL_VISIBLE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("COMMENTS_INITIAL_VISIBLE")?,
            comments_load_more_batch: env::var("COMMENTS_LOAD_MORE_BATCH")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("COMMENTS_LOAD_MORE_BATCH")?,

            enable_comments: env::var("ENABLE_COMMENTS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("ENABLE_COMMENTS")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            jwt_expiry_hours: 168,
            login_url: "/accounts/login/".to_string(),
            cors_allowed_origins: "http://localhost:3001".to_string(),
            max_comment_length: 5000,
            comments_initial_visible: 5,
            comments_load_more_batch: 10,
            enable_comments: true,
        }
    }
}
