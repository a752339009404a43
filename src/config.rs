// src/config.rs

use std::env;
use std::time::Duration;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub log_dir: String,
    pub cors_origins: Vec<String>,
    /// Upper bound for a single post/identity lookup made by the comment store.
    pub collaborator_timeout: Duration,
    pub demo_email: Option<String>,
    pub demo_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ]
            });

        let collaborator_timeout = env::var("COLLABORATOR_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(2));

        Self {
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            log_dir,
            cors_origins,
            collaborator_timeout,
            demo_email: env::var("DEMO_EMAIL").ok(),
            demo_password: env::var("DEMO_PASSWORD").ok(),
        }
    }

    /// Configuration for tests and embedding: no env lookups, no demo seed.
    pub fn for_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            port: 0,
            log_dir: "logs".to_string(),
            cors_origins: Vec::new(),
            collaborator_timeout: Duration::from_secs(2),
            demo_email: None,
            demo_password: None,
        }
    }
}
