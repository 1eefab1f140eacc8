// src/config.rs

use std::env;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Optional credentials for the admin user seeded at startup.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,

    /// Directory the filesystem blob store writes question payloads into.
    pub blob_dir: String,

    /// OpenAI-compatible chat completions endpoint and credentials.
    pub generation_base_url: String,
    pub generation_api_key: String,
    /// Model used for humanities / social-science subjects.
    pub model_humanities: String,
    /// Model used for everything else.
    pub model_quantitative: String,
    /// Upper bound on a single generation call, in seconds.
    pub generation_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let blob_dir = env::var("BLOB_DIR").unwrap_or_else(|_| "data/questions".to_string());

        let generation_base_url = env::var("GENERATION_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let generation_api_key =
            env::var("GENERATION_API_KEY").expect("GENERATION_API_KEY must be set");

        let model_humanities =
            env::var("MODEL_HUMANITIES").unwrap_or_else(|_| "gpt-4o".to_string());

        let model_quantitative =
            env::var("MODEL_QUANTITATIVE").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let generation_timeout_secs = env::var("GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            blob_dir,
            generation_base_url,
            generation_api_key,
            model_humanities,
            model_quantitative,
            generation_timeout_secs,
        }
    }
}
