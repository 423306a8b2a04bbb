use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Cap on the `limit` query parameter of list endpoints.
    pub find_max_limit: i64,
    /// Cap on the number of tokens one generate call may create.
    pub max_tokens_per_batch: i64,
}

pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("FEEDBACK_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        Self {
            port,
            database_url: env::var("DATABASE_URL").ok(),
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5),
            find_max_limit: env_or("FIND_MAX_LIMIT", 1000),
            max_tokens_per_batch: env_or("MAX_TOKENS_PER_BATCH", 1000),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
