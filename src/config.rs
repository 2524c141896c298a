use std::env;

use tracing::warn;

pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Email relay endpoint; notifications are skipped when unset.
    pub notify_url: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            bind_addr: with_default("BIND_ADDR", "127.0.0.1:8000"),
            notify_url: env::var("NOTIFY_URL").ok(),
        }
    }
}

fn with_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{key} not set, using default: {default}");
        default.to_string()
    })
}
