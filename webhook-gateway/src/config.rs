use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_jwt_secret_key")]
    pub jwt_secret_key: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: u64,

    #[serde(default = "default_admin_api_key")]
    pub admin_api_key: String,

    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u64,
    #[serde(default = "default_rate_limit_window_seconds")]
    pub rate_limit_window_seconds: u64,

    #[serde(default = "default_replay_protection_window_seconds")]
    pub replay_protection_window_seconds: u64,

    #[serde(default = "default_forwarding_timeout_seconds")]
    pub forwarding_timeout_seconds: u64,
    #[serde(default = "default_forwarding_max_retries")]
    pub forwarding_max_retries: u32,

    #[serde(default = "default_max_payload_size_bytes")]
    pub max_payload_size_bytes: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_port() -> u16 {
    8080
}
fn default_environment() -> String {
    "development".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_database_url() -> String {
    String::new()
}
fn default_redis_url() -> String {
    String::new()
}
fn default_jwt_secret_key() -> String {
    "development-secret-change-in-production".into()
}
fn default_jwt_algorithm() -> String {
    "HS256".into()
}
fn default_access_token_expire_minutes() -> u64 {
    60
}
fn default_admin_api_key() -> String {
    "development-admin-key-change-in-production".into()
}
fn default_rate_limit_max_requests() -> u64 {
    100
}
fn default_rate_limit_window_seconds() -> u64 {
    60
}
fn default_replay_protection_window_seconds() -> u64 {
    300
}
fn default_forwarding_timeout_seconds() -> u64 {
    10
}
fn default_forwarding_max_retries() -> u32 {
    3
}
fn default_max_payload_size_bytes() -> usize {
    1_000_000
}
fn default_cors_origins() -> String {
    "*".into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let settings: Self = config.try_deserialize().unwrap_or_else(|_| Self {
            port: default_port(),
            environment: default_environment(),
            debug: false,
            log_level: default_log_level(),
            database_url: default_database_url(),
            redis_url: default_redis_url(),
            jwt_secret_key: default_jwt_secret_key(),
            jwt_algorithm: default_jwt_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            admin_api_key: default_admin_api_key(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_seconds: default_rate_limit_window_seconds(),
            replay_protection_window_seconds: default_replay_protection_window_seconds(),
            forwarding_timeout_seconds: default_forwarding_timeout_seconds(),
            forwarding_max_retries: default_forwarding_max_retries(),
            max_payload_size_bytes: default_max_payload_size_bytes(),
            cors_origins: default_cors_origins(),
        });

        if settings.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL must be set");
        }
        if settings.redis_url.is_empty() {
            anyhow::bail!("REDIS_URL must be set");
        }

        Ok(settings)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_origins_splits_on_comma_and_trims() {
        let config = AppConfig {
            cors_origins: " http://a.test, http://b.test ".into(),
            ..default_test_config()
        };
        assert_eq!(config.cors_origin_list(), vec!["http://a.test", "http://b.test"]);
    }

    fn default_test_config() -> AppConfig {
        AppConfig {
            port: default_port(),
            environment: default_environment(),
            debug: false,
            log_level: default_log_level(),
            database_url: "postgres://localhost/test".into(),
            redis_url: "redis://localhost".into(),
            jwt_secret_key: default_jwt_secret_key(),
            jwt_algorithm: default_jwt_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            admin_api_key: default_admin_api_key(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_seconds: default_rate_limit_window_seconds(),
            replay_protection_window_seconds: default_replay_protection_window_seconds(),
            forwarding_timeout_seconds: default_forwarding_timeout_seconds(),
            forwarding_max_retries: default_forwarding_max_retries(),
            max_payload_size_bytes: default_max_payload_size_bytes(),
            cors_origins: default_cors_origins(),
        }
    }
}
