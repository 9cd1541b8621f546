pub mod audit;
pub mod config;
pub mod forwarder;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod retry_dispatcher;
pub mod routes;
pub mod schema;
pub mod security;
pub mod security_log;

use webhook_gateway_shared::clients::{DbPool, RedisClient};
use webhook_gateway_shared::middleware::AdminSecretProvider;

use config::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    pub pool: DbPool,
    pub redis: RedisClient,
    pub http_client: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AdminSecretProvider for AppState {
    fn admin_secret(&self) -> &str {
        &self.config.admin_api_key
    }
}
