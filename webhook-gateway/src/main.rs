use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use webhook_gateway::config::AppConfig;
use webhook_gateway::routes::{admin_logs, admin_providers, admin_webhooks, health, ingest};
use webhook_gateway::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    webhook_gateway_shared::middleware::init_tracing("webhook-gateway", &config.environment);

    let pool = webhook_gateway_shared::clients::db::create_pool(&config.database_url);
    let redis = webhook_gateway_shared::clients::RedisClient::connect(&config.redis_url).await?;
    let metrics_handle = webhook_gateway_shared::middleware::init_metrics();

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.forwarding_timeout_seconds))
        .build()?;

    let port = config.port;
    let max_payload_size_bytes = config.max_payload_size_bytes;
    let cors_origins = config.cors_origin_list();

    let state = Arc::new(AppState {
        config,
        pool,
        redis,
        http_client,
        metrics_handle,
    });

    let cors = build_cors_layer(&cors_origins);

    let admin_routes = Router::new()
        .route("/providers", post(admin_providers::create_provider).get(admin_providers::list_providers))
        .route(
            "/providers/:name",
            get(admin_providers::get_provider)
                .put(admin_providers::update_provider)
                .delete(admin_providers::delete_provider),
        )
        .route("/providers/:name/stats", get(admin_providers::provider_stats))
        .route("/webhooks", get(admin_webhooks::list_webhooks))
        .route("/webhooks/stats", get(admin_webhooks::webhook_stats))
        .route("/webhooks/:id", get(admin_webhooks::get_webhook))
        .route("/webhooks/:id/retry", post(admin_webhooks::retry_webhook))
        .route("/logs", get(admin_logs::list_logs))
        .route("/logs/stats", get(admin_logs::log_stats))
        .route("/logs/export", get(admin_logs::export_logs))
        .route("/logs/:id", get(admin_logs::get_log));

    let app = Router::new()
        .route("/webhooks/:provider_name", post(ingest::ingest_webhook))
        .nest("/admin", admin_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .layer(axum::middleware::from_fn(webhook_gateway_shared::middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_payload_size_bytes))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "webhook-gateway starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]))
}

/// Mirrors the common Tokio shutdown hook pattern: Ctrl-C everywhere, SIGTERM on Unix so
/// the process drains in place under an orchestrator that sends SIGTERM first.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining connections");
}
