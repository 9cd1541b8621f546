use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use webhook_gateway_shared::errors::{AppError, AppResult, ErrorCode};
use webhook_gateway_shared::middleware::AdminUser;
use webhook_gateway_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::audit::{self, WebhookStats};
use crate::models::WebhookEvent;
use crate::retry_dispatcher::{self, RetryError};
use crate::routes::parse_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListWebhooksQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub provider: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl ListWebhooksQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub async fn list_webhooks(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListWebhooksQuery>,
) -> AppResult<Json<ApiResponse<Paginated<WebhookEvent>>>> {
    let pagination = query.pagination();
    let (items, total) = audit::list_webhook_events(
        &state.pool,
        query.provider.as_deref(),
        pagination.offset() as i64,
        pagination.limit() as i64,
    )
    .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

#[derive(Debug, Deserialize)]
pub struct WebhookStatsQuery {
    pub provider: Option<String>,
}

pub async fn webhook_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<WebhookStatsQuery>,
) -> AppResult<Json<ApiResponse<WebhookStats>>> {
    let stats = audit::webhook_event_stats(&state.pool, query.provider.as_deref())
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<WebhookEvent>>> {
    let id = parse_id(&id, ErrorCode::InvalidWebhookId, "webhook")?;
    let event = audit::get_webhook_event(&state.pool, id)
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::new(ErrorCode::WebhookNotFound, "webhook event not found"))?;
    Ok(Json(ApiResponse::ok(event)))
}

/// Not wrapped in the admin plane's `{success,data}` envelope — §10.3 carves this
/// endpoint out to mirror the ingestion `202` shape, since a retry re-enqueues the
/// event for forwarding exactly like the original accept did.
pub async fn retry_webhook(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id, ErrorCode::InvalidWebhookId, "webhook") {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match retry_dispatcher::retry(&state.pool, &state.http_client, &state.config, id).await {
        Ok(accepted) => (
            StatusCode::ACCEPTED,
            Json(RetryResponse {
                status: "accepted",
                message: "webhook retry accepted".to_string(),
                webhook_id: accepted.webhook_id,
            }),
        )
            .into_response(),
        Err(RetryError::EventNotFound) => AppError::new(ErrorCode::WebhookNotFound, "webhook event not found").into_response(),
        Err(RetryError::StoreFailure) => AppError::internal("failed to requeue webhook for delivery").into_response(),
    }
}

#[derive(Debug, serde::Serialize)]
struct RetryResponse {
    status: &'static str,
    message: String,
    webhook_id: Uuid,
}
