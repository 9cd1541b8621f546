use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
use webhook_gateway_shared::errors::{AppError, AppResult, ErrorCode};
use webhook_gateway_shared::middleware::AdminUser;
use webhook_gateway_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::audit;
use crate::models::Provider;
use crate::registry::{self, ProviderUpdate, RegistryError};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProviderRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "secret_key must not be empty"))]
    pub secret_key: String,
    #[validate(url(message = "forwarding_url must be an absolute URL"))]
    pub forwarding_url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProviderRequest {
    pub secret_key: Option<String>,
    #[validate(url(message = "forwarding_url must be an absolute URL"))]
    pub forwarding_url: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(body): Json<CreateProviderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Provider>>)> {
    body.validate().map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let provider = registry::create(&state.pool, &body.name, &body.secret_key, &body.forwarding_url)
        .map_err(registry_error_to_app_error)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(provider))))
}

pub async fn list_providers(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Provider>>>> {
    let (items, total) = registry::list(&state.pool, params.offset() as i64, params.limit() as i64)
        .map_err(registry_error_to_app_error)?;
    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &params))))
}

pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> AppResult<Json<ApiResponse<Provider>>> {
    let provider = registry::get_by_name(&state.pool, &name)
        .map_err(registry_error_to_app_error)?
        .ok_or_else(|| AppError::new(ErrorCode::ProviderNotFound, "provider not found"))?;
    Ok(Json(ApiResponse::ok(provider)))
}

pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(name): Path<String>,
    Json(body): Json<UpdateProviderRequest>,
) -> AppResult<Json<ApiResponse<Provider>>> {
    body.validate().map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let update = ProviderUpdate {
        secret_key: body.secret_key,
        forwarding_url: body.forwarding_url,
        is_active: body.is_active,
    };

    let provider = registry::update(&state.pool, &name, update)
        .map_err(registry_error_to_app_error)?
        .ok_or_else(|| AppError::new(ErrorCode::ProviderNotFound, "provider not found"))?;

    Ok(Json(ApiResponse::ok(provider)))
}

pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> Result<StatusCode, Response> {
    match registry::delete(&state.pool, &name) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(AppError::new(ErrorCode::ProviderNotFound, "provider not found").into_response()),
        Err(err) => Err(registry_error_to_app_error(err).into_response()),
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderStatsResponse {
    pub total_webhooks: i64,
    pub successful_webhooks: i64,
    pub failed_webhooks: i64,
    pub last_webhook_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn provider_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(name): Path<String>,
) -> AppResult<Json<ApiResponse<ProviderStatsResponse>>> {
    let provider = registry::get_by_name(&state.pool, &name)
        .map_err(registry_error_to_app_error)?
        .ok_or_else(|| AppError::new(ErrorCode::ProviderNotFound, "provider not found"))?;

    let stats = audit::provider_stats(&state.pool, provider.id)
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(ApiResponse::ok(ProviderStatsResponse {
        total_webhooks: stats.total_webhooks,
        successful_webhooks: stats.successful_webhooks,
        failed_webhooks: stats.failed_webhooks,
        last_webhook_at: stats.last_webhook_at,
    })))
}

fn registry_error_to_app_error(err: RegistryError) -> AppError {
    match err {
        RegistryError::NameTaken(name) => AppError::new(ErrorCode::ProviderNameTaken, format!("provider {name:?} already exists")),
        RegistryError::HasEvents => AppError::new(ErrorCode::ProviderHasEvents, "provider has webhook events and cannot be deleted"),
        RegistryError::Database(e) => AppError::internal(e.to_string()),
        RegistryError::Pool(e) => AppError::internal(e.to_string()),
    }
}
