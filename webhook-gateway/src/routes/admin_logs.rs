use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use webhook_gateway_shared::errors::{AppError, AppResult, ErrorCode};
use webhook_gateway_shared::middleware::AdminUser;
use webhook_gateway_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::audit::{self, SecurityLogFilter, SecurityStats};
use crate::models::SecurityEvent;
use crate::routes::parse_id;
use crate::AppState;

/// Hard ceiling on export size — an operator pulling the whole table gets a
/// truncated file rather than a request that never returns.
const EXPORT_ROW_CAP: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct LogFilterQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub event_type: Option<String>,
    pub provider: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl LogFilterQuery {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }

    fn filter(&self) -> SecurityLogFilter {
        SecurityLogFilter {
            event_type: self.event_type.clone(),
            provider_name: self.provider.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<LogFilterQuery>,
) -> AppResult<Json<ApiResponse<Paginated<SecurityEvent>>>> {
    let pagination = query.pagination();
    let filter = query.filter();
    let (items, total) = audit::list_security_events(&state.pool, &filter, pagination.offset() as i64, pagination.limit() as i64)
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(ApiResponse::ok(Paginated::new(items, total as u64, &pagination))))
}

pub async fn log_stats(State(state): State<Arc<AppState>>, _admin: AdminUser) -> AppResult<Json<ApiResponse<SecurityStats>>> {
    let stats = audit::security_event_stats(&state.pool).map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn get_log(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<SecurityEvent>>> {
    let id = parse_id(&id, ErrorCode::BadRequest, "security log")?;
    let event = audit::get_security_event(&state.pool, id)
        .map_err(|e| AppError::internal(e.to_string()))?
        .ok_or_else(|| AppError::new(ErrorCode::SecurityLogNotFound, "security log not found"))?;
    Ok(Json(ApiResponse::ok(event)))
}

pub async fn export_logs(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<LogFilterQuery>,
) -> Response {
    let filter = query.filter();
    let events = match audit::security_events_for_export(&state.pool, &filter, EXPORT_ROW_CAP) {
        Ok(events) => events,
        Err(err) => return AppError::internal(err.to_string()).into_response(),
    };

    if events.len() as i64 == EXPORT_ROW_CAP {
        tracing::warn!(cap = EXPORT_ROW_CAP, "security log export truncated at row cap");
    }

    match encode_csv(&events) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"security_logs.csv\""),
            ],
            body,
        )
            .into_response(),
        Err(err) => AppError::internal(err.to_string()).into_response(),
    }
}

fn encode_csv(events: &[SecurityEvent]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(vec![]);
    writer.write_record(["ID", "Provider", "Event Type", "Client IP", "Request ID", "Created At"])?;
    for event in events {
        writer.write_record([
            event.id.to_string(),
            event.provider_name.clone(),
            event.event_type.clone(),
            event.ip_address.clone(),
            event.request_id.clone().unwrap_or_default(),
            event.created_at.to_rfc3339(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}
