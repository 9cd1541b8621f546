use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use metrics::counter;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{self, Dependencies, IngestError, IngestRequest, TimestampProblem};
use crate::AppState;

#[derive(Debug, Serialize)]
struct AcceptedResponse {
    status: &'static str,
    message: String,
    webhook_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

pub async fn ingest_webhook(
    State(state): State<Arc<AppState>>,
    Path(provider_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature_header = header_str(&headers, "x-signature");
    let timestamp_header = header_str(&headers, "x-timestamp");
    let request_id_header = header_str(&headers, "x-request-id");
    let client_ip = client_ip_from_headers(&headers);
    let captured_headers = capture_headers(&headers);

    let req = IngestRequest {
        provider_name: &provider_name,
        signature_header,
        timestamp_header,
        request_id_header,
        raw_body: &body,
        headers: captured_headers,
        client_ip: &client_ip,
    };
    let deps = Dependencies {
        pool: &state.pool,
        redis: &state.redis,
        http_client: &state.http_client,
        config: &state.config,
    };

    match pipeline::ingest(req, deps).await {
        Ok(accepted) => {
            (
                StatusCode::ACCEPTED,
                Json(AcceptedResponse {
                    status: "accepted",
                    message: "webhook received".to_string(),
                    webhook_id: accepted.webhook_id,
                }),
            )
                .into_response()
        }
        Err(err) => {
            record_rejection_metric(&err);
            err.into_response()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn client_ip_from_headers(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn capture_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_lowercase(), v.to_string())))
        .collect()
}

fn record_rejection_metric(err: &IngestError) {
    let reason = match err {
        IngestError::InvalidSignature => Some("invalid_signature"),
        IngestError::Replay => Some("replay"),
        IngestError::RateLimited => Some("rate_limit"),
        _ => None,
    };
    if let Some(reason) = reason {
        counter!("webhook_ingestion_rejections_total", "reason" => reason).increment(1);
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            IngestError::MissingHeader(name) => (StatusCode::BAD_REQUEST, format!("missing required header: {name}")),
            IngestError::ProviderNotFound => (StatusCode::NOT_FOUND, "provider not found".to_string()),
            IngestError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded".to_string()),
            IngestError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid signature".to_string()),
            IngestError::InvalidTimestamp(problem) => (StatusCode::BAD_REQUEST, timestamp_detail(problem)),
            IngestError::Replay => (StatusCode::CONFLICT, "duplicate request id".to_string()),
            IngestError::MalformedJson => (StatusCode::BAD_REQUEST, "malformed JSON body".to_string()),
            IngestError::StoreFailure => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string()),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

fn timestamp_detail(problem: TimestampProblem) -> String {
    match problem {
        TimestampProblem::ParseFailure => "invalid X-Timestamp header".to_string(),
        TimestampProblem::TooOld => "X-Timestamp is outside the replay protection window".to_string(),
        TimestampProblem::InFuture => "X-Timestamp is in the future".to_string(),
    }
}
