use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;
use webhook_gateway_shared::clients::{DbPool, RedisClient};

use crate::audit::{self, AuditError};
use crate::config::AppConfig;
use crate::forwarder;
use crate::registry;
use crate::security::{rate_limit, replay, signature};
use crate::security_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampProblem {
    ParseFailure,
    TooOld,
    InFuture,
}

impl TimestampProblem {
    pub fn security_event_type(self) -> &'static str {
        match self {
            Self::ParseFailure => "invalid_timestamp",
            Self::TooOld => "timestamp_too_old",
            Self::InFuture => "timestamp_in_future",
        }
    }
}

/// The ingestion pipeline's closed rejection set (§4.7). Never touches `axum`
/// types directly — translation to an HTTP response happens at the route
/// handler, the one place that is allowed to know about the wire format.
#[derive(Debug)]
pub enum IngestError {
    MissingHeader(&'static str),
    ProviderNotFound,
    RateLimited,
    InvalidSignature,
    InvalidTimestamp(TimestampProblem),
    Replay,
    MalformedJson,
    StoreFailure,
}

pub struct IngestRequest<'a> {
    pub provider_name: &'a str,
    pub signature_header: Option<&'a str>,
    pub timestamp_header: Option<&'a str>,
    pub request_id_header: Option<&'a str>,
    pub raw_body: &'a [u8],
    pub headers: HashMap<String, String>,
    pub client_ip: &'a str,
}

pub struct IngestAccepted {
    pub webhook_id: Uuid,
}

pub struct Dependencies<'a> {
    pub pool: &'a DbPool,
    pub redis: &'a RedisClient,
    pub http_client: &'a reqwest::Client,
    pub config: &'a AppConfig,
}

pub async fn ingest(req: IngestRequest<'_>, deps: Dependencies<'_>) -> Result<IngestAccepted, IngestError> {
    let signature_header = req.signature_header.ok_or(IngestError::MissingHeader("X-Signature"))?;
    let timestamp_header = req.timestamp_header.ok_or(IngestError::MissingHeader("X-Timestamp"))?;
    let request_id = req.request_id_header.ok_or(IngestError::MissingHeader("X-Request-ID"))?;

    // LOOKUP_PROVIDER (C5) — missing or inactive both read as "not found"; we
    // never disclose which to an unauthenticated caller.
    let provider = registry::lookup_by_name(deps.pool, req.provider_name)
        .map_err(|err| {
            tracing::error!(error = %err, "provider lookup failed");
            IngestError::StoreFailure
        })?
        .filter(|p| p.is_active)
        .ok_or(IngestError::ProviderNotFound)?;

    // RATE_LIMIT (C3) — keyed on provider id, before we spend any CPU on
    // signature verification.
    let admission = rate_limit::admit(
        deps.redis,
        provider.id,
        deps.config.rate_limit_max_requests,
        deps.config.rate_limit_window_seconds,
    )
    .await;
    if !admission.allowed {
        security_log::log(
            deps.pool,
            req.provider_name,
            "rate_limit_exceeded",
            req.client_ip,
            Some(request_id),
            None,
        );
        return Err(IngestError::RateLimited);
    }

    // AUTHENTICATE (C1) — over the raw captured body, never a re-serialization.
    if !signature::verify(req.raw_body, provider.secret_key.as_bytes(), signature_header) {
        security_log::log(
            deps.pool,
            req.provider_name,
            "invalid_signature",
            req.client_ip,
            Some(request_id),
            None,
        );
        return Err(IngestError::InvalidSignature);
    }

    // TIMESTAMP_CHECK
    if let Err(problem) = check_timestamp(timestamp_header, deps.config.replay_protection_window_seconds) {
        let details = timestamp_problem_details(timestamp_header, problem);
        security_log::log(
            deps.pool,
            req.provider_name,
            problem.security_event_type(),
            req.client_ip,
            Some(request_id),
            details,
        );
        return Err(IngestError::InvalidTimestamp(problem));
    }

    // REPLAY_CLAIM (C2)
    let claim = replay::claim(
        deps.redis,
        req.provider_name,
        request_id,
        deps.config.replay_protection_window_seconds,
    )
    .await;
    if claim == replay::Claim::Replay {
        security_log::log(
            deps.pool,
            req.provider_name,
            "replay_attempt",
            req.client_ip,
            Some(request_id),
            None,
        );
        return Err(IngestError::Replay);
    }

    // PARSE_JSON — not a security event, just a client error.
    let payload: serde_json::Value = serde_json::from_slice(req.raw_body).map_err(|_| IngestError::MalformedJson)?;

    let headers_json = serde_json::to_value(&req.headers).unwrap_or(serde_json::Value::Null);

    // PERSIST (C4)
    let event = audit::insert_webhook_event(deps.pool, provider.id, request_id, payload.clone(), headers_json)
        .map_err(|err| match err {
            AuditError::DuplicateRequestId => IngestError::Replay,
            _ => {
                tracing::error!(error = %err, "failed to persist webhook event");
                IngestError::StoreFailure
            }
        })?;

    // ENQUEUE_FORWARD — detached; outlives this request's response.
    forwarder::spawn(
        deps.pool.clone(),
        deps.http_client.clone(),
        event.id,
        payload,
        request_id.to_string(),
        provider.forwarding_url.clone(),
        deps.config.forwarding_max_retries,
        deps.config.forwarding_timeout_seconds,
    );

    Ok(IngestAccepted { webhook_id: event.id })
}

fn check_timestamp(raw: &str, window_secs: u64) -> Result<(), TimestampProblem> {
    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| TimestampProblem::ParseFailure)?;
    let ts = parsed.with_timezone(&Utc);
    let now = Utc::now();
    let diff = now - ts;

    if diff < Duration::zero() {
        return Err(TimestampProblem::InFuture);
    }
    if diff > Duration::seconds(window_secs as i64) {
        return Err(TimestampProblem::TooOld);
    }
    Ok(())
}

fn timestamp_problem_details(raw: &str, problem: TimestampProblem) -> Option<serde_json::Value> {
    match problem {
        TimestampProblem::TooOld => DateTime::parse_from_rfc3339(raw).ok().map(|ts| {
            let diff = (Utc::now() - ts.with_timezone(&Utc)).num_seconds();
            serde_json::json!({ "time_diff": diff })
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_recent_timestamp_passes() {
        let now = Utc::now().to_rfc3339();
        assert!(check_timestamp(&now, 300).is_ok());
    }

    #[test]
    fn an_unparseable_timestamp_is_rejected() {
        assert_eq!(check_timestamp("not-a-timestamp", 300), Err(TimestampProblem::ParseFailure));
    }

    #[test]
    fn a_stale_timestamp_is_rejected() {
        let stale = (Utc::now() - Duration::seconds(3600)).to_rfc3339();
        assert_eq!(check_timestamp(&stale, 300), Err(TimestampProblem::TooOld));
    }

    #[test]
    fn a_future_timestamp_is_rejected() {
        let future = (Utc::now() + Duration::seconds(60)).to_rfc3339();
        assert_eq!(check_timestamp(&future, 300), Err(TimestampProblem::InFuture));
    }

    #[test]
    fn a_trailing_z_timestamp_is_accepted_as_utc() {
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        assert!(check_timestamp(&now, 300).is_ok());
    }
}
