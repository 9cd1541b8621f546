use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;
use webhook_gateway_shared::clients::DbPool;

use crate::models::{
    ForwardingStatusUpdate, NewSecurityEvent, NewWebhookEvent, SecurityEvent, WebhookEvent,
};
use crate::schema::{security_logs, webhook_events};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("a webhook event with this request id already exists")]
    DuplicateRequestId,
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

fn is_unique_violation(err: &diesel::result::Error) -> bool {
    matches!(
        err,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    )
}

pub fn insert_webhook_event(
    pool: &DbPool,
    provider_id: Uuid,
    request_id: &str,
    payload: serde_json::Value,
    headers: serde_json::Value,
) -> Result<WebhookEvent, AuditError> {
    let mut conn = pool.get()?;
    let new_event = NewWebhookEvent {
        provider_id,
        request_id: request_id.to_string(),
        payload,
        headers,
        signature_valid: true,
    };

    diesel::insert_into(webhook_events::table)
        .values(&new_event)
        .get_result(&mut conn)
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuditError::DuplicateRequestId
            } else {
                AuditError::Database(err)
            }
        })
}

pub fn update_forwarding_status(
    pool: &DbPool,
    event_id: Uuid,
    update: ForwardingStatusUpdate,
) -> Result<(), AuditError> {
    let mut conn = pool.get()?;
    diesel::update(webhook_events::table.find(event_id))
        .set(&update)
        .execute(&mut conn)?;
    Ok(())
}

pub fn reset_forwarding_status(pool: &DbPool, event_id: Uuid) -> Result<(), AuditError> {
    update_forwarding_status(
        pool,
        event_id,
        ForwardingStatusUpdate {
            forwarded: false,
            response_status: None,
            response_body: None,
            error_message: None,
            forwarded_at: None,
        },
    )
}

pub fn insert_security_event(
    pool: &DbPool,
    provider_name: &str,
    event_type: &str,
    ip_address: &str,
    request_id: Option<&str>,
    details: Option<serde_json::Value>,
) -> Result<(), AuditError> {
    let mut conn = pool.get()?;
    let new_event = NewSecurityEvent {
        provider_name: provider_name.to_string(),
        event_type: event_type.to_string(),
        ip_address: ip_address.to_string(),
        request_id: request_id.map(str::to_string),
        details,
    };
    diesel::insert_into(security_logs::table)
        .values(&new_event)
        .execute(&mut conn)?;
    Ok(())
}

pub fn get_webhook_event(pool: &DbPool, id: Uuid) -> Result<Option<WebhookEvent>, AuditError> {
    let mut conn = pool.get()?;
    webhook_events::table
        .find(id)
        .first::<WebhookEvent>(&mut conn)
        .optional()
        .map_err(AuditError::from)
}

pub fn list_webhook_events(
    pool: &DbPool,
    provider_name: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<WebhookEvent>, i64), AuditError> {
    use crate::schema::providers;

    let mut conn = pool.get()?;

    let provider_id = match provider_name {
        Some(name) => {
            let id: Option<Uuid> = providers::table
                .filter(providers::name.eq(name))
                .select(providers::id)
                .first(&mut conn)
                .optional()?;
            match id {
                Some(id) => Some(id),
                None => return Ok((vec![], 0)),
            }
        }
        None => None,
    };

    let (items, total) = if let Some(provider_id) = provider_id {
        let items = webhook_events::table
            .filter(webhook_events::provider_id.eq(provider_id))
            .order(webhook_events::received_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<WebhookEvent>(&mut conn)?;
        let total = webhook_events::table
            .filter(webhook_events::provider_id.eq(provider_id))
            .count()
            .get_result(&mut conn)?;
        (items, total)
    } else {
        let items = webhook_events::table
            .order(webhook_events::received_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<WebhookEvent>(&mut conn)?;
        let total = webhook_events::table.count().get_result(&mut conn)?;
        (items, total)
    };

    Ok((items, total))
}

#[derive(Debug, Serialize)]
pub struct ProviderStats {
    pub total_webhooks: i64,
    pub successful_webhooks: i64,
    pub failed_webhooks: i64,
    pub last_webhook_at: Option<DateTime<Utc>>,
}

pub fn provider_stats(pool: &DbPool, provider_id: Uuid) -> Result<ProviderStats, AuditError> {
    let mut conn = pool.get()?;
    let events: Vec<WebhookEvent> = webhook_events::table
        .filter(webhook_events::provider_id.eq(provider_id))
        .load(&mut conn)?;

    let total_webhooks = events.len() as i64;
    let successful_webhooks = events.iter().filter(|e| e.forwarded).count() as i64;
    let failed_webhooks = events
        .iter()
        .filter(|e| !e.forwarded && e.forwarded_at.is_some())
        .count() as i64;
    let last_webhook_at = events.iter().map(|e| e.received_at).max();

    Ok(ProviderStats {
        total_webhooks,
        successful_webhooks,
        failed_webhooks,
        last_webhook_at,
    })
}

#[derive(Debug, Serialize)]
pub struct WebhookStats {
    pub total: i64,
    pub successful: i64,
    pub failed: i64,
    pub pending: i64,
    pub avg_response_time_secs: Option<f64>,
}

pub fn webhook_event_stats(pool: &DbPool, provider_name: Option<&str>) -> Result<WebhookStats, AuditError> {
    use crate::schema::providers;

    let mut conn = pool.get()?;

    let provider_id: Option<Uuid> = match provider_name {
        Some(name) => providers::table
            .filter(providers::name.eq(name))
            .select(providers::id)
            .first(&mut conn)
            .optional()?,
        None => None,
    };

    let events: Vec<WebhookEvent> = match provider_id {
        Some(id) => webhook_events::table
            .filter(webhook_events::provider_id.eq(id))
            .load(&mut conn)?,
        None => webhook_events::table.load(&mut conn)?,
    };

    let total = events.len() as i64;
    let successful = events.iter().filter(|e| e.forwarded).count() as i64;
    let pending = events
        .iter()
        .filter(|e| !e.forwarded && e.forwarded_at.is_none())
        .count() as i64;
    let failed = total - successful - pending;

    let durations: Vec<f64> = events
        .iter()
        .filter_map(|e| e.forwarded_at.map(|at| (at - e.received_at).num_milliseconds() as f64 / 1000.0))
        .collect();
    let avg_response_time_secs = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    Ok(WebhookStats {
        total,
        successful,
        failed,
        pending,
        avg_response_time_secs,
    })
}

#[derive(Debug, Default, Clone)]
pub struct SecurityLogFilter {
    pub event_type: Option<String>,
    pub provider_name: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

fn apply_security_log_filters<'a>(
    mut query: security_logs::BoxedQuery<'a, diesel::pg::Pg>,
    filter: &SecurityLogFilter,
) -> security_logs::BoxedQuery<'a, diesel::pg::Pg> {
    if let Some(event_type) = filter.event_type.clone() {
        query = query.filter(security_logs::event_type.eq(event_type));
    }
    if let Some(provider_name) = filter.provider_name.clone() {
        query = query.filter(security_logs::provider_name.eq(provider_name));
    }
    if let Some(date_from) = filter.date_from {
        query = query.filter(security_logs::created_at.ge(date_from));
    }
    if let Some(date_to) = filter.date_to {
        query = query.filter(security_logs::created_at.le(date_to));
    }
    query
}

pub fn list_security_events(
    pool: &DbPool,
    filter: &SecurityLogFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<SecurityEvent>, i64), AuditError> {
    let mut conn = pool.get()?;

    let items = apply_security_log_filters(security_logs::table.into_boxed(), filter)
        .order(security_logs::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<SecurityEvent>(&mut conn)?;

    let total = apply_security_log_filters(security_logs::table.into_boxed(), filter)
        .count()
        .get_result(&mut conn)?;

    Ok((items, total))
}

/// Same filters as `list_security_events`, capped and unpaginated, for CSV export.
pub fn security_events_for_export(
    pool: &DbPool,
    filter: &SecurityLogFilter,
    cap: i64,
) -> Result<Vec<SecurityEvent>, AuditError> {
    let mut conn = pool.get()?;
    let items = apply_security_log_filters(security_logs::table.into_boxed(), filter)
        .order(security_logs::created_at.desc())
        .limit(cap)
        .load::<SecurityEvent>(&mut conn)?;
    Ok(items)
}

pub fn get_security_event(pool: &DbPool, id: Uuid) -> Result<Option<SecurityEvent>, AuditError> {
    let mut conn = pool.get()?;
    security_logs::table
        .find(id)
        .first::<SecurityEvent>(&mut conn)
        .optional()
        .map_err(AuditError::from)
}

#[derive(Debug, Serialize)]
pub struct SecurityStats {
    pub total_events: i64,
    pub invalid_signatures: i64,
    pub rate_limit_events: i64,
    pub replay_attempts: i64,
    pub timestamp_errors: i64,
    pub events_by_type: std::collections::HashMap<String, i64>,
}

pub fn security_event_stats(pool: &DbPool) -> Result<SecurityStats, AuditError> {
    let mut conn = pool.get()?;
    let event_types: Vec<String> = security_logs::table
        .select(security_logs::event_type)
        .load(&mut conn)?;

    let mut events_by_type: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    for event_type in &event_types {
        *events_by_type.entry(event_type.clone()).or_insert(0) += 1;
    }

    let timestamp_kinds = ["invalid_timestamp", "timestamp_too_old", "timestamp_in_future"];

    Ok(SecurityStats {
        total_events: event_types.len() as i64,
        invalid_signatures: *events_by_type.get("invalid_signature").unwrap_or(&0),
        rate_limit_events: *events_by_type.get("rate_limit_exceeded").unwrap_or(&0),
        replay_attempts: *events_by_type.get("replay_attempt").unwrap_or(&0),
        timestamp_errors: timestamp_kinds
            .iter()
            .map(|kind| events_by_type.get(*kind).copied().unwrap_or(0))
            .sum(),
        events_by_type,
    })
}
