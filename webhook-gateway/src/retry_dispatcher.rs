use uuid::Uuid;
use webhook_gateway_shared::clients::DbPool;

use crate::audit;
use crate::config::AppConfig;
use crate::forwarder;
use crate::registry;

#[derive(Debug)]
pub enum RetryError {
    EventNotFound,
    StoreFailure,
}

pub struct RetryAccepted {
    pub webhook_id: Uuid,
}

/// Operator-triggered re-delivery: clears the event's forwarding fields and
/// re-spawns C6 against the provider's *current* `forwarding_url`, not
/// whatever URL was configured when the event was first received.
pub async fn retry(
    pool: &DbPool,
    http_client: &reqwest::Client,
    config: &AppConfig,
    event_id: Uuid,
) -> Result<RetryAccepted, RetryError> {
    let event = audit::get_webhook_event(pool, event_id).map_err(|err| {
        tracing::error!(%event_id, error = %err, "failed to load webhook event for retry");
        RetryError::StoreFailure
    })?;
    let Some(event) = event else {
        return Err(RetryError::EventNotFound);
    };

    let provider = registry::get_by_id(pool, event.provider_id).map_err(|err| {
        tracing::error!(%event_id, error = %err, "failed to load provider for retry");
        RetryError::StoreFailure
    })?;
    let Some(provider) = provider else {
        return Err(RetryError::EventNotFound);
    };

    audit::reset_forwarding_status(pool, event_id).map_err(|err| {
        tracing::error!(%event_id, error = %err, "failed to reset forwarding status");
        RetryError::StoreFailure
    })?;

    forwarder::spawn(
        pool.clone(),
        http_client.clone(),
        event_id,
        event.payload,
        event.request_id,
        provider.forwarding_url,
        config.forwarding_max_retries,
        config.forwarding_timeout_seconds,
    );

    Ok(RetryAccepted { webhook_id: event_id })
}
