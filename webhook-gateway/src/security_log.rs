use webhook_gateway_shared::clients::DbPool;

use crate::audit;

/// Best-effort append of a defense trigger. A failure here must never affect
/// an HTTP response that has already been decided — it is logged and dropped.
pub fn log(
    pool: &DbPool,
    provider_name: &str,
    event_type: &str,
    ip_address: &str,
    request_id: Option<&str>,
    details: Option<serde_json::Value>,
) {
    if let Err(err) = audit::insert_security_event(pool, provider_name, event_type, ip_address, request_id, details) {
        tracing::error!(error = %err, provider_name, event_type, "failed to persist security event");
    }
}
