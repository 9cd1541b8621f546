use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;
use webhook_gateway_shared::clients::DbPool;

use crate::audit;
use crate::models::ForwardingStatusUpdate;

const RESPONSE_BODY_TRUNCATE_BYTES: usize = 1024;
const ERROR_MESSAGE_TRUNCATE_BYTES: usize = 100;

/// Detached delivery: spawned by C7 after the inbound request is already
/// acknowledged, and it acquires its own pool checkout rather than sharing
/// the request's, since its lifetime outlives the HTTP response.
pub fn spawn(
    pool: DbPool,
    http_client: reqwest::Client,
    event_id: Uuid,
    payload: serde_json::Value,
    request_id: String,
    destination_url: String,
    max_retries: u32,
    timeout_secs: u64,
) {
    tokio::spawn(async move {
        deliver(
            &pool,
            &http_client,
            event_id,
            &payload,
            &request_id,
            &destination_url,
            max_retries,
            timeout_secs,
        )
        .await;
    });
}

async fn deliver(
    pool: &DbPool,
    http_client: &reqwest::Client,
    event_id: Uuid,
    payload: &serde_json::Value,
    request_id: &str,
    destination_url: &str,
    max_retries: u32,
    timeout_secs: u64,
) {
    let url = match reqwest::Url::parse(destination_url) {
        Ok(url) => url,
        Err(err) => {
            record_failure(pool, event_id, &format!("invalid destination url: {err}"));
            return;
        }
    };

    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(err) => {
            record_failure(pool, event_id, &format!("failed to serialize payload: {err}"));
            return;
        }
    };

    for attempt in 0..max_retries {
        let result = http_client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .header("X-Webhook-ID", event_id.to_string())
            .header("X-Request-ID", request_id)
            .timeout(Duration::from_secs(timeout_secs))
            .body(body.clone())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                let status = response.status().as_u16() as i32;
                let text = response.text().await.unwrap_or_default();
                record_success(pool, event_id, status, &text);
                return;
            }
            Ok(response) if response.status().is_client_error() => {
                let status = response.status().as_u16() as i32;
                let text = response.text().await.unwrap_or_default();
                tracing::warn!(%event_id, status, "forward rejected by destination, not retrying");
                record_client_error(pool, event_id, status, &text);
                return;
            }
            Ok(response) => {
                tracing::warn!(
                    %event_id,
                    status = response.status().as_u16(),
                    attempt = attempt + 1,
                    max_retries,
                    "forward attempt failed, will retry"
                );
            }
            Err(err) => {
                tracing::warn!(%event_id, error = %err, attempt = attempt + 1, max_retries, "forward attempt errored, will retry");
            }
        }

        if attempt + 1 < max_retries {
            tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
        }
    }

    record_failure(pool, event_id, "forward failed after exhausting retries");
}

fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        String::from_utf8_lossy(&s.as_bytes()[..max]).into_owned()
    }
}

fn record_success(pool: &DbPool, event_id: Uuid, status: i32, body: &str) {
    write_status(
        pool,
        event_id,
        ForwardingStatusUpdate {
            forwarded: true,
            response_status: Some(status),
            response_body: Some(truncate_bytes(body, RESPONSE_BODY_TRUNCATE_BYTES)),
            error_message: None,
            forwarded_at: Some(Utc::now()),
        },
    );
}

fn record_client_error(pool: &DbPool, event_id: Uuid, status: i32, body: &str) {
    write_status(
        pool,
        event_id,
        ForwardingStatusUpdate {
            forwarded: false,
            response_status: Some(status),
            response_body: Some(truncate_bytes(body, RESPONSE_BODY_TRUNCATE_BYTES)),
            error_message: Some(format!("destination returned {status}")),
            forwarded_at: Some(Utc::now()),
        },
    );
}

fn record_failure(pool: &DbPool, event_id: Uuid, message: &str) {
    write_status(
        pool,
        event_id,
        ForwardingStatusUpdate {
            forwarded: false,
            response_status: None,
            response_body: None,
            error_message: Some(truncate_bytes(message, ERROR_MESSAGE_TRUNCATE_BYTES)),
            forwarded_at: Some(Utc::now()),
        },
    );
}

fn write_status(pool: &DbPool, event_id: Uuid, update: ForwardingStatusUpdate) {
    if let Err(err) = audit::update_forwarding_status(pool, event_id, update) {
        tracing::error!(%event_id, error = %err, "failed to persist forwarding status; event remains retryable via the admin plane");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_bytes_leaves_short_strings_untouched() {
        assert_eq!(truncate_bytes("short", 1024), "short");
    }

    #[test]
    fn truncate_bytes_cuts_at_the_byte_boundary() {
        let long = "a".repeat(2000);
        assert_eq!(truncate_bytes(&long, 1024).len(), 1024);
    }
}
