use uuid::Uuid;
use webhook_gateway_shared::clients::RedisClient;

#[derive(Debug, Clone, Copy)]
pub struct Admission {
    pub allowed: bool,
    pub remaining: u64,
    pub reset_in_seconds: i64,
}

/// Fixed-window counter keyed on `provider_id`. If Redis is unreachable this
/// fails open — an unenforced rate limit during a KV outage is a capacity
/// problem, not a correctness bug, so ingestion keeps flowing.
pub async fn admit(redis: &RedisClient, provider_id: Uuid, limit: u64, window_secs: u64) -> Admission {
    let key = format!("rate_limit:{provider_id}");
    match redis.rate_limit_check(&key, limit, window_secs).await {
        Ok((allowed, count)) => {
            let reset_in_seconds = redis.ttl(&key).await.unwrap_or(window_secs as i64).max(0);
            Admission {
                allowed,
                remaining: limit.saturating_sub(count),
                reset_in_seconds,
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, %provider_id, "rate limiter unreachable, failing open");
            Admission {
                allowed: true,
                remaining: limit,
                reset_in_seconds: window_secs as i64,
            }
        }
    }
}
