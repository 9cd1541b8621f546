use webhook_gateway_shared::clients::RedisClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Fresh,
    Replay,
}

/// Claims `(provider_name, request_id)` against the replay store. Two concurrent
/// claims on the same key race on Redis's `SET ... NX`, so exactly one sees
/// `Fresh`. If Redis is unreachable this fails closed — we cannot deduplicate,
/// so we cannot accept.
pub async fn claim(redis: &RedisClient, provider_name: &str, request_id: &str, ttl_secs: u64) -> Claim {
    let key = format!("webhook:{provider_name}:{request_id}");
    match redis.set_nx(&key, "1", ttl_secs).await {
        Ok(true) => Claim::Fresh,
        Ok(false) => Claim::Replay,
        Err(err) => {
            tracing::error!(error = %err, provider_name, request_id, "replay store unreachable, failing closed");
            Claim::Replay
        }
    }
}
