use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

/// Checks the window counter against `limit` and only increments it if the
/// request would still be admitted, so a rejected request leaves the count
/// untouched. Returns `{1, count}` on admission, `{0, count}` on rejection.
const RATE_LIMIT_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current + 1 > tonumber(ARGV[1]) then
    return {0, current}
end
local updated = redis.call('INCR', KEYS[1])
if updated == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return {1, updated}
"#;

#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "connected to Redis");
        Ok(Self { conn })
    }

    /// Liveness probe for `/health` — anything short of a round-trip error counts as reachable.
    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    /// Atomic `SET key val NX EX ttl` — the replay store's test-and-set primitive (C2).
    /// Returns `true` iff this call claimed the key (first to see this request id).
    pub async fn set_nx(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, redis::RedisError> {
        let mut conn = self.conn.clone();
        let set: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(set.is_some())
    }

    /// Fixed-window rate limiter (C3): atomic check-then-increment via Lua script, so a
    /// request that would exceed `limit` is rejected without bumping the counter.
    pub async fn rate_limit_check(&self, key: &str, limit: u64, window_secs: u64) -> Result<(bool, u64), redis::RedisError> {
        let mut conn = self.conn.clone();
        let (allowed, count): (i64, i64) = Script::new(RATE_LIMIT_SCRIPT)
            .key(key)
            .arg(limit)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok((allowed == 1, count as u64))
    }

    pub async fn ttl(&self, key: &str) -> Result<i64, redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.ttl(key).await
    }
}
