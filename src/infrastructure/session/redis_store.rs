//! Redis-backed revocation store.

use super::store::{RevocationStore, SessionError, SessionResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info};

/// Revocation list kept in Redis with per-entry expiry (`SET key 1 EX ttl`).
///
/// Shared by every instance pointing at the same Redis, so a logout takes
/// effect cluster-wide.
pub struct RedisRevocationStore {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisRevocationStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connection`] if the URL is invalid or Redis is unreachable.
    pub async fn connect(redis_url: &str) -> SessionResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| SessionError::Connection(format!("Failed to create Redis client: {e}")))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| SessionError::Connection(format!("Failed to connect to Redis: {e}")))?;

        let mut probe = manager.clone();
        probe
            .ping::<()>()
            .await
            .map_err(|e| SessionError::Connection(format!("Redis PING failed: {e}")))?;

        info!("Connected to Redis session store");

        Ok(Self {
            client: manager,
            key_prefix: "session:revoked:".to_string(),
        })
    }

    fn build_key(&self, jti: &str) -> String {
        format!("{}{}", self.key_prefix, jti)
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> SessionResult<()> {
        let key = self.build_key(jti);
        let mut conn = self.client.clone();

        conn.set_ex::<_, _, ()>(&key, 1u8, ttl_seconds.max(1))
            .await
            .map_err(|e| SessionError::Operation(format!("SET {key}: {e}")))?;

        debug!(jti, ttl_seconds, "Session revoked");
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> SessionResult<bool> {
        let key = self.build_key(jti);
        let mut conn = self.client.clone();

        conn.exists::<_, bool>(&key)
            .await
            .map_err(|e| SessionError::Operation(format!("EXISTS {key}: {e}")))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
