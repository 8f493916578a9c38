//! In-process revocation store.

use super::store::{RevocationStore, SessionError, SessionResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Revocation list held in process memory.
///
/// Revocations are lost on restart and invisible to other instances, so this
/// store is only correct for a single-instance deployment.
#[derive(Default)]
pub struct MemoryRevocationStore {
    revoked: Mutex<HashMap<String, Instant>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SessionResult<std::sync::MutexGuard<'_, HashMap<String, Instant>>> {
        self.revoked
            .lock()
            .map_err(|_| SessionError::Operation("revocation list lock poisoned".to_string()))
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> SessionResult<()> {
        let now = Instant::now();
        let mut revoked = self.lock()?;
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(jti.to_string(), now + Duration::from_secs(ttl_seconds.max(1)));
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> SessionResult<bool> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .get(jti)
            .is_some_and(|expires| *expires > now))
    }

    async fn health_check(&self) -> bool {
        self.revoked.lock().is_ok()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoke_then_check() {
        let store = MemoryRevocationStore::new();

        assert!(!store.is_revoked("abc").await.unwrap());
        store.revoke("abc", 60).await.unwrap();
        assert!(store.is_revoked("abc").await.unwrap());
        assert!(!store.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_health_and_backend() {
        let store = MemoryRevocationStore::new();
        assert!(store.health_check().await);
        assert_eq!(store.backend(), "memory");
    }
}
