//! Revocation stores for admin session tokens.
//!
//! Session tokens are stateless; logging out records the token id in a
//! [`RevocationStore`] until the token would have expired anyway.
//! - [`RedisRevocationStore`] - Shared across instances
//! - [`MemoryRevocationStore`] - Single instance only, used when Redis is not configured

mod memory_store;
mod redis_store;
mod store;

pub use memory_store::MemoryRevocationStore;
pub use redis_store::RedisRevocationStore;
pub use store::{RevocationStore, SessionError, SessionResult};

#[cfg(test)]
pub use store::MockRevocationStore;
