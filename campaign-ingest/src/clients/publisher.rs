use anyhow::{Error, Result};
use async_trait::async_trait;

/// Sink for serialized messages. Shared across concurrent requests.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Resolves once the broker has accepted the payload.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error>;

    async fn health_check(&self) -> Result<(), Error>;
}
