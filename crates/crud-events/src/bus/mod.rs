//! Broker clients.
//!
//! - [`EventBus`]: the publish-one-message capability the pipeline consumes
//! - [`DaprBus`]: publishes through a Dapr sidecar's HTTP API
//! - [`MemoryBus`]: in-process broadcast bus for local runs and tests

pub mod dapr;
pub mod memory;

use async_trait::async_trait;

use crate::error::BusError;

pub use dapr::DaprBus;
pub use memory::{MemoryBus, PublishedEvent};

/// Publish primitive of a pub/sub broker.
///
/// One call is one delivery attempt; implementations do not retry.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish_event(&self, bus_name: &str, topic: &str, data: Vec<u8>)
    -> Result<(), BusError>;
}
