use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::EventBus;
use crate::error::BusError;

/// Default buffer size for the broadcast channel.
/// Slow receivers lose the oldest events once this many are queued.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// An event as it was handed to the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub bus_name: String,
    pub topic: String,
    pub data: Vec<u8>,
}

/// In-process bus delivering every published event to all subscribers.
///
/// Publishing with no subscribers succeeds and the event is dropped.
#[derive(Clone)]
pub struct MemoryBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Bus buffering up to `capacity` events per lagging subscriber.
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl EventBus for MemoryBus {
    async fn publish_event(
        &self,
        bus_name: &str,
        topic: &str,
        data: Vec<u8>,
    ) -> Result<(), BusError> {
        let delivered = self
            .sender
            .send(PublishedEvent {
                bus_name: bus_name.to_string(),
                topic: topic.to_string(),
                data,
            })
            .unwrap_or_default();
        tracing::trace!(bus_name, topic, delivered, "Published to memory bus");
        Ok(())
    }
}
