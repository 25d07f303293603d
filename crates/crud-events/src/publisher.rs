use std::sync::Arc;

use crate::bus::EventBus;
use crate::error::PublishError;

/// Single best-effort hand-off of encoded bytes to the injected broker.
#[derive(Clone, Default)]
pub struct Publisher {
    client: Option<Arc<dyn EventBus>>,
}

impl Publisher {
    pub fn new(client: Option<Arc<dyn EventBus>>) -> Self {
        Self { client }
    }

    pub fn with_client(client: Arc<dyn EventBus>) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub async fn publish(
        &self,
        bus_name: &str,
        topic: &str,
        data: Vec<u8>,
    ) -> Result<(), PublishError> {
        let client = self.client.as_ref().ok_or(PublishError::BrokerUnavailable)?;
        client
            .publish_event(bus_name, topic, data)
            .await
            .map_err(|source| PublishError::Publish {
                bus_name: bus_name.to_string(),
                topic: topic.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("configured", &self.is_configured())
            .finish()
    }
}
