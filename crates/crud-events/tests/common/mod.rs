#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crud_events::{BusError, ChangeMessage, EventBus, EventsConfig, PublishedEvent};

pub const WIDGET_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Request type registered as `pkgA.Widget`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWidget {
    pub name: String,
    pub quantity: u32,
}

impl ChangeMessage for CreateWidget {
    const MESSAGE_TYPE: &'static str = "pkgA.Widget";
}

pub fn widget(name: &str) -> CreateWidget {
    CreateWidget {
        name: name.to_string(),
        quantity: 3,
    }
}

/// Request type nobody registers.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteGadget {
    pub id: u64,
}

impl ChangeMessage for DeleteGadget {
    const MESSAGE_TYPE: &'static str = "pkgA.Gadget";
}

/// Request type JSON cannot encode (non-string map keys).
#[derive(Debug, Clone, Serialize)]
pub struct BrokenRequest {
    pub grid: HashMap<(u8, u8), String>,
}

impl ChangeMessage for BrokenRequest {
    const MESSAGE_TYPE: &'static str = "pkgA.Broken";
}

pub fn broken_request() -> BrokenRequest {
    let mut grid = HashMap::new();
    grid.insert((0, 0), "origin".to_string());
    BrokenRequest { grid }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetResponse {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerError(pub String);

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler failed: {}", self.0)
    }
}

impl std::error::Error for HandlerError {}

/// Bus that records every publish call, optionally failing each one.
#[derive(Default)]
pub struct RecordingBus {
    calls: Mutex<Vec<PublishedEvent>>,
    fail: bool,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<PublishedEvent> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish_event(
        &self,
        bus_name: &str,
        topic: &str,
        data: Vec<u8>,
    ) -> Result<(), BusError> {
        self.calls.lock().unwrap().push(PublishedEvent {
            bus_name: bus_name.to_string(),
            topic: topic.to_string(),
            data,
        });
        if self.fail {
            return Err(BusError::Http("connection refused".into()));
        }
        Ok(())
    }
}

pub fn events_config(handle_only_successful: bool) -> EventsConfig {
    EventsConfig::new("app1", "pubsub", "crud", handle_only_successful)
}
