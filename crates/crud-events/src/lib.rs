//! Server-side interception layer publishing CRUD change events.
//!
//! Handled unary calls are captured, tagged with the schema descriptor the
//! registry issued for their message type, wrapped in an [`Envelope`] and
//! handed to a pub/sub broker. The call's own result is never altered by
//! anything that happens after the handler returns.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crud_events::{DescriptorStore, EventInterceptor, EventsConfig, RegistryClient};
//! use crud_events::bus::{DaprBus, EventBus};
//!
//! let store = DescriptorStore::new_shared();
//! let registry = RegistryClient::new(&config.registry, store.clone())?;
//! registry.register_message("app1", "pkgA", "Widget", "./widget.schema").await?;
//!
//! let bus: Arc<dyn EventBus> = Arc::new(DaprBus::from_config(&config.broker)?);
//! let interceptor = EventInterceptor::new(config.events.clone(), store, Some(bus))?;
//!
//! let service = tower::ServiceBuilder::new()
//!     .layer(interceptor.layer())
//!     .service(widget_service);
//! ```

pub mod bus;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod error;
pub mod interceptor;
pub mod layer;
pub mod publisher;
pub mod registry;
pub mod store;

pub use bus::{DaprBus, EventBus, MemoryBus, PublishedEvent};
pub use codec::{Codec, JsonCodec};
pub use config::{CrudEventsConfig, DispatchMode, EventsConfig, load_config, read_config};
pub use descriptor::{ChangeMessage, DescriptorKey, MessageDescriptor};
pub use envelope::Envelope;
pub use error::{
    BusError, CodecError, ConfigError, EmitError, PublishError, RegistryError, SetupError,
    StoreError,
};
pub use interceptor::EventInterceptor;
pub use layer::{CrudEventsLayer, CrudEventsService};
pub use publisher::Publisher;
pub use registry::{MessageDetails, RegistryClient, SchemaAnnouncement};
pub use store::DescriptorStore;
