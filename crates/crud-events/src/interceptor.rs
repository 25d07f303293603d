//! Unary-call interceptor that turns handled requests into change events.
//!
//! Per call:
//!
//! 1. the handler runs with the original request and its result is kept
//! 2. a failed call stops here when only successful calls are handled
//! 3. the request is encoded
//! 4. its descriptor is looked up under `<application>.<message type>`
//! 5. the envelope is built and encoded
//! 6. the envelope is published on the configured bus and topic
//! 7. the result from step 1 is returned untouched
//!
//! Failures in steps 3 to 6 are logged and dropped. An unregistered message
//! type is skipped at debug level.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::bus::EventBus;
use crate::codec::{Codec, JsonCodec};
use crate::config::{DispatchMode, EventsConfig};
use crate::descriptor::{ChangeMessage, DescriptorKey};
use crate::envelope::Envelope;
use crate::error::{EmitError, SetupError};
use crate::layer::CrudEventsLayer;
use crate::publisher::Publisher;
use crate::store::DescriptorStore;

pub struct EventInterceptor<C = JsonCodec> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    settings: EventsConfig,
    store: Arc<DescriptorStore>,
    publisher: Publisher,
    codec: C,
}

impl<C> Clone for EventInterceptor<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl EventInterceptor<JsonCodec> {
    /// Create an interceptor encoding with [`JsonCodec`].
    ///
    /// # Errors
    ///
    /// Fails with [`SetupError::MissingBroker`] when `broker` is `None`, and
    /// with [`SetupError::InvalidSettings`] when `settings` does not validate.
    pub fn new(
        settings: EventsConfig,
        store: Arc<DescriptorStore>,
        broker: Option<Arc<dyn EventBus>>,
    ) -> Result<Self, SetupError> {
        Self::with_codec(settings, store, broker, JsonCodec)
    }
}

impl<C: Codec> EventInterceptor<C> {
    pub fn with_codec(
        settings: EventsConfig,
        store: Arc<DescriptorStore>,
        broker: Option<Arc<dyn EventBus>>,
        codec: C,
    ) -> Result<Self, SetupError> {
        let Some(broker) = broker else {
            tracing::error!("Broker client is invalid, cannot create CRUD event interceptor");
            return Err(SetupError::MissingBroker);
        };
        settings
            .validate()
            .map_err(|e| SetupError::InvalidSettings(e.to_string()))?;

        tracing::debug!(
            application_id = %settings.application_id,
            bus_name = %settings.bus_name,
            topic = %settings.topic,
            handle_only_successful = settings.handle_only_successful,
            dispatch = ?settings.dispatch,
            "CRUD event interceptor created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                store,
                publisher: Publisher::with_client(broker),
                codec,
            }),
        })
    }

    pub fn settings(&self) -> &EventsConfig {
        &self.inner.settings
    }

    pub fn store(&self) -> &Arc<DescriptorStore> {
        &self.inner.store
    }

    /// Tower layer applying this interceptor to a service.
    pub fn layer(&self) -> CrudEventsLayer<C> {
        CrudEventsLayer::new(self.clone())
    }

    /// Run `handler` for `request` and emit a change event for it.
    ///
    /// The handler's result is returned exactly as produced. In
    /// [`DispatchMode::Inline`] the publish attempt completes before this
    /// returns; in [`DispatchMode::Background`] it is spawned on the current
    /// tokio runtime.
    pub async fn intercept<Req, Resp, E, F, Fut>(
        &self,
        request: Req,
        handler: F,
    ) -> Result<Resp, E>
    where
        Req: ChangeMessage + Clone + Send + Sync + 'static,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: fmt::Display,
    {
        let captured = request.clone();
        let result = handler(request).await;

        if let Err(e) = &result
            && self.inner.settings.handle_only_successful
        {
            tracing::warn!(
                message_type = Req::MESSAGE_TYPE,
                error = %e,
                "CRUD event will not be handled, request was not completed successfully"
            );
            return result;
        }

        match self.inner.settings.dispatch {
            DispatchMode::Inline => self.inner.emit_logged(&captured).await,
            DispatchMode::Background => match Handle::try_current() {
                Ok(handle) => {
                    let inner = Arc::clone(&self.inner);
                    handle.spawn(async move { inner.emit_logged(&captured).await });
                }
                Err(_) => {
                    tracing::debug!("No tokio runtime for background dispatch, publishing inline");
                    self.inner.emit_logged(&captured).await;
                }
            },
        }

        result
    }

    /// Encode, resolve, wrap and publish `request` once.
    ///
    /// Unlike [`intercept`](Self::intercept) this reports pipeline failures
    /// to the caller.
    pub async fn emit<Req>(&self, request: &Req) -> Result<(), EmitError>
    where
        Req: ChangeMessage + Sync,
    {
        self.inner.emit(request).await
    }
}

impl<C: Codec> Inner<C> {
    async fn emit<Req>(&self, request: &Req) -> Result<(), EmitError>
    where
        Req: ChangeMessage + Sync,
    {
        let raw = self
            .codec
            .encode(request)
            .map_err(EmitError::EncodeRequest)?;

        let key = DescriptorKey::for_type(&self.settings.application_id, Req::MESSAGE_TYPE);
        tracing::debug!(key = %key, size = raw.len(), "Captured request for change event");
        let descriptor = self.store.get(&key)?;

        let envelope = Envelope::build(&descriptor, raw);
        let data = self
            .codec
            .encode(&envelope)
            .map_err(EmitError::EncodeEnvelope)?;

        self.publisher
            .publish(&self.settings.bus_name, &self.settings.topic, data)
            .await?;

        tracing::debug!(
            key = %key,
            reference = %descriptor.message_reference,
            topic = %self.settings.topic,
            "Published change event"
        );
        Ok(())
    }

    async fn emit_logged<Req>(&self, request: &Req)
    where
        Req: ChangeMessage + Sync,
    {
        match self.emit(request).await {
            Ok(()) => {}
            Err(EmitError::DescriptorNotFound(e)) => {
                tracing::debug!(error = %e, "Skipping change event for unregistered message");
            }
            Err(e @ (EmitError::EncodeRequest(_) | EmitError::EncodeEnvelope(_))) => {
                tracing::error!(
                    message_type = Req::MESSAGE_TYPE,
                    error = %e,
                    "Event data encoding failed"
                );
            }
            Err(e @ EmitError::Publish(_)) => {
                tracing::error!(
                    message_type = Req::MESSAGE_TYPE,
                    error = %e,
                    "Event data sending failed"
                );
            }
        }
    }
}

impl<C> fmt::Debug for EventInterceptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInterceptor")
            .field("settings", &self.inner.settings)
            .field("descriptors", &self.inner.store.len())
            .finish_non_exhaustive()
    }
}
