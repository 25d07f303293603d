//! Schema registry client.
//!
//! Registration is a setup-time operation: it reads a schema file, posts it
//! to `<address>/register_message`, and stores the returned descriptor under
//! `<application>.<package>.<message>`. Every failure is returned to the
//! caller; nothing is retried here.
//!
//! When announcements are enabled, each successful registration is followed
//! by a best-effort [`SchemaAnnouncement`] on the schema topic.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::{Codec, JsonCodec, base64_bytes};
use crate::config::RegistryConfig;
use crate::descriptor::{DescriptorKey, MessageDescriptor};
use crate::error::{CodecError, RegistryError};
use crate::publisher::Publisher;
use crate::store::DescriptorStore;

const REGISTER_PATH: &str = "register_message";

/// Request body of `POST /register_message`.
///
/// `encoded_message` is the raw schema file, sent as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetails {
    pub application_id: String,
    pub package_name: String,
    pub message_name: String,
    #[serde(with = "base64_bytes")]
    pub encoded_message: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
}

/// Published on the schema topic after a message was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaAnnouncement {
    pub application_id: String,
    pub package_name: String,
    pub message_name: String,
    pub version: i32,
    #[serde(with = "base64_bytes")]
    pub encoded_file: Vec<u8>,
}

impl SchemaAnnouncement {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        JsonCodec.encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let announcement: Self = JsonCodec.decode(bytes)?;
        tracing::debug!(
            message = %announcement.message_name,
            application_id = %announcement.application_id,
            package = %announcement.package_name,
            version = announcement.version,
            "Received schema announcement"
        );
        Ok(announcement)
    }
}

struct Announcer {
    publisher: Publisher,
    bus_name: String,
    topic: String,
}

pub struct RegistryClient {
    http_client: reqwest::Client,
    address: String,
    token_env: String,
    auth_token: Option<String>,
    store: Arc<DescriptorStore>,
    announcer: Option<Announcer>,
}

impl RegistryClient {
    /// Create a client that stores descriptors into `store`.
    ///
    /// The `Authorization` credential is read once from the environment
    /// variable named by `config.token_env`. An empty `config.address` is
    /// accepted here and rejected by [`register_message`](Self::register_message).
    pub fn new(
        config: &RegistryConfig,
        store: Arc<DescriptorStore>,
    ) -> Result<Self, RegistryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RegistryError::Config(format!("cannot create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            address: config.address.trim_end_matches('/').to_string(),
            token_env: config.token_env.clone(),
            auth_token: std::env::var(&config.token_env)
                .ok()
                .filter(|t| !t.is_empty()),
            store,
            announcer: None,
        })
    }

    /// Replace the credential read from the environment.
    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Announce every registered schema on `bus_name`/`topic`.
    #[must_use]
    pub fn with_announcements(
        mut self,
        publisher: Publisher,
        bus_name: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        self.announcer = Some(Announcer {
            publisher,
            bus_name: bus_name.into(),
            topic: topic.into(),
        });
        self
    }

    pub fn store(&self) -> &Arc<DescriptorStore> {
        &self.store
    }

    pub async fn register_message(
        &self,
        application_id: &str,
        package_name: &str,
        message_name: &str,
        schema_path: impl AsRef<Path>,
    ) -> Result<MessageDescriptor, RegistryError> {
        if self.address.is_empty() {
            return Err(RegistryError::Config("Storage address is empty".into()));
        }

        let schema_path = schema_path.as_ref();
        let schema = tokio::fs::read(schema_path)
            .await
            .map_err(|source| RegistryError::Io {
                path: schema_path.display().to_string(),
                source,
            })?;

        let details = MessageDetails {
            application_id: application_id.to_string(),
            package_name: package_name.to_string(),
            message_name: message_name.to_string(),
            encoded_message: schema,
            version: None,
        };
        let body =
            serde_json::to_vec(&details).map_err(|e| RegistryError::Encoding(e.to_string()))?;

        let url = format!("{}/{REGISTER_PATH}", self.address);
        tracing::debug!(
            url = %url,
            message = message_name,
            schema = %schema_path.display(),
            "Registering message schema"
        );

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");
        match &self.auth_token {
            Some(token) => {
                request = request.header("Authorization", token.as_str());
            }
            None => {
                tracing::warn!(
                    token_env = %self.token_env,
                    "Registry credential is not set, sending unauthenticated request"
                );
            }
        }

        let response = request.body(body).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Registry request failed");
            RegistryError::Registration(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Rejected {
                message: message_name.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Registration(e.to_string()))?;
        let descriptor: MessageDescriptor = serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::Parse(format!(
                "Message {message_name} (file {}) cannot be registered: {e}",
                schema_path.display()
            ))
        })?;

        let key = DescriptorKey::for_message(application_id, package_name, message_name);
        self.store.put(key.clone(), descriptor.clone());
        tracing::info!(
            key = %key,
            message_id = %descriptor.message_id,
            reference = %descriptor.message_reference,
            version = descriptor.version,
            "Registered message schema"
        );

        if let Some(announcer) = &self.announcer {
            let announcement = SchemaAnnouncement {
                application_id: details.application_id,
                package_name: details.package_name,
                message_name: details.message_name,
                version: descriptor.version,
                encoded_file: details.encoded_message,
            };
            announce(announcer, &announcement).await;
        }

        Ok(descriptor)
    }
}

async fn announce(announcer: &Announcer, announcement: &SchemaAnnouncement) {
    let data = match announcement.encode() {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "Schema announcement encoding failed");
            return;
        }
    };
    if let Err(e) = announcer
        .publisher
        .publish(&announcer.bus_name, &announcer.topic, data)
        .await
    {
        tracing::warn!(
            message = %announcement.message_name,
            error = %e,
            "Schema announcement sending failed"
        );
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("address", &self.address)
            .field("token_env", &self.token_env)
            .field("authenticated", &self.auth_token.is_some())
            .field("announcements", &self.announcer.is_some())
            .finish_non_exhaustive()
    }
}
