use thiserror::Error;

use crate::descriptor::DescriptorKey;

/// Descriptor store lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Message {0} was not registered")]
    NotFound(DescriptorKey),
}

/// Serialization failures raised by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),
}

/// Failures reported by a broker client.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Broker transport error: {0}")]
    Http(String),

    #[error("Broker rejected event: status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Broker closed")]
    Closed,

    #[error("Invalid broker configuration: {0}")]
    InvalidConfig(String),
}

/// Failures of a single publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Broker client is not initialized")]
    BrokerUnavailable,

    #[error("Publish to {bus_name}/{topic} failed: {source}")]
    Publish {
        bus_name: String,
        topic: String,
        #[source]
        source: BusError,
    },
}

/// Failures of the per-call emission pipeline.
///
/// These never reach the RPC caller; the interceptor logs and drops them.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Event request encoding error: {0}")]
    EncodeRequest(#[source] CodecError),

    #[error(transparent)]
    DescriptorNotFound(#[from] StoreError),

    #[error("Event envelope encoding error: {0}")]
    EncodeEnvelope(#[source] CodecError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Schema registration failures, returned to the caller of registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry configuration error: {0}")]
    Config(String),

    #[error("Cannot read schema file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot marshal schema create request: {0}")]
    Encoding(String),

    #[error("Registration request failed: {0}")]
    Registration(String),

    #[error("Registry rejected message {message}: status {status}: {body}")]
    Rejected {
        message: String,
        status: u16,
        body: String,
    },

    #[error("Cannot parse registry response: {0}")]
    Parse(String),
}

/// Interceptor construction failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Broker client is not configured")]
    MissingBroker,

    #[error("Invalid interceptor settings: {0}")]
    InvalidSettings(String),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config build error: {0}")]
    Build(String),

    #[error("Config deserialize error: {0}")]
    Deserialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
