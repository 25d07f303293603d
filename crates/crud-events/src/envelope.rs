use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::codec::{Codec, base64_bytes};
use crate::descriptor::MessageDescriptor;
use crate::error::CodecError;

/// Transport envelope published for one intercepted call.
///
/// `encoded_payload` holds the captured request exactly as the codec
/// produced it; its shape is only described by `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub message_uuid: Uuid,
    pub reference: String,
    #[serde(with = "base64_bytes")]
    pub encoded_payload: Vec<u8>,
}

impl Envelope {
    pub fn build(descriptor: &MessageDescriptor, raw_payload: Vec<u8>) -> Self {
        Self {
            message_uuid: descriptor.message_id,
            reference: descriptor.message_reference.clone(),
            encoded_payload: raw_payload,
        }
    }

    /// Decode the embedded request.
    pub fn decode_payload<T: DeserializeOwned, C: Codec>(
        &self,
        codec: &C,
    ) -> Result<T, CodecError> {
        codec.decode(&self.encoded_payload)
    }
}
