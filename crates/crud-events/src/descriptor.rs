//! Message descriptors and the keys they are registered under.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One registered version of a message schema, as issued by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    #[serde(alias = "MessageId", alias = "messageId")]
    pub message_id: Uuid,

    #[serde(alias = "MessageReference", alias = "messageReference")]
    pub message_reference: String,

    #[serde(default, alias = "Version")]
    pub version: i32,
}

impl MessageDescriptor {
    pub fn new(message_id: Uuid, message_reference: impl Into<String>, version: i32) -> Self {
        Self {
            message_id,
            message_reference: message_reference.into(),
            version,
        }
    }
}

/// Fully-qualified name a descriptor is stored under.
///
/// Registration produces `<application>.<package>.<message>`; interception
/// produces `<application>.<type name>`. A request type whose tag is
/// `<package>.<message>` therefore resolves to the registered descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorKey(String);

impl DescriptorKey {
    /// Key for a registered `(application, package, message)` triple.
    pub fn for_message(application_id: &str, package_name: &str, message_name: &str) -> Self {
        Self(format!("{application_id}.{package_name}.{message_name}"))
    }

    /// Key for an intercepted request type.
    ///
    /// Pointer and reference markers in the type name are dropped, so
    /// `*pkgA.Widget` and `&pkgA.Widget` both yield `<application>.pkgA.Widget`.
    pub fn for_type(application_id: &str, type_name: &str) -> Self {
        Self(format!("{application_id}.{}", normalize_type_name(type_name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DescriptorKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DescriptorKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn normalize_type_name(type_name: &str) -> String {
    let stripped: String = type_name
        .chars()
        .filter(|c| !matches!(c, '*' | '&'))
        .collect();
    let stripped = stripped.trim();
    stripped
        .strip_prefix("mut ")
        .unwrap_or(stripped)
        .trim()
        .to_string()
}

/// A request type that can be announced as a change event.
///
/// `MESSAGE_TYPE` is the static tag used to resolve the descriptor,
/// normally `<package>.<message>` as registered with the schema registry.
pub trait ChangeMessage: Serialize {
    const MESSAGE_TYPE: &'static str;
}
