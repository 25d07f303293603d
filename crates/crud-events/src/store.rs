//! Process-wide cache of registered message descriptors.
//!
//! Every intercepted call performs one lookup, so reads go through a sharded
//! [`DashMap`] and never wait on each other. Registration writes lock a single
//! shard for the duration of one insert. Entries are never evicted.

use std::sync::Arc;

use dashmap::DashMap;

use crate::descriptor::{DescriptorKey, MessageDescriptor};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct DescriptorStore {
    entries: DashMap<DescriptorKey, Arc<MessageDescriptor>>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped in an Arc for sharing between the
    /// registry client and interceptors.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace the descriptor for `key`.
    ///
    /// Last write wins; the replaced descriptor, if any, is returned.
    pub fn put(
        &self,
        key: DescriptorKey,
        descriptor: MessageDescriptor,
    ) -> Option<Arc<MessageDescriptor>> {
        let previous = self.entries.insert(key.clone(), Arc::new(descriptor));
        if previous.is_some() {
            tracing::debug!(key = %key, "Replaced message descriptor");
        } else {
            tracing::debug!(key = %key, "Stored message descriptor");
        }
        previous
    }

    pub fn get(&self, key: &DescriptorKey) -> Result<Arc<MessageDescriptor>, StoreError> {
        self.entries
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    pub fn contains(&self, key: &DescriptorKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
