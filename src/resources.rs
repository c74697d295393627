//! Revocable handles to binary blobs held for display.
//!
//! A [`ResourceTable`] is the crate's stand-in for environment-managed
//! object URLs: `materialize` registers a blob and hands back an opaque
//! [`ResourceHandle`], `revoke` consumes the handle and drops the entry.
//! Consumers read through [`ResourceTable::open`], which returns a
//! [`ResourceView`] carrying its own reference-counted `Bytes` clone, so
//! revocation forbids future opens but never invalidates bytes a consumer
//! is already rendering from.

use std::collections::HashMap;
use std::sync::Mutex;
use bytes::Bytes;
use tracing::error;
use crate::utils::{StudioError, StudioResult};

/// Opaque reference to a materialized blob.
///
/// Not cloneable: exactly one slot owns a handle at a time, and revoking
/// moves the handle in, so the owner cannot dereference it afterwards.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: u64,
}

impl ResourceHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Resolved view of a live resource.
///
/// Holds its own `Bytes` reference, so it stays valid across a later
/// revocation of the handle it was opened from.
#[derive(Debug, Clone)]
pub struct ResourceView {
    pub bytes: Bytes,
    pub mime_type: String,
}

#[derive(Debug)]
struct Entry {
    bytes: Bytes,
    mime_type: String,
}

#[derive(Debug, Default)]
struct TableInner {
    entries: HashMap<u64, Entry>,
    next_id: u64,
}

/// Handle table for display blobs.
#[derive(Debug, Default)]
pub struct ResourceTable {
    inner: Mutex<TableInner>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a blob and returns the owning handle.
    pub fn materialize(&self, bytes: Bytes, mime_type: impl Into<String>) -> ResourceHandle {
        let mut inner = self.inner.lock().expect("resource table lock poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.insert(
            id,
            Entry {
                bytes,
                mime_type: mime_type.into(),
            },
        );
        ResourceHandle { id }
    }

    /// Resolves a handle into a view of its bytes.
    ///
    /// Fails with a resource error once the handle's entry has been
    /// revoked; that only happens on a lifecycle bug, since revocation
    /// consumes the handle.
    pub fn open(&self, handle: &ResourceHandle) -> StudioResult<ResourceView> {
        let inner = self.inner.lock().expect("resource table lock poisoned");
        inner
            .entries
            .get(&handle.id)
            .map(|entry| ResourceView {
                bytes: entry.bytes.clone(),
                mime_type: entry.mime_type.clone(),
            })
            .ok_or_else(|| {
                StudioError::resource(format!("Handle {} is revoked", handle.id))
            })
    }

    /// Invalidates a handle and drops the table's reference to its bytes.
    ///
    /// Outstanding [`ResourceView`]s keep the bytes alive until dropped.
    pub fn revoke(&self, handle: ResourceHandle) {
        let mut inner = self.inner.lock().expect("resource table lock poisoned");
        if inner.entries.remove(&handle.id).is_none() {
            // Unreachable through the public API: handles are unforgeable
            // and revoke takes them by value.
            error!("Revoked unknown resource handle {}", handle.id);
            debug_assert!(false, "revoke of unknown handle {}", handle.id);
        }
    }

    /// Number of live (un-revoked) entries. Zero after a clean session close.
    pub fn live(&self) -> usize {
        self.inner
            .lock()
            .expect("resource table lock poisoned")
            .entries
            .len()
    }
}
