//! In-memory state registry.
//!
//! Holds every sandbox, container and image record for the lifetime of the
//! process. The registry is the single source of truth for list and status
//! RPCs; it is never persisted.
//!
//! # Locking
//!
//! - Each collection has its own `RwLock`; individual get/put/list calls are atomic.
//! - Multi-step create workflows (check, pull, unpack, run, register) are
//!   serialized per identifier with [`KeyedLock`], held by the caller.

mod collection;
mod keyed_lock;

pub use collection::Collection;
pub use keyed_lock::KeyedLock;

use crate::runtime::types::{ContainerRecord, ImageRecord, SandboxRecord};

/// Registry of all records known to this process.
#[derive(Debug)]
pub struct StateRegistry {
    pub sandboxes: Collection<SandboxRecord>,
    pub containers: Collection<ContainerRecord>,
    pub images: Collection<ImageRecord>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self {
            sandboxes: Collection::new("sandbox"),
            containers: Collection::new("container"),
            images: Collection::new("image"),
        }
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
