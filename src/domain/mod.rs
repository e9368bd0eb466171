//! Watcher-agnostic domain types.
//!
//! The serde camelCase serialization of these types is load-bearing: it is
//! both the context the notification templates address
//! (`${container.updateKind.kind}`) and, key-flattened, the MQTT container
//! state payload.

mod container;
mod watcher;

pub use container::{Container, Digest, Image, Registry, Tag, UpdateKind, UpdateKindKind, UpdateResult};
pub use watcher::Watcher;
