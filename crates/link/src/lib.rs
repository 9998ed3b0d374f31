//! Cross-context object linking.
//!
//! Contexts exchange entities by value-sized [`Handle`]s instead of
//! references. The exporting side registers an object once and hands out
//! the same handle for the same object forever; the importing side builds
//! one forwarding proxy per foreign handle and caches it, so reference
//! identity survives every crossing in both directions. Connectivity is
//! explicit: a [`ConnectivityGroup`] owns the contexts and wires them
//! together, and resolving a handle from an unconnected owner fails
//! rather than guessing.

#![warn(missing_docs)]

mod adapters;
mod context;
mod group;
mod registry;
mod table;

pub use context::CollectionContext;
pub use group::ConnectivityGroup;
pub use registry::{AdapterFactory, AdapterRegistry};
pub use table::{ExportTable, ImportTable};
// The handle vocabulary lives with the entity contracts; surface it here
// so linking callers need a single crate.
pub use tether_model::{ContextId, Handle, LinkError, LocalId};
