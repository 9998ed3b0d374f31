//! Entity contracts and the authoritative build-document object model.
//!
//! This crate defines the polymorphic surface shared by authoritative
//! objects and their link adapters:
//! * `Handle`: the only value that may cross a context boundary
//! * `Entity` / `WeakEntity`: closed polymorphic wrappers over the ops traits
//! * ops traits: one contract per entity kind, implemented both locally and
//!   by forwarding proxies
//! * `local`: arena-backed authoritative implementations of every kind

#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod handle;
pub mod kind;
pub mod local;
pub mod location;
pub mod ops;

pub use entity::{Entity, WeakEntity};
pub use error::{LinkError, ModelError, Result};
pub use handle::{ContextId, Handle, LocalId};
pub use kind::EntityKind;
pub use local::{LocalDocument, LocalItem, LocalItemDefinition, LocalMetadata, LocalProject, LocalProperty};
pub use location::ElementLocation;
pub use ops::{
	ContainerOps, DocumentNodeOps, DocumentOps, GroupOps, ItemDefinitionOps, ItemOps, LeafOps, Linkable,
	MetadataOps, ProjectOps, PropertyOps,
};
