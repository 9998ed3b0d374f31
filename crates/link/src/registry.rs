//! Kind-to-adapter factory registry.
//!
//! An explicit registry object rather than process-wide mutable state: the
//! connectivity group owns one and shares it with every context it creates.

use std::sync::Weak;

use rustc_hash::FxHashMap;
use tether_model::{Entity, EntityKind, Handle, LinkError};

use crate::adapters;
use crate::context::CollectionContext;

/// Constructor for one adapter kind.
pub type AdapterFactory = fn(Handle, Weak<CollectionContext>) -> Entity;

/// Maps entity kinds to link-adapter constructors.
pub struct AdapterRegistry {
	factories: FxHashMap<EntityKind, AdapterFactory>,
}

impl AdapterRegistry {
	/// An empty registry. Useful for tests probing dispatch failures.
	#[must_use]
	pub fn empty() -> Self {
		Self {
			factories: FxHashMap::default(),
		}
	}

	/// The full registry covering every entity kind.
	#[must_use]
	pub fn standard() -> Self {
		let mut registry = Self::empty();
		registry.register(EntityKind::Document, adapters::linked_document);
		registry.register(EntityKind::Group, adapters::linked_group);
		registry.register(EntityKind::Leaf, adapters::linked_leaf);
		registry.register(EntityKind::Project, adapters::linked_project);
		registry.register(EntityKind::Property, adapters::linked_property);
		registry.register(EntityKind::Item, adapters::linked_item);
		registry.register(EntityKind::ItemDefinition, adapters::linked_item_definition);
		registry.register(EntityKind::Metadata, adapters::linked_metadata);
		registry
	}

	/// Registers (or replaces) the factory for one kind.
	pub fn register(&mut self, kind: EntityKind, factory: AdapterFactory) {
		self.factories.insert(kind, factory);
	}

	/// Dispatches on the kind tag. An unknown kind is a hard error naming
	/// the kind, never a silent fallback.
	pub fn create(&self, kind: EntityKind, handle: Handle, ctx: Weak<CollectionContext>) -> Result<Entity, LinkError> {
		let factory = self
			.factories
			.get(&kind)
			.ok_or(LinkError::UnsupportedKind { kind })?;
		Ok(factory(handle, ctx))
	}
}

impl Default for AdapterRegistry {
	fn default() -> Self {
		Self::standard()
	}
}
