//! Polymorphic entity wrappers.
//!
//! `Entity` is the closed union of every kind the layer understands. It is
//! what identity tables register, what adapters return from navigation, and
//! what the validator walks. `WeakEntity` mirrors it for weak caching in
//! identity tables.

use std::sync::{Arc, Weak};

use crate::handle::Handle;
use crate::kind::EntityKind;
use crate::ops::{
	ContainerOps, DocumentNodeOps, DocumentOps, GroupOps, ItemDefinitionOps, ItemOps, LeafOps, Linkable,
	MetadataOps, ProjectOps, PropertyOps,
};

/// A shared reference to one entity of any kind.
#[derive(Clone)]
pub enum Entity {
	/// Document root.
	Document(Arc<dyn DocumentOps>),
	/// Container node.
	Group(Arc<dyn GroupOps>),
	/// Leaf node.
	Leaf(Arc<dyn LeafOps>),
	/// Evaluated project.
	Project(Arc<dyn ProjectOps>),
	/// Evaluated property.
	Property(Arc<dyn PropertyOps>),
	/// Evaluated item.
	Item(Arc<dyn ItemOps>),
	/// Item definition.
	ItemDefinition(Arc<dyn ItemDefinitionOps>),
	/// Metadatum.
	Metadata(Arc<dyn MetadataOps>),
}

impl Entity {
	/// The shared base view of this entity.
	#[must_use]
	pub fn linkable(&self) -> &dyn Linkable {
		match self {
			Self::Document(a) => &**a,
			Self::Group(a) => &**a,
			Self::Leaf(a) => &**a,
			Self::Project(a) => &**a,
			Self::Property(a) => &**a,
			Self::Item(a) => &**a,
			Self::ItemDefinition(a) => &**a,
			Self::Metadata(a) => &**a,
		}
	}

	/// Kind tag of this entity.
	#[must_use]
	pub fn kind(&self) -> EntityKind {
		self.linkable().kind()
	}

	/// True for proxies.
	#[must_use]
	pub fn is_linked(&self) -> bool {
		self.linkable().is_linked()
	}

	/// The handle a proxy carries; `None` for authoritative entities.
	#[must_use]
	pub fn link_handle(&self) -> Option<Handle> {
		self.linkable().link_handle()
	}

	/// Identity key: the address of the shared allocation.
	///
	/// Two `Entity` values clone-derived from the same `Arc` report the same
	/// key; distinct objects report distinct keys while alive.
	#[must_use]
	pub fn ptr_key(&self) -> usize {
		match self {
			Self::Document(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Group(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Leaf(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Project(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Property(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Item(a) => Arc::as_ptr(a) as *const () as usize,
			Self::ItemDefinition(a) => Arc::as_ptr(a) as *const () as usize,
			Self::Metadata(a) => Arc::as_ptr(a) as *const () as usize,
		}
	}

	/// Reference identity across two entity values.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		self.kind() == other.kind() && self.ptr_key() == other.ptr_key()
	}

	/// Downgrades to a weak reference.
	#[must_use]
	pub fn downgrade(&self) -> WeakEntity {
		match self {
			Self::Document(a) => WeakEntity::Document(Arc::downgrade(a)),
			Self::Group(a) => WeakEntity::Group(Arc::downgrade(a)),
			Self::Leaf(a) => WeakEntity::Leaf(Arc::downgrade(a)),
			Self::Project(a) => WeakEntity::Project(Arc::downgrade(a)),
			Self::Property(a) => WeakEntity::Property(Arc::downgrade(a)),
			Self::Item(a) => WeakEntity::Item(Arc::downgrade(a)),
			Self::ItemDefinition(a) => WeakEntity::ItemDefinition(Arc::downgrade(a)),
			Self::Metadata(a) => WeakEntity::Metadata(Arc::downgrade(a)),
		}
	}

	/// Document-node view for construction-side kinds.
	#[must_use]
	pub fn as_node(&self) -> Option<&dyn DocumentNodeOps> {
		match self {
			Self::Document(a) => Some(&**a),
			Self::Group(a) => Some(&**a),
			Self::Leaf(a) => Some(&**a),
			_ => None,
		}
	}

	/// Container view for kinds with ordered children.
	#[must_use]
	pub fn as_container(&self) -> Option<&dyn ContainerOps> {
		match self {
			Self::Document(a) => Some(&**a),
			Self::Group(a) => Some(&**a),
			_ => None,
		}
	}

	/// Group view.
	#[must_use]
	pub fn as_group(&self) -> Option<&dyn GroupOps> {
		match self {
			Self::Group(a) => Some(&**a),
			_ => None,
		}
	}

	/// Document view.
	#[must_use]
	pub fn as_document(&self) -> Option<&dyn DocumentOps> {
		match self {
			Self::Document(a) => Some(&**a),
			_ => None,
		}
	}

	/// Leaf view.
	#[must_use]
	pub fn as_leaf(&self) -> Option<&dyn LeafOps> {
		match self {
			Self::Leaf(a) => Some(&**a),
			_ => None,
		}
	}

	/// Project view.
	#[must_use]
	pub fn as_project(&self) -> Option<&dyn ProjectOps> {
		match self {
			Self::Project(a) => Some(&**a),
			_ => None,
		}
	}

	/// Property view.
	#[must_use]
	pub fn as_property(&self) -> Option<&dyn PropertyOps> {
		match self {
			Self::Property(a) => Some(&**a),
			_ => None,
		}
	}

	/// Item view.
	#[must_use]
	pub fn as_item(&self) -> Option<&dyn ItemOps> {
		match self {
			Self::Item(a) => Some(&**a),
			_ => None,
		}
	}

	/// Item-definition view.
	#[must_use]
	pub fn as_item_definition(&self) -> Option<&dyn ItemDefinitionOps> {
		match self {
			Self::ItemDefinition(a) => Some(&**a),
			_ => None,
		}
	}

	/// Metadata view.
	#[must_use]
	pub fn as_metadata(&self) -> Option<&dyn MetadataOps> {
		match self {
			Self::Metadata(a) => Some(&**a),
			_ => None,
		}
	}
}

impl std::fmt::Debug for Entity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Entity::{:?}@{:#x}", self.kind(), self.ptr_key())
	}
}

/// Weak counterpart of [`Entity`], used by identity tables so cached
/// entries never keep their payload alive.
#[derive(Clone)]
pub enum WeakEntity {
	/// Document root.
	Document(Weak<dyn DocumentOps>),
	/// Container node.
	Group(Weak<dyn GroupOps>),
	/// Leaf node.
	Leaf(Weak<dyn LeafOps>),
	/// Evaluated project.
	Project(Weak<dyn ProjectOps>),
	/// Evaluated property.
	Property(Weak<dyn PropertyOps>),
	/// Evaluated item.
	Item(Weak<dyn ItemOps>),
	/// Item definition.
	ItemDefinition(Weak<dyn ItemDefinitionOps>),
	/// Metadatum.
	Metadata(Weak<dyn MetadataOps>),
}

impl WeakEntity {
	/// Upgrades back to a strong entity while the payload is alive.
	#[must_use]
	pub fn upgrade(&self) -> Option<Entity> {
		match self {
			Self::Document(w) => w.upgrade().map(Entity::Document),
			Self::Group(w) => w.upgrade().map(Entity::Group),
			Self::Leaf(w) => w.upgrade().map(Entity::Leaf),
			Self::Project(w) => w.upgrade().map(Entity::Project),
			Self::Property(w) => w.upgrade().map(Entity::Property),
			Self::Item(w) => w.upgrade().map(Entity::Item),
			Self::ItemDefinition(w) => w.upgrade().map(Entity::ItemDefinition),
			Self::Metadata(w) => w.upgrade().map(Entity::Metadata),
		}
	}
}
