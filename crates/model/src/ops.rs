//! Entity contracts.
//!
//! One trait per entity kind plus two shared bases. Authoritative types in
//! [`crate::local`] implement these directly; link adapters implement them
//! by forwarding every call through a [`crate::Handle`]. Methods that touch
//! document or project state return [`Result`] because a forwarding
//! implementation can always fail with a [`crate::LinkError`].

use std::any::Any;

use crate::entity::Entity;
use crate::error::Result;
use crate::handle::Handle;
use crate::kind::EntityKind;
use crate::location::ElementLocation;

/// Base contract of everything that can cross a context boundary.
pub trait Linkable: Send + Sync {
	/// The kind tag attached when this object is first exported.
	fn kind(&self) -> EntityKind;

	/// True for proxies, false for authoritative objects.
	fn is_linked(&self) -> bool;

	/// The handle a proxy forwards to; `None` for authoritative objects.
	///
	/// This is the structural double-wrap guard: exporting an object whose
	/// `link_handle` is `Some` returns that handle instead of registering a
	/// second layer.
	fn link_handle(&self) -> Option<Handle>;

	/// Concrete-type escape hatch for same-document checks.
	fn as_any(&self) -> &dyn Any;
}

/// Shared contract of construction-side document nodes.
pub trait DocumentNodeOps: Linkable {
	/// The container this node is attached to, `None` when detached or when
	/// this node is the document root.
	fn parent(&self) -> Result<Option<Entity>>;

	/// The document root this node belongs to.
	fn containing_document(&self) -> Result<Entity>;

	/// Next node under the same parent, in document order.
	fn next_sibling(&self) -> Result<Option<Entity>>;

	/// Previous node under the same parent.
	fn previous_sibling(&self) -> Result<Option<Entity>>;

	/// Source location of this node.
	fn location(&self) -> Result<ElementLocation>;

	/// Condition attribute, empty when unset.
	fn condition(&self) -> Result<String>;

	/// Sets the condition attribute.
	fn set_condition(&self, condition: &str) -> Result<()>;

	/// Label attribute, empty when unset.
	fn label(&self) -> Result<String>;

	/// Sets the label attribute.
	fn set_label(&self, label: &str) -> Result<()>;
}

/// Contract of nodes with ordered children.
///
/// Structural state lives only on the authoritative side; forwarding
/// implementations compute nothing locally.
pub trait ContainerOps: DocumentNodeOps {
	/// First child in document order.
	fn first_child(&self) -> Result<Option<Entity>>;

	/// Last child in document order.
	fn last_child(&self) -> Result<Option<Entity>>;

	/// Number of direct children.
	fn child_count(&self) -> Result<usize>;

	/// Ordered snapshot of the direct children.
	fn children(&self) -> Result<Vec<Entity>>;

	/// Inserts `child` immediately before `reference`; appends when
	/// `reference` is `None`.
	fn insert_before(&self, child: &Entity, reference: Option<&Entity>) -> Result<()>;

	/// Inserts `child` immediately after `reference`; prepends when
	/// `reference` is `None`.
	fn insert_after(&self, child: &Entity, reference: Option<&Entity>) -> Result<()>;

	/// Appends `child` as the last child.
	fn append_child(&self, child: &Entity) -> Result<()>;

	/// Inserts `child` as the first child.
	fn prepend_child(&self, child: &Entity) -> Result<()>;

	/// Detaches `child` from this container.
	fn remove_child(&self, child: &Entity) -> Result<()>;

	/// Clones this node and its whole subtree into a detached copy within
	/// the same document.
	fn deep_clone(&self) -> Result<Entity>;
}

/// Contract of interior container nodes.
pub trait GroupOps: ContainerOps {
	/// Group name, fixed at creation.
	fn name(&self) -> Result<String>;
}

/// Contract of the document root.
pub trait DocumentOps: ContainerOps {
	/// Full path of the document, empty for in-memory documents.
	fn full_path(&self) -> Result<String>;

	/// Sets the document path.
	fn set_full_path(&self, path: &str) -> Result<()>;

	/// Monotonic revision counter, bumped by every mutation.
	fn version(&self) -> Result<u32>;

	/// Creates a detached group node owned by this document.
	fn create_group(&self, name: &str) -> Result<Entity>;

	/// Creates a detached leaf node owned by this document.
	fn create_leaf(&self, name: &str, value: &str) -> Result<Entity>;
}

/// Contract of leaf nodes.
pub trait LeafOps: DocumentNodeOps {
	/// Node name, fixed at creation.
	fn name(&self) -> Result<String>;

	/// Current value.
	fn value(&self) -> Result<String>;

	/// Replaces the value.
	fn set_value(&self, value: &str) -> Result<()>;
}

/// Contract of an evaluated project.
pub trait ProjectOps: Linkable {
	/// Path of the document this project was evaluated from.
	fn full_path(&self) -> Result<String>;

	/// All properties, in evaluation order.
	fn properties(&self) -> Result<Vec<Entity>>;

	/// Looks up a property by name.
	fn property(&self, name: &str) -> Result<Option<Entity>>;

	/// Shortcut for a property's evaluated value.
	fn property_value(&self, name: &str) -> Result<Option<String>>;

	/// Creates or updates a property, returning it. Updating keeps the
	/// existing property instance.
	fn set_property(&self, name: &str, value: &str) -> Result<Entity>;

	/// All items, in evaluation order.
	fn items(&self) -> Result<Vec<Entity>>;

	/// Items of one item type, in evaluation order.
	fn items_of_type(&self, item_type: &str) -> Result<Vec<Entity>>;

	/// Adds an item.
	fn add_item(&self, item_type: &str, include: &str) -> Result<Entity>;

	/// Removes an item by identity.
	fn remove_item(&self, item: &Entity) -> Result<()>;

	/// All item definitions.
	fn item_definitions(&self) -> Result<Vec<Entity>>;

	/// Looks up the item definition for an item type.
	fn item_definition(&self, item_type: &str) -> Result<Option<Entity>>;
}

/// Contract of an evaluated property.
pub trait PropertyOps: Linkable {
	/// Property name.
	fn name(&self) -> Result<String>;

	/// Evaluated value.
	fn value(&self) -> Result<String>;

	/// Replaces the value; fails with [`crate::ModelError::ReadOnly`] for
	/// reserved properties.
	fn set_value(&self, value: &str) -> Result<()>;

	/// Unevaluated form; fails with [`crate::ModelError::NotBacked`] for
	/// reserved and environment-derived properties.
	fn unevaluated(&self) -> Result<String>;

	/// True for properties the evaluator reserves.
	fn is_reserved(&self) -> bool;

	/// True for properties sourced from the environment.
	fn is_environment(&self) -> bool;
}

/// Contract of an evaluated item.
pub trait ItemOps: Linkable {
	/// Item type.
	fn item_type(&self) -> Result<String>;

	/// Evaluated include string.
	fn evaluated_include(&self) -> Result<String>;

	/// Replaces the include string.
	fn set_include(&self, include: &str) -> Result<()>;

	/// Ordered metadata attached to this item.
	fn metadata(&self) -> Result<Vec<Entity>>;

	/// Value of one metadatum, `None` when absent.
	fn metadata_value(&self, name: &str) -> Result<Option<String>>;

	/// Creates or updates a metadatum, returning it.
	fn set_metadata(&self, name: &str, value: &str) -> Result<Entity>;

	/// Removes a metadatum by name.
	fn remove_metadata(&self, name: &str) -> Result<()>;

	/// True when a metadatum with this name exists.
	fn has_metadata(&self, name: &str) -> Result<bool>;
}

/// Contract of an item definition.
pub trait ItemDefinitionOps: Linkable {
	/// Item type this definition applies to.
	fn item_type(&self) -> Result<String>;

	/// Ordered default metadata.
	fn metadata(&self) -> Result<Vec<Entity>>;

	/// Value of one default metadatum, `None` when absent.
	fn metadata_value(&self, name: &str) -> Result<Option<String>>;
}

/// Contract of a metadatum.
pub trait MetadataOps: Linkable {
	/// Metadatum name.
	fn name(&self) -> Result<String>;

	/// Current value.
	fn value(&self) -> Result<String>;

	/// Replaces the value.
	fn set_value(&self, value: &str) -> Result<()>;

	/// Item type of the owning item or item definition.
	fn item_type(&self) -> Result<String>;
}
