//! Link adapters.
//!
//! One proxy type per entity kind. Each wraps a [`node::LinkedNode`] and
//! implements the authoritative contracts by forwarding every call through
//! it; the macros below stamp out the shared [`Linkable`] plumbing plus the
//! node and container contracts, which are identical for all adapters that
//! carry them.
//!
//! [`Linkable`]: tether_model::Linkable

use std::sync::{Arc, Weak};

use tether_model::{Entity, Handle};

use crate::context::CollectionContext;

macro_rules! impl_linked {
	($ty:ident, $kind:ident) => {
		impl tether_model::Linkable for $ty {
			fn kind(&self) -> tether_model::EntityKind {
				tether_model::EntityKind::$kind
			}

			fn is_linked(&self) -> bool {
				true
			}

			fn link_handle(&self) -> Option<tether_model::Handle> {
				Some(self.node.handle())
			}

			fn as_any(&self) -> &dyn std::any::Any {
				self
			}
		}
	};
}

macro_rules! impl_linked_node {
	($ty:ident) => {
		impl tether_model::DocumentNodeOps for $ty {
			fn parent(&self) -> tether_model::Result<Option<tether_model::Entity>> {
				self.node.parent()
			}

			fn containing_document(&self) -> tether_model::Result<tether_model::Entity> {
				self.node.containing_document()
			}

			fn next_sibling(&self) -> tether_model::Result<Option<tether_model::Entity>> {
				self.node.next_sibling()
			}

			fn previous_sibling(&self) -> tether_model::Result<Option<tether_model::Entity>> {
				self.node.previous_sibling()
			}

			fn location(&self) -> tether_model::Result<tether_model::ElementLocation> {
				self.node.location()
			}

			fn condition(&self) -> tether_model::Result<String> {
				self.node.condition()
			}

			fn set_condition(&self, condition: &str) -> tether_model::Result<()> {
				self.node.set_condition(condition)
			}

			fn label(&self) -> tether_model::Result<String> {
				self.node.label()
			}

			fn set_label(&self, label: &str) -> tether_model::Result<()> {
				self.node.set_label(label)
			}
		}
	};
}

macro_rules! impl_linked_container {
	($ty:ident) => {
		impl tether_model::ContainerOps for $ty {
			fn first_child(&self) -> tether_model::Result<Option<tether_model::Entity>> {
				self.node.first_child()
			}

			fn last_child(&self) -> tether_model::Result<Option<tether_model::Entity>> {
				self.node.last_child()
			}

			fn child_count(&self) -> tether_model::Result<usize> {
				self.node.child_count()
			}

			fn children(&self) -> tether_model::Result<Vec<tether_model::Entity>> {
				self.node.children()
			}

			fn insert_before(
				&self,
				child: &tether_model::Entity,
				reference: Option<&tether_model::Entity>,
			) -> tether_model::Result<()> {
				self.node.insert_before(child, reference)
			}

			fn insert_after(
				&self,
				child: &tether_model::Entity,
				reference: Option<&tether_model::Entity>,
			) -> tether_model::Result<()> {
				self.node.insert_after(child, reference)
			}

			fn append_child(&self, child: &tether_model::Entity) -> tether_model::Result<()> {
				self.node.append_child(child)
			}

			fn prepend_child(&self, child: &tether_model::Entity) -> tether_model::Result<()> {
				self.node.prepend_child(child)
			}

			fn remove_child(&self, child: &tether_model::Entity) -> tether_model::Result<()> {
				self.node.remove_child(child)
			}

			fn deep_clone(&self) -> tether_model::Result<tether_model::Entity> {
				self.node.deep_clone()
			}
		}
	};
}

mod document;
mod node;
mod project;

use document::{LinkedDocument, LinkedGroup, LinkedLeaf};
use node::LinkedNode;
use project::{LinkedItem, LinkedItemDefinition, LinkedMetadata, LinkedProject, LinkedProperty};

pub(crate) fn linked_document(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Document(Arc::new(LinkedDocument::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_group(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Group(Arc::new(LinkedGroup::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_leaf(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Leaf(Arc::new(LinkedLeaf::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_project(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Project(Arc::new(LinkedProject::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_property(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Property(Arc::new(LinkedProperty::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_item(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Item(Arc::new(LinkedItem::new(LinkedNode::new(handle, ctx))))
}

pub(crate) fn linked_item_definition(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::ItemDefinition(Arc::new(LinkedItemDefinition::new(LinkedNode::new(
		handle, ctx,
	))))
}

pub(crate) fn linked_metadata(handle: Handle, ctx: Weak<CollectionContext>) -> Entity {
	Entity::Metadata(Arc::new(LinkedMetadata::new(LinkedNode::new(handle, ctx))))
}
