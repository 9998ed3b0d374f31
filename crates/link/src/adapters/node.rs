//! Shared forwarding core of every link adapter.
//!
//! An adapter holds nothing but a handle and a weak context reference; all
//! state stays on the authoritative side. [`LinkedNode`] resolves the
//! handle per call, translates entity arguments to the owner's side, and
//! pulls entity results back through this context's import path so callers
//! always see stable proxies.

use std::sync::{Arc, Weak};

use tether_model::{
	ContainerOps, DocumentNodeOps, DocumentOps, Entity, GroupOps, Handle, ItemDefinitionOps,
	ItemOps, LeafOps, LinkError, MetadataOps, ProjectOps, PropertyOps, Result,
};

use crate::context::CollectionContext;

pub(crate) struct LinkedNode {
	handle: Handle,
	ctx: Weak<CollectionContext>,
}

impl LinkedNode {
	pub(crate) fn new(handle: Handle, ctx: Weak<CollectionContext>) -> Self {
		Self { handle, ctx }
	}

	pub(crate) fn handle(&self) -> Handle {
		self.handle
	}

	fn ctx(&self) -> std::result::Result<Arc<CollectionContext>, LinkError> {
		self.ctx.upgrade().ok_or(LinkError::ContextGone)
	}

	/// The authoritative object behind this adapter's handle.
	pub(crate) fn authoritative(&self) -> std::result::Result<Entity, LinkError> {
		self.ctx()?.resolve_authoritative(self.handle)
	}

	/// Brings an entity returned by a remote operation into the resolving
	/// context, so navigation from a proxy yields proxies.
	fn import_back(&self, entity: &Entity) -> std::result::Result<Entity, LinkError> {
		self.ctx()?.import_entity(self.handle.owner, entity)
	}

	fn import_back_opt(
		&self,
		entity: Option<Entity>,
	) -> std::result::Result<Option<Entity>, LinkError> {
		entity.map(|e| self.import_back(&e)).transpose()
	}

	fn import_back_vec(&self, entities: Vec<Entity>) -> std::result::Result<Vec<Entity>, LinkError> {
		entities.iter().map(|e| self.import_back(e)).collect()
	}

	/// Translates an entity argument to its authoritative counterpart
	/// before forwarding. Proxies resolve through the handle they carry;
	/// authoritative inputs pass through untouched and are left to the
	/// remote operation's own identity checks.
	fn outbound(&self, entity: &Entity) -> std::result::Result<Entity, LinkError> {
		match entity.link_handle() {
			Some(handle) => self.ctx()?.resolve_authoritative(handle),
			None => Ok(entity.clone()),
		}
	}

	fn outbound_opt(&self, entity: Option<&Entity>) -> std::result::Result<Option<Entity>, LinkError> {
		entity.map(|e| self.outbound(e)).transpose()
	}

	fn with_node<T>(&self, f: impl FnOnce(&dyn DocumentNodeOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let node = real
			.as_node()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(node)
	}

	fn with_container<T>(&self, f: impl FnOnce(&dyn ContainerOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let container = real
			.as_container()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(container)
	}

	pub(crate) fn with_document<T>(&self, f: impl FnOnce(&dyn DocumentOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let document = real
			.as_document()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(document)
	}

	pub(crate) fn with_group<T>(&self, f: impl FnOnce(&dyn GroupOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let group = real
			.as_group()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(group)
	}

	pub(crate) fn with_leaf<T>(&self, f: impl FnOnce(&dyn LeafOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let leaf = real
			.as_leaf()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(leaf)
	}

	pub(crate) fn with_project<T>(&self, f: impl FnOnce(&dyn ProjectOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let project = real
			.as_project()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(project)
	}

	pub(crate) fn with_property<T>(&self, f: impl FnOnce(&dyn PropertyOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let property = real
			.as_property()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(property)
	}

	pub(crate) fn with_item<T>(&self, f: impl FnOnce(&dyn ItemOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let item = real
			.as_item()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(item)
	}

	pub(crate) fn with_item_definition<T>(
		&self,
		f: impl FnOnce(&dyn ItemDefinitionOps) -> Result<T>,
	) -> Result<T> {
		let real = self.authoritative()?;
		let definition = real
			.as_item_definition()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(definition)
	}

	pub(crate) fn with_metadata<T>(&self, f: impl FnOnce(&dyn MetadataOps) -> Result<T>) -> Result<T> {
		let real = self.authoritative()?;
		let metadata = real
			.as_metadata()
			.ok_or(LinkError::UnsupportedKind { kind: real.kind() })?;
		f(metadata)
	}

	// Forwarded node navigation, shared by every document-node adapter.

	pub(crate) fn parent(&self) -> Result<Option<Entity>> {
		let parent = self.with_node(|n| n.parent())?;
		Ok(self.import_back_opt(parent)?)
	}

	pub(crate) fn containing_document(&self) -> Result<Entity> {
		let document = self.with_node(|n| n.containing_document())?;
		Ok(self.import_back(&document)?)
	}

	pub(crate) fn next_sibling(&self) -> Result<Option<Entity>> {
		let sibling = self.with_node(|n| n.next_sibling())?;
		Ok(self.import_back_opt(sibling)?)
	}

	pub(crate) fn previous_sibling(&self) -> Result<Option<Entity>> {
		let sibling = self.with_node(|n| n.previous_sibling())?;
		Ok(self.import_back_opt(sibling)?)
	}

	pub(crate) fn location(&self) -> Result<tether_model::ElementLocation> {
		self.with_node(|n| n.location())
	}

	pub(crate) fn condition(&self) -> Result<String> {
		self.with_node(|n| n.condition())
	}

	pub(crate) fn set_condition(&self, condition: &str) -> Result<()> {
		self.with_node(|n| n.set_condition(condition))
	}

	pub(crate) fn label(&self) -> Result<String> {
		self.with_node(|n| n.label())
	}

	pub(crate) fn set_label(&self, label: &str) -> Result<()> {
		self.with_node(|n| n.set_label(label))
	}

	// Forwarded container structure, shared by document and group adapters.

	pub(crate) fn first_child(&self) -> Result<Option<Entity>> {
		let child = self.with_container(|c| c.first_child())?;
		Ok(self.import_back_opt(child)?)
	}

	pub(crate) fn last_child(&self) -> Result<Option<Entity>> {
		let child = self.with_container(|c| c.last_child())?;
		Ok(self.import_back_opt(child)?)
	}

	pub(crate) fn child_count(&self) -> Result<usize> {
		self.with_container(|c| c.child_count())
	}

	pub(crate) fn children(&self) -> Result<Vec<Entity>> {
		let children = self.with_container(|c| c.children())?;
		Ok(self.import_back_vec(children)?)
	}

	pub(crate) fn insert_before(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		let child = self.outbound(child)?;
		let reference = self.outbound_opt(reference)?;
		self.with_container(|c| c.insert_before(&child, reference.as_ref()))
	}

	pub(crate) fn insert_after(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		let child = self.outbound(child)?;
		let reference = self.outbound_opt(reference)?;
		self.with_container(|c| c.insert_after(&child, reference.as_ref()))
	}

	pub(crate) fn append_child(&self, child: &Entity) -> Result<()> {
		let child = self.outbound(child)?;
		self.with_container(|c| c.append_child(&child))
	}

	pub(crate) fn prepend_child(&self, child: &Entity) -> Result<()> {
		let child = self.outbound(child)?;
		self.with_container(|c| c.prepend_child(&child))
	}

	pub(crate) fn remove_child(&self, child: &Entity) -> Result<()> {
		let child = self.outbound(child)?;
		self.with_container(|c| c.remove_child(&child))
	}

	pub(crate) fn deep_clone(&self) -> Result<Entity> {
		let clone = self.with_container(|c| c.deep_clone())?;
		Ok(self.import_back(&clone)?)
	}

	// Entity-returning helpers for the project-side adapters.

	pub(crate) fn back(&self, entity: Entity) -> Result<Entity> {
		Ok(self.import_back(&entity)?)
	}

	pub(crate) fn back_opt(&self, entity: Option<Entity>) -> Result<Option<Entity>> {
		Ok(self.import_back_opt(entity)?)
	}

	pub(crate) fn back_vec(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
		Ok(self.import_back_vec(entities)?)
	}

	pub(crate) fn out(&self, entity: &Entity) -> Result<Entity> {
		Ok(self.outbound(entity)?)
	}
}
