//! Adapters over the construction-side entity kinds.

use tether_model::{DocumentOps, Entity, GroupOps, LeafOps, Result};

use super::node::LinkedNode;

/// Proxy for a document root hosted in another context.
pub(crate) struct LinkedDocument {
	node: LinkedNode,
}

impl LinkedDocument {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedDocument, Document);
impl_linked_node!(LinkedDocument);
impl_linked_container!(LinkedDocument);

impl DocumentOps for LinkedDocument {
	fn full_path(&self) -> Result<String> {
		self.node.with_document(|d| d.full_path())
	}

	fn set_full_path(&self, path: &str) -> Result<()> {
		self.node.with_document(|d| d.set_full_path(path))
	}

	fn version(&self) -> Result<u32> {
		self.node.with_document(|d| d.version())
	}

	fn create_group(&self, name: &str) -> Result<Entity> {
		let group = self.node.with_document(|d| d.create_group(name))?;
		self.node.back(group)
	}

	fn create_leaf(&self, name: &str, value: &str) -> Result<Entity> {
		let leaf = self.node.with_document(|d| d.create_leaf(name, value))?;
		self.node.back(leaf)
	}
}

/// Proxy for an interior group node.
pub(crate) struct LinkedGroup {
	node: LinkedNode,
}

impl LinkedGroup {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedGroup, Group);
impl_linked_node!(LinkedGroup);
impl_linked_container!(LinkedGroup);

impl GroupOps for LinkedGroup {
	fn name(&self) -> Result<String> {
		self.node.with_group(|g| g.name())
	}
}

/// Proxy for a leaf node.
pub(crate) struct LinkedLeaf {
	node: LinkedNode,
}

impl LinkedLeaf {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedLeaf, Leaf);
impl_linked_node!(LinkedLeaf);

impl LeafOps for LinkedLeaf {
	fn name(&self) -> Result<String> {
		self.node.with_leaf(|l| l.name())
	}

	fn value(&self) -> Result<String> {
		self.node.with_leaf(|l| l.value())
	}

	fn set_value(&self, value: &str) -> Result<()> {
		self.node.with_leaf(|l| l.set_value(value))
	}
}
