//! Adapters over the evaluation-side entity kinds.

use tether_model::{Entity, ItemDefinitionOps, ItemOps, MetadataOps, ProjectOps, PropertyOps, Result};

use super::node::LinkedNode;

/// Proxy for an evaluated project hosted in another context.
pub(crate) struct LinkedProject {
	node: LinkedNode,
}

impl LinkedProject {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedProject, Project);

impl ProjectOps for LinkedProject {
	fn full_path(&self) -> Result<String> {
		self.node.with_project(|p| p.full_path())
	}

	fn properties(&self) -> Result<Vec<Entity>> {
		let properties = self.node.with_project(|p| p.properties())?;
		self.node.back_vec(properties)
	}

	fn property(&self, name: &str) -> Result<Option<Entity>> {
		let property = self.node.with_project(|p| p.property(name))?;
		self.node.back_opt(property)
	}

	fn property_value(&self, name: &str) -> Result<Option<String>> {
		self.node.with_project(|p| p.property_value(name))
	}

	fn set_property(&self, name: &str, value: &str) -> Result<Entity> {
		let property = self.node.with_project(|p| p.set_property(name, value))?;
		self.node.back(property)
	}

	fn items(&self) -> Result<Vec<Entity>> {
		let items = self.node.with_project(|p| p.items())?;
		self.node.back_vec(items)
	}

	fn items_of_type(&self, item_type: &str) -> Result<Vec<Entity>> {
		let items = self.node.with_project(|p| p.items_of_type(item_type))?;
		self.node.back_vec(items)
	}

	fn add_item(&self, item_type: &str, include: &str) -> Result<Entity> {
		let item = self.node.with_project(|p| p.add_item(item_type, include))?;
		self.node.back(item)
	}

	fn remove_item(&self, item: &Entity) -> Result<()> {
		let item = self.node.out(item)?;
		self.node.with_project(|p| p.remove_item(&item))
	}

	fn item_definitions(&self) -> Result<Vec<Entity>> {
		let definitions = self.node.with_project(|p| p.item_definitions())?;
		self.node.back_vec(definitions)
	}

	fn item_definition(&self, item_type: &str) -> Result<Option<Entity>> {
		let definition = self.node.with_project(|p| p.item_definition(item_type))?;
		self.node.back_opt(definition)
	}
}

/// Proxy for an evaluated property.
pub(crate) struct LinkedProperty {
	node: LinkedNode,
}

impl LinkedProperty {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedProperty, Property);

impl PropertyOps for LinkedProperty {
	fn name(&self) -> Result<String> {
		self.node.with_property(|p| p.name())
	}

	fn value(&self) -> Result<String> {
		self.node.with_property(|p| p.value())
	}

	fn set_value(&self, value: &str) -> Result<()> {
		self.node.with_property(|p| p.set_value(value))
	}

	fn unevaluated(&self) -> Result<String> {
		self.node.with_property(|p| p.unevaluated())
	}

	fn is_reserved(&self) -> bool {
		self.node.with_property(|p| Ok(p.is_reserved())).unwrap_or(false)
	}

	fn is_environment(&self) -> bool {
		self.node
			.with_property(|p| Ok(p.is_environment()))
			.unwrap_or(false)
	}
}

/// Proxy for an evaluated item.
pub(crate) struct LinkedItem {
	node: LinkedNode,
}

impl LinkedItem {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedItem, Item);

impl ItemOps for LinkedItem {
	fn item_type(&self) -> Result<String> {
		self.node.with_item(|i| i.item_type())
	}

	fn evaluated_include(&self) -> Result<String> {
		self.node.with_item(|i| i.evaluated_include())
	}

	fn set_include(&self, include: &str) -> Result<()> {
		self.node.with_item(|i| i.set_include(include))
	}

	fn metadata(&self) -> Result<Vec<Entity>> {
		let metadata = self.node.with_item(|i| i.metadata())?;
		self.node.back_vec(metadata)
	}

	fn metadata_value(&self, name: &str) -> Result<Option<String>> {
		self.node.with_item(|i| i.metadata_value(name))
	}

	fn set_metadata(&self, name: &str, value: &str) -> Result<Entity> {
		let metadatum = self.node.with_item(|i| i.set_metadata(name, value))?;
		self.node.back(metadatum)
	}

	fn remove_metadata(&self, name: &str) -> Result<()> {
		self.node.with_item(|i| i.remove_metadata(name))
	}

	fn has_metadata(&self, name: &str) -> Result<bool> {
		self.node.with_item(|i| i.has_metadata(name))
	}
}

/// Proxy for an item definition.
pub(crate) struct LinkedItemDefinition {
	node: LinkedNode,
}

impl LinkedItemDefinition {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedItemDefinition, ItemDefinition);

impl ItemDefinitionOps for LinkedItemDefinition {
	fn item_type(&self) -> Result<String> {
		self.node.with_item_definition(|d| d.item_type())
	}

	fn metadata(&self) -> Result<Vec<Entity>> {
		let metadata = self.node.with_item_definition(|d| d.metadata())?;
		self.node.back_vec(metadata)
	}

	fn metadata_value(&self, name: &str) -> Result<Option<String>> {
		self.node.with_item_definition(|d| d.metadata_value(name))
	}
}

/// Proxy for a metadatum.
pub(crate) struct LinkedMetadata {
	node: LinkedNode,
}

impl LinkedMetadata {
	pub(crate) fn new(node: LinkedNode) -> Self {
		Self { node }
	}
}

impl_linked!(LinkedMetadata, Metadata);

impl MetadataOps for LinkedMetadata {
	fn name(&self) -> Result<String> {
		self.node.with_metadata(|m| m.name())
	}

	fn value(&self) -> Result<String> {
		self.node.with_metadata(|m| m.value())
	}

	fn set_value(&self, value: &str) -> Result<()> {
		self.node.with_metadata(|m| m.set_value(value))
	}

	fn item_type(&self) -> Result<String> {
		self.node.with_metadata(|m| m.item_type())
	}
}
