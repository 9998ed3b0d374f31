//! Authoritative evaluated-project objects.
//!
//! Evaluation here is deliberately trivial (no conditions, no expansion);
//! the layer only consumes the evaluated shape. Projects can be built
//! programmatically or via [`LocalProject::evaluate`].

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::entity::Entity;
use crate::error::{ModelError, Result};
use crate::handle::Handle;
use crate::kind::EntityKind;
use crate::ops::{GroupOps, ItemDefinitionOps, ItemOps, LeafOps, Linkable, MetadataOps, ProjectOps, PropertyOps};

/// Name of the reserved property seeded by [`LocalProject::evaluate`].
pub const RESERVED_PROJECT_PATH: &str = "ProjectPath";

/// Authoritative evaluated project.
pub struct LocalProject {
	state: Mutex<ProjectState>,
}

struct ProjectState {
	full_path: String,
	properties: Vec<Arc<LocalProperty>>,
	items: Vec<Arc<LocalItem>>,
	item_definitions: Vec<Arc<LocalItemDefinition>>,
}

/// Authoritative evaluated property.
pub struct LocalProperty {
	name: String,
	reserved: bool,
	environment: bool,
	state: Mutex<PropState>,
}

struct PropState {
	value: String,
	unevaluated: String,
}

/// Authoritative evaluated item.
pub struct LocalItem {
	item_type: String,
	state: Mutex<ItemState>,
}

struct ItemState {
	include: String,
	metadata: Vec<Arc<LocalMetadata>>,
}

/// Authoritative item definition.
pub struct LocalItemDefinition {
	item_type: String,
	metadata: Vec<Arc<LocalMetadata>>,
}

/// Authoritative metadatum.
pub struct LocalMetadata {
	name: String,
	item_type: String,
	value: Mutex<String>,
}

impl LocalProject {
	/// Creates an empty project.
	pub fn new(full_path: impl Into<String>) -> Arc<Self> {
		Arc::new(Self {
			state: Mutex::new(ProjectState {
				full_path: full_path.into(),
				properties: Vec::new(),
				items: Vec::new(),
				item_definitions: Vec::new(),
			}),
		})
	}

	/// This project as an [`Entity`].
	#[must_use]
	pub fn entity(self: &Arc<Self>) -> Entity {
		Entity::Project(self.clone())
	}

	/// Evaluates a document: root-level leaves become properties, leaves
	/// inside a group become items of the group's item type.
	pub fn evaluate(doc: &Arc<crate::local::LocalDocument>) -> Result<Arc<Self>> {
		use crate::ops::{ContainerOps, DocumentOps};

		let project = Self::new(doc.full_path()?);
		project.seed_reserved(RESERVED_PROJECT_PATH, &doc.full_path()?);
		for child in doc.children()? {
			match &child {
				Entity::Leaf(leaf) => {
					project.set_property(&leaf.name()?, &leaf.value()?)?;
				}
				Entity::Group(group) => {
					let item_type = group.name()?;
					Self::evaluate_group(&project, &item_type, &child)?;
				}
				_ => {}
			}
		}
		Ok(project)
	}

	fn evaluate_group(project: &Arc<Self>, item_type: &str, group: &Entity) -> Result<()> {
		let Some(container) = group.as_container() else {
			return Ok(());
		};
		for child in container.children()? {
			match &child {
				Entity::Leaf(leaf) => {
					let value = leaf.value()?;
					let include = if value.is_empty() { leaf.name()? } else { value };
					project.add_item(item_type, &include)?;
				}
				// Nested groups flatten into the outer item type.
				Entity::Group(_) => Self::evaluate_group(project, item_type, &child)?,
				_ => {}
			}
		}
		Ok(())
	}

	fn insert_property(&self, name: &str, value: &str, reserved: bool, environment: bool) -> Entity {
		let mut st = self.state.lock();
		if let Some(existing) = st.properties.iter().find(|p| p.name == name) {
			let mut ps = existing.state.lock();
			ps.value = value.to_owned();
			ps.unevaluated = value.to_owned();
			return Entity::Property(existing.clone());
		}
		let prop = Arc::new(LocalProperty {
			name: name.to_owned(),
			reserved,
			environment,
			state: Mutex::new(PropState {
				value: value.to_owned(),
				unevaluated: value.to_owned(),
			}),
		});
		st.properties.push(prop.clone());
		Entity::Property(prop)
	}

	/// Seeds a reserved (read-only, unbacked) property.
	pub fn seed_reserved(&self, name: &str, value: &str) -> Entity {
		self.insert_property(name, value, true, false)
	}

	/// Seeds an environment-derived property.
	pub fn seed_environment(&self, name: &str, value: &str) -> Entity {
		self.insert_property(name, value, false, true)
	}

	/// Adds an item definition with default metadata.
	pub fn add_item_definition(&self, item_type: &str, defaults: &[(&str, &str)]) -> Entity {
		let def = Arc::new(LocalItemDefinition {
			item_type: item_type.to_owned(),
			metadata: defaults
				.iter()
				.map(|(name, value)| {
					Arc::new(LocalMetadata {
						name: (*name).to_owned(),
						item_type: item_type.to_owned(),
						value: Mutex::new((*value).to_owned()),
					})
				})
				.collect(),
		});
		self.state.lock().item_definitions.push(def.clone());
		Entity::ItemDefinition(def)
	}
}

impl Linkable for LocalProject {
	fn kind(&self) -> EntityKind {
		EntityKind::Project
	}

	fn is_linked(&self) -> bool {
		false
	}

	fn link_handle(&self) -> Option<Handle> {
		None
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl ProjectOps for LocalProject {
	fn full_path(&self) -> Result<String> {
		Ok(self.state.lock().full_path.clone())
	}

	fn properties(&self) -> Result<Vec<Entity>> {
		Ok(self
			.state
			.lock()
			.properties
			.iter()
			.map(|p| Entity::Property(p.clone()))
			.collect())
	}

	fn property(&self, name: &str) -> Result<Option<Entity>> {
		Ok(self
			.state
			.lock()
			.properties
			.iter()
			.find(|p| p.name == name)
			.map(|p| Entity::Property(p.clone())))
	}

	fn property_value(&self, name: &str) -> Result<Option<String>> {
		Ok(self
			.state
			.lock()
			.properties
			.iter()
			.find(|p| p.name == name)
			.map(|p| p.state.lock().value.clone()))
	}

	fn set_property(&self, name: &str, value: &str) -> Result<Entity> {
		{
			let st = self.state.lock();
			if let Some(existing) = st.properties.iter().find(|p| p.name == name)
				&& existing.reserved
			{
				return Err(ModelError::ReadOnly { name: name.to_owned() });
			}
		}
		Ok(self.insert_property(name, value, false, false))
	}

	fn items(&self) -> Result<Vec<Entity>> {
		Ok(self.state.lock().items.iter().map(|i| Entity::Item(i.clone())).collect())
	}

	fn items_of_type(&self, item_type: &str) -> Result<Vec<Entity>> {
		Ok(self
			.state
			.lock()
			.items
			.iter()
			.filter(|i| i.item_type == item_type)
			.map(|i| Entity::Item(i.clone()))
			.collect())
	}

	fn add_item(&self, item_type: &str, include: &str) -> Result<Entity> {
		let item = Arc::new(LocalItem {
			item_type: item_type.to_owned(),
			state: Mutex::new(ItemState {
				include: include.to_owned(),
				metadata: Vec::new(),
			}),
		});
		self.state.lock().items.push(item.clone());
		Ok(Entity::Item(item))
	}

	fn remove_item(&self, item: &Entity) -> Result<()> {
		let Some(target) = item.linkable().as_any().downcast_ref::<LocalItem>() else {
			return Err(ModelError::UnknownItem);
		};
		let mut st = self.state.lock();
		let before = st.items.len();
		st.items.retain(|i| !std::ptr::eq::<LocalItem>(Arc::as_ref(i), target));
		if st.items.len() == before {
			return Err(ModelError::UnknownItem);
		}
		Ok(())
	}

	fn item_definitions(&self) -> Result<Vec<Entity>> {
		Ok(self
			.state
			.lock()
			.item_definitions
			.iter()
			.map(|d| Entity::ItemDefinition(d.clone()))
			.collect())
	}

	fn item_definition(&self, item_type: &str) -> Result<Option<Entity>> {
		Ok(self
			.state
			.lock()
			.item_definitions
			.iter()
			.find(|d| d.item_type == item_type)
			.map(|d| Entity::ItemDefinition(d.clone())))
	}
}

impl Linkable for LocalProperty {
	fn kind(&self) -> EntityKind {
		EntityKind::Property
	}

	fn is_linked(&self) -> bool {
		false
	}

	fn link_handle(&self) -> Option<Handle> {
		None
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl PropertyOps for LocalProperty {
	fn name(&self) -> Result<String> {
		Ok(self.name.clone())
	}

	fn value(&self) -> Result<String> {
		Ok(self.state.lock().value.clone())
	}

	fn set_value(&self, value: &str) -> Result<()> {
		if self.reserved {
			return Err(ModelError::ReadOnly { name: self.name.clone() });
		}
		let mut st = self.state.lock();
		st.value = value.to_owned();
		st.unevaluated = value.to_owned();
		Ok(())
	}

	fn unevaluated(&self) -> Result<String> {
		if self.reserved || self.environment {
			return Err(ModelError::NotBacked { name: self.name.clone() });
		}
		Ok(self.state.lock().unevaluated.clone())
	}

	fn is_reserved(&self) -> bool {
		self.reserved
	}

	fn is_environment(&self) -> bool {
		self.environment
	}
}

impl Linkable for LocalItem {
	fn kind(&self) -> EntityKind {
		EntityKind::Item
	}

	fn is_linked(&self) -> bool {
		false
	}

	fn link_handle(&self) -> Option<Handle> {
		None
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl ItemOps for LocalItem {
	fn item_type(&self) -> Result<String> {
		Ok(self.item_type.clone())
	}

	fn evaluated_include(&self) -> Result<String> {
		Ok(self.state.lock().include.clone())
	}

	fn set_include(&self, include: &str) -> Result<()> {
		self.state.lock().include = include.to_owned();
		Ok(())
	}

	fn metadata(&self) -> Result<Vec<Entity>> {
		Ok(self
			.state
			.lock()
			.metadata
			.iter()
			.map(|m| Entity::Metadata(m.clone()))
			.collect())
	}

	fn metadata_value(&self, name: &str) -> Result<Option<String>> {
		Ok(self
			.state
			.lock()
			.metadata
			.iter()
			.find(|m| m.name == name)
			.map(|m| m.value.lock().clone()))
	}

	fn set_metadata(&self, name: &str, value: &str) -> Result<Entity> {
		let mut st = self.state.lock();
		if let Some(existing) = st.metadata.iter().find(|m| m.name == name) {
			*existing.value.lock() = value.to_owned();
			return Ok(Entity::Metadata(existing.clone()));
		}
		let meta = Arc::new(LocalMetadata {
			name: name.to_owned(),
			item_type: self.item_type.clone(),
			value: Mutex::new(value.to_owned()),
		});
		st.metadata.push(meta.clone());
		Ok(Entity::Metadata(meta))
	}

	fn remove_metadata(&self, name: &str) -> Result<()> {
		let mut st = self.state.lock();
		let before = st.metadata.len();
		st.metadata.retain(|m| m.name != name);
		if st.metadata.len() == before {
			return Err(ModelError::UnknownMetadata { name: name.to_owned() });
		}
		Ok(())
	}

	fn has_metadata(&self, name: &str) -> Result<bool> {
		Ok(self.state.lock().metadata.iter().any(|m| m.name == name))
	}
}

impl Linkable for LocalItemDefinition {
	fn kind(&self) -> EntityKind {
		EntityKind::ItemDefinition
	}

	fn is_linked(&self) -> bool {
		false
	}

	fn link_handle(&self) -> Option<Handle> {
		None
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl ItemDefinitionOps for LocalItemDefinition {
	fn item_type(&self) -> Result<String> {
		Ok(self.item_type.clone())
	}

	fn metadata(&self) -> Result<Vec<Entity>> {
		Ok(self.metadata.iter().map(|m| Entity::Metadata(m.clone())).collect())
	}

	fn metadata_value(&self, name: &str) -> Result<Option<String>> {
		Ok(self
			.metadata
			.iter()
			.find(|m| m.name == name)
			.map(|m| m.value.lock().clone()))
	}
}

impl Linkable for LocalMetadata {
	fn kind(&self) -> EntityKind {
		EntityKind::Metadata
	}

	fn is_linked(&self) -> bool {
		false
	}

	fn link_handle(&self) -> Option<Handle> {
		None
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl MetadataOps for LocalMetadata {
	fn name(&self) -> Result<String> {
		Ok(self.name.clone())
	}

	fn value(&self) -> Result<String> {
		Ok(self.value.lock().clone())
	}

	fn set_value(&self, value: &str) -> Result<()> {
		*self.value.lock() = value.to_owned();
		Ok(())
	}

	fn item_type(&self) -> Result<String> {
		Ok(self.item_type.clone())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::local::LocalDocument;
	use crate::ops::{ContainerOps, DocumentOps};

	#[test]
	fn set_property_keeps_identity_on_update() {
		let project = LocalProject::new("demo.proj");
		let first = project.set_property("A", "1").unwrap();
		let second = project.set_property("A", "2").unwrap();
		assert!(first.ptr_eq(&second), "updating must not replace the property instance");
		assert_eq!(project.property_value("A").unwrap(), Some("2".to_owned()));
		assert_eq!(project.properties().unwrap().len(), 1);
	}

	#[test]
	fn reserved_property_rejects_writes_and_unevaluated() {
		let project = LocalProject::new("demo.proj");
		let prop = project.seed_reserved("ProjectPath", "demo.proj");
		let ops = prop.as_property().unwrap();
		assert_eq!(
			ops.set_value("x").unwrap_err(),
			ModelError::ReadOnly { name: "ProjectPath".to_owned() }
		);
		assert_eq!(
			ops.unevaluated().unwrap_err(),
			ModelError::NotBacked { name: "ProjectPath".to_owned() }
		);
		assert_eq!(
			project.set_property("ProjectPath", "elsewhere").unwrap_err(),
			ModelError::ReadOnly { name: "ProjectPath".to_owned() }
		);
	}

	#[test]
	fn environment_property_reads_but_has_no_backing() {
		let project = LocalProject::new("demo.proj");
		let prop = project.seed_environment("HOME", "/home/u");
		let ops = prop.as_property().unwrap();
		assert_eq!(ops.value().unwrap(), "/home/u");
		assert!(ops.is_environment());
		assert_eq!(ops.unevaluated().unwrap_err(), ModelError::NotBacked { name: "HOME".to_owned() });
	}

	#[test]
	fn item_metadata_round_trip() {
		let project = LocalProject::new("demo.proj");
		let item = project.add_item("Compile", "main.rs").unwrap();
		let ops = item.as_item().unwrap();
		let m1 = ops.set_metadata("Visible", "true").unwrap();
		let m2 = ops.set_metadata("Visible", "false").unwrap();
		assert!(m1.ptr_eq(&m2));
		assert_eq!(ops.metadata_value("Visible").unwrap(), Some("false".to_owned()));
		assert!(ops.has_metadata("Visible").unwrap());
		ops.remove_metadata("Visible").unwrap();
		assert!(!ops.has_metadata("Visible").unwrap());
		assert_eq!(
			ops.remove_metadata("Visible").unwrap_err(),
			ModelError::UnknownMetadata { name: "Visible".to_owned() }
		);
	}

	#[test]
	fn remove_item_by_identity() {
		let project = LocalProject::new("demo.proj");
		let a = project.add_item("Compile", "a.rs").unwrap();
		let _b = project.add_item("Compile", "b.rs").unwrap();
		project.remove_item(&a).unwrap();
		assert_eq!(project.items().unwrap().len(), 1);
		assert_eq!(project.remove_item(&a).unwrap_err(), ModelError::UnknownItem);
	}

	#[test]
	fn items_of_type_filters_in_order() {
		let project = LocalProject::new("demo.proj");
		project.add_item("Compile", "a.rs").unwrap();
		project.add_item("None", "readme.md").unwrap();
		project.add_item("Compile", "b.rs").unwrap();
		let includes: Vec<String> = project
			.items_of_type("Compile")
			.unwrap()
			.iter()
			.map(|i| i.as_item().unwrap().evaluated_include().unwrap())
			.collect();
		assert_eq!(includes, ["a.rs", "b.rs"]);
	}

	#[test]
	fn evaluate_expands_leaves_and_groups() {
		let doc = LocalDocument::new("demo.proj");
		doc.append_child(&doc.create_leaf("Configuration", "Debug").unwrap()).unwrap();
		let group = doc.create_group("Compile").unwrap();
		doc.append_child(&group).unwrap();
		group
			.as_container()
			.unwrap()
			.append_child(&doc.create_leaf("main.rs", "").unwrap())
			.unwrap();
		group
			.as_container()
			.unwrap()
			.append_child(&doc.create_leaf("lib", "lib.rs").unwrap())
			.unwrap();

		let project = LocalProject::evaluate(&doc).unwrap();
		assert_eq!(project.property_value("Configuration").unwrap(), Some("Debug".to_owned()));
		assert_eq!(
			project.property_value(RESERVED_PROJECT_PATH).unwrap(),
			Some("demo.proj".to_owned())
		);
		let includes: Vec<String> = project
			.items()
			.unwrap()
			.iter()
			.map(|i| i.as_item().unwrap().evaluated_include().unwrap())
			.collect();
		assert_eq!(includes, ["main.rs", "lib.rs"]);
	}
}
