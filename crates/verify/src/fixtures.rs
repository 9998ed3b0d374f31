//! Ready-made mirrored graphs for validator tests and examples.

use std::sync::Arc;

use tether_link::{CollectionContext, ConnectivityGroup, LinkError};
use tether_model::local::{LocalDocument, LocalProject};
use tether_model::{ContainerOps, DocumentOps, Entity, ModelError};

/// Two connected contexts: one hosting authoritative objects, one viewing
/// them through proxies.
pub struct Mirror {
	/// The connectivity group owning both contexts.
	pub group: ConnectivityGroup,
	/// Context the authoritative objects are exported from.
	pub host: Arc<CollectionContext>,
	/// Context that resolves handles into proxies.
	pub viewer: Arc<CollectionContext>,
}

impl Mirror {
	/// Builds a fully connected two-context group.
	#[must_use]
	pub fn new() -> Self {
		let group = ConnectivityGroup::new();
		let host = group.create_context();
		let viewer = group.create_context();
		group.connect_all();
		Self { group, host, viewer }
	}

	/// Exports `real` from the host and imports it into the viewer,
	/// returning the proxy.
	pub fn reflect(&self, real: &Entity) -> Result<Entity, LinkError> {
		let handle = self.host.export(Some(real));
		self.viewer
			.import(handle)?
			.ok_or(LinkError::UnknownHandle { handle })
	}
}

impl Default for Mirror {
	fn default() -> Self {
		Self::new()
	}
}

/// A document with two top-level groups, one nested leaf each, and one
/// top-level configuration leaf.
pub fn sample_document() -> Result<Arc<LocalDocument>, ModelError> {
	let doc = LocalDocument::new("/proj/build.doc");
	let root = doc.entity();
	let container = root.as_container().ok_or(ModelError::Orphaned)?;
	for (group_name, leaf_name, value) in [
		("Compile", "main.rs", "src/main.rs"),
		("Resource", "icon.png", "assets/icon.png"),
	] {
		let group = doc.create_group(group_name)?;
		container.append_child(&group)?;
		let leaf = doc.create_leaf(leaf_name, value)?;
		group
			.as_container()
			.ok_or(ModelError::Orphaned)?
			.append_child(&leaf)?;
	}
	let config = doc.create_leaf("Configuration", "Release")?;
	container.insert_after(&config, None)?;
	Ok(doc)
}

/// Evaluates [`sample_document`] into a project with a seeded environment
/// property and one item definition.
pub fn sample_project() -> Result<(Arc<LocalDocument>, Arc<LocalProject>), ModelError> {
	let doc = sample_document()?;
	let project = LocalProject::evaluate(&doc)?;
	project.seed_environment("Platform", "x64");
	project.add_item_definition("Compile", &[("Warn", "all"), ("Opt", "2")]);
	Ok((doc, project))
}
