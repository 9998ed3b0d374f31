//! Entity kind tags.

use std::fmt;

/// The closed set of entity kinds the proxying layer understands.
///
/// The exporting side attaches the kind tag when it first registers an
/// object; the importing side uses it to pick the adapter type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EntityKind {
	/// Document root; a container of top-level nodes.
	Document,
	/// Interior container node (group of nodes).
	Group,
	/// Leaf node carrying a name and a value.
	Leaf,
	/// Evaluated project.
	Project,
	/// Evaluated property.
	Property,
	/// Evaluated item.
	Item,
	/// Evaluated item definition.
	ItemDefinition,
	/// Metadata attached to an item or item definition.
	Metadata,
}

impl EntityKind {
	/// Stable label for diagnostics.
	#[must_use]
	pub const fn label(self) -> &'static str {
		match self {
			Self::Document => "document",
			Self::Group => "group",
			Self::Leaf => "leaf",
			Self::Project => "project",
			Self::Property => "property",
			Self::Item => "item",
			Self::ItemDefinition => "item-definition",
			Self::Metadata => "metadata",
		}
	}
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}
