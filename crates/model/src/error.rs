//! Error taxonomy shared by the authoritative model and the link layer.
//!
//! Both enums are `Clone + PartialEq` so the equivalence validator can
//! compare the failure a proxy reports against the failure the
//! authoritative side reports; a proxy must surface authoritative errors
//! unchanged in kind and content.

use crate::handle::{ContextId, Handle};
use crate::kind::EntityKind;

/// Result alias used across the entity contracts.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Failures of the identity/linking layer itself.
///
/// Distinct from [`ModelError`] so callers can tell a topology mistake
/// (`NotConnected`) from a stale reference (`UnknownHandle`).
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LinkError {
	/// The id is not (or no longer) present in the relevant table.
	#[error("{handle} is not an active object")]
	UnknownHandle {
		/// The handle that failed to resolve.
		handle: Handle,
	},

	/// The handle's owner was never connected to the resolving context.
	#[error("{resolver} is not connected to {owner}")]
	NotConnected {
		/// Context that exported the handle.
		owner: ContextId,
		/// Context that attempted the import.
		resolver: ContextId,
	},

	/// Factory dispatch found no adapter for the kind tag.
	#[error("no link adapter implemented for entity kind `{kind}`")]
	UnsupportedKind {
		/// The offending kind.
		kind: EntityKind,
	},

	/// A context needed for forwarding has been dropped.
	#[error("owning collection context is gone")]
	ContextGone,
}

/// Failures raised by entity operations.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ModelError {
	/// Writing a reserved property.
	#[error("property `{name}` is read-only")]
	ReadOnly {
		/// Property name.
		name: String,
	},

	/// Reading the unevaluated form of a property with no backing element.
	#[error("property `{name}` has no backing element")]
	NotBacked {
		/// Property name.
		name: String,
	},

	/// The reference node is not a child of this container.
	#[error("reference node is not a child of this container")]
	NotChild,

	/// The node (or its document) is no longer reachable.
	#[error("node is not attached to a live document")]
	Orphaned,

	/// Inserting a node that already has a parent.
	#[error("node already has a parent")]
	AlreadyParented,

	/// Inserting a node that belongs to a different document.
	#[error("node belongs to a different document")]
	ForeignChild,

	/// Inserting a container into its own subtree.
	#[error("cannot insert a node into its own subtree")]
	SelfInsert,

	/// Item metadata lookup failed.
	#[error("no metadata named `{name}`")]
	UnknownMetadata {
		/// Metadata name.
		name: String,
	},

	/// Item removal did not find the item.
	#[error("item is not part of this project")]
	UnknownItem,

	/// A linking failure surfaced through an entity operation.
	#[error(transparent)]
	Link(#[from] LinkError),
}
