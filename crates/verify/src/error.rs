//! Validator failures.

use tether_model::LinkError;

/// Outcome of an equivalence check.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// A proven difference between the proxy view and the authoritative graph.
///
/// `path` locates the offending node from the verification root, e.g.
/// `root/E2/Flag`. Every variant is a hard failure; the validator stops at
/// the first divergence it can prove.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum VerifyError {
	/// An observable accessor returned different values on the two sides.
	#[error("{path}: {field} differs (view {view:?}, real {real:?})")]
	Mismatch {
		/// Node path from the verification root.
		path: String,
		/// Accessor that diverged.
		field: &'static str,
		/// Value seen through the proxy.
		view: String,
		/// Value on the authoritative side.
		real: String,
	},

	/// The view side is not a proxy, or the real side is one.
	#[error("{path}: expected a linked view over an authoritative object")]
	LinkFlag {
		/// Node path from the verification root.
		path: String,
	},

	/// The two kinds cannot be compared.
	#[error("{path}: kind differs (view {view}, real {real})")]
	KindMismatch {
		/// Node path from the verification root.
		path: String,
		/// Kind reported by the view.
		view: tether_model::EntityKind,
		/// Kind reported by the authoritative side.
		real: tether_model::EntityKind,
	},

	/// Containers disagree on how many children they hold.
	#[error("{path}: child count differs (view {view}, real {real})")]
	ChildCount {
		/// Node path from the verification root.
		path: String,
		/// Count seen through the proxy.
		view: usize,
		/// Count on the authoritative side.
		real: usize,
	},

	/// A child's resolved parent is not the node it was walked under.
	#[error("{path}: parent() does not resolve to the walked container")]
	ParentIdentity {
		/// Node path from the verification root.
		path: String,
	},

	/// One side failed where the other succeeded, or the failures differ.
	#[error("{path}: {field} errors diverge (view {view:?}, real {real:?})")]
	ErrorDivergence {
		/// Node path from the verification root.
		path: String,
		/// Accessor that diverged.
		field: &'static str,
		/// Error text seen through the proxy, `None` on success.
		view: Option<String>,
		/// Error text on the authoritative side, `None` on success.
		real: Option<String>,
	},

	/// The validator itself could not traverse the link.
	#[error(transparent)]
	Link(#[from] LinkError),
}
