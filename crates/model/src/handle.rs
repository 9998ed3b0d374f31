//! Cross-context object handles.
//!
//! A `Handle` carries no references, only two integers, so it is safe to
//! pass through any transport. `LocalId(0)` is the null sentinel and must
//! short-circuit before any table lookup.

use std::fmt;

/// Identifier of a collection context within its connectivity group.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ContextId(pub u32);

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ctx{}", self.0)
	}
}

/// Identifier of an object within one context's export table.
///
/// Zero denotes null and is never allocated.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LocalId(pub u32);

impl LocalId {
	/// The null sentinel.
	pub const NULL: Self = Self(0);

	/// Returns true for the null sentinel.
	#[must_use]
	pub const fn is_null(self) -> bool {
		self.0 == 0
	}
}

impl fmt::Display for LocalId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "obj{}", self.0)
	}
}

/// Identity of a remotely owned object: owning context plus the id the
/// owner's export table assigned.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
	/// Context that exported the object.
	pub owner: ContextId,
	/// Id within the owner's export table.
	pub local: LocalId,
}

impl Handle {
	/// The null handle.
	pub const NULL: Self = Self {
		owner: ContextId(0),
		local: LocalId::NULL,
	};

	/// Builds a handle from its parts.
	#[must_use]
	pub const fn new(owner: ContextId, local: LocalId) -> Self {
		Self { owner, local }
	}

	/// Returns true when this handle denotes null.
	#[must_use]
	pub const fn is_null(self) -> bool {
		self.local.is_null()
	}
}

impl fmt::Display for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_null() {
			write!(f, "null")
		} else {
			write!(f, "{}/{}", self.owner, self.local)
		}
	}
}
