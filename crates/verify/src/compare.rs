//! Pairwise graph comparison.
//!
//! The validator walks a proxy view and the authoritative graph it claims
//! to mirror, comparing every observable — including the failures. A
//! `Result`-returning accessor must agree on both sides: same value on
//! success, same error on failure. Divergence of any kind stops the walk
//! with an error naming the node path and field.

use tether_model::{
	ContainerOps, DocumentNodeOps, Entity, EntityKind, ModelError,
};

use crate::error::{Result, VerifyError};

/// Node path from the verification root, grown as the walk descends.
#[derive(Clone)]
struct Cursor {
	path: String,
}

impl Cursor {
	fn root() -> Self {
		Self {
			path: "root".to_owned(),
		}
	}

	fn child(&self, label: &str) -> Self {
		Self {
			path: format!("{}/{}", self.path, label),
		}
	}
}

type ModelResult<T> = std::result::Result<T, ModelError>;

/// Compares one accessor across both sides. Equal successes and equal
/// failures both pass; everything else is a divergence.
fn field<T: PartialEq + std::fmt::Debug>(
	cur: &Cursor,
	field: &'static str,
	view: ModelResult<T>,
	real: ModelResult<T>,
) -> Result<()> {
	match (view, real) {
		(Ok(v), Ok(r)) => {
			if v == r {
				Ok(())
			} else {
				Err(VerifyError::Mismatch {
					path: cur.path.clone(),
					field,
					view: format!("{v:?}"),
					real: format!("{r:?}"),
				})
			}
		}
		(Err(v), Err(r)) if v == r => Ok(()),
		(view, real) => Err(VerifyError::ErrorDivergence {
			path: cur.path.clone(),
			field,
			view: view.err().map(|e| e.to_string()),
			real: real.err().map(|e| e.to_string()),
		}),
	}
}

/// Unwraps a pair of accessor results for further traversal. Matching
/// failures end the walk down this branch without being an error.
fn both<T>(
	cur: &Cursor,
	field: &'static str,
	view: ModelResult<T>,
	real: ModelResult<T>,
) -> Result<Option<(T, T)>> {
	match (view, real) {
		(Ok(v), Ok(r)) => Ok(Some((v, r))),
		(Err(v), Err(r)) if v == r => Ok(None),
		(view, real) => Err(VerifyError::ErrorDivergence {
			path: cur.path.clone(),
			field,
			view: view.err().map(|e| e.to_string()),
			real: real.err().map(|e| e.to_string()),
		}),
	}
}

fn plain<T: PartialEq + std::fmt::Debug>(
	cur: &Cursor,
	field: &'static str,
	view: T,
	real: T,
) -> Result<()> {
	if view == real {
		Ok(())
	} else {
		Err(VerifyError::Mismatch {
			path: cur.path.clone(),
			field,
			view: format!("{view:?}"),
			real: format!("{real:?}"),
		})
	}
}

/// A stable label for one child, taken from the authoritative side.
fn child_label(real: &Entity, index: usize) -> String {
	let named = match real {
		Entity::Group(g) => g.name().ok(),
		Entity::Leaf(l) => l.name().ok(),
		Entity::Property(p) => p.name().ok(),
		Entity::Metadata(m) => m.name().ok(),
		Entity::Item(i) => i.evaluated_include().ok(),
		Entity::ItemDefinition(d) => d.item_type().ok(),
		Entity::Document(_) | Entity::Project(_) => None,
	};
	named.unwrap_or_else(|| format!("{}{index}", real.kind()))
}

fn check_flags(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	if !view.is_linked() || real.is_linked() {
		return Err(VerifyError::LinkFlag {
			path: cur.path.clone(),
		});
	}
	Ok(())
}

fn check_kind(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	if view.kind() != real.kind() {
		return Err(VerifyError::KindMismatch {
			path: cur.path.clone(),
			view: view.kind(),
			real: real.kind(),
		});
	}
	Ok(())
}

fn kind_error(cur: &Cursor, view: &Entity, real: &Entity) -> VerifyError {
	VerifyError::KindMismatch {
		path: cur.path.clone(),
		view: view.kind(),
		real: real.kind(),
	}
}

/// Verifies a proxy view against the authoritative graph it mirrors.
///
/// Dispatches on the (agreeing) kind of the pair and recurses through the
/// whole reachable structure: children, siblings, properties, items and
/// their metadata. The view side must be linked, the real side must not.
pub fn verify(view: &Entity, real: &Entity) -> Result<()> {
	verify_at(&Cursor::root(), view, real)
}

fn verify_at(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	check_flags(cur, view, real)?;
	check_kind(cur, view, real)?;
	tracing::trace!(path = %cur.path, kind = %real.kind(), "verifying");
	match real.kind() {
		EntityKind::Document => document_pair(cur, view, real),
		EntityKind::Group => group_pair(cur, view, real),
		EntityKind::Leaf => leaf_pair(cur, view, real),
		EntityKind::Project => project_pair(cur, view, real),
		EntityKind::Property => property_pair(cur, view, real),
		EntityKind::Item => item_pair(cur, view, real),
		EntityKind::ItemDefinition => item_definition_pair(cur, view, real),
		EntityKind::Metadata => metadata_pair(cur, view, real),
	}
}

/// Shared observables of every document node.
fn node_fields(cur: &Cursor, view: &dyn DocumentNodeOps, real: &dyn DocumentNodeOps) -> Result<()> {
	field(cur, "condition", view.condition(), real.condition())?;
	field(cur, "label", view.label(), real.label())?;
	field(cur, "location", view.location(), real.location())?;
	Ok(())
}

/// Verifies that a sibling chain reported via `next`/`previous` matches
/// the order of an already fetched child snapshot.
fn chain_matches(children: &[Entity]) -> ModelResult<bool> {
	for (i, child) in children.iter().enumerate() {
		let Some(node) = child.as_node() else {
			return Ok(false);
		};
		let next_ok = match (node.next_sibling()?, children.get(i + 1)) {
			(Some(next), Some(expected)) => next.ptr_eq(expected),
			(None, None) => true,
			_ => false,
		};
		let prev_ok = match (node.previous_sibling()?, i.checked_sub(1).and_then(|j| children.get(j))) {
			(Some(prev), Some(expected)) => prev.ptr_eq(expected),
			(None, None) => true,
			_ => false,
		};
		if !next_ok || !prev_ok {
			return Ok(false);
		}
	}
	Ok(true)
}

fn container_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let view_c: &dyn ContainerOps = view.as_container().ok_or_else(|| kind_error(cur, view, real))?;
	let real_c: &dyn ContainerOps = real.as_container().ok_or_else(|| kind_error(cur, view, real))?;

	field(cur, "child_count", view_c.child_count(), real_c.child_count())?;
	let Some((view_kids, real_kids)) = both(cur, "children", view_c.children(), real_c.children())?
	else {
		return Ok(());
	};
	if view_kids.len() != real_kids.len() {
		return Err(VerifyError::ChildCount {
			path: cur.path.clone(),
			view: view_kids.len(),
			real: real_kids.len(),
		});
	}

	// Both sibling chains must spell out the same order the snapshots
	// reported.
	if let Some((view_ok, real_ok)) = both(
		cur,
		"sibling_chain",
		chain_matches(&view_kids),
		chain_matches(&real_kids),
	)? {
		plain(cur, "sibling_chain", view_ok, real_ok)?;
	}

	for (index, (view_kid, real_kid)) in view_kids.iter().zip(&real_kids).enumerate() {
		let at = cur.child(&child_label(real_kid, index));
		// A child reached through the view must resolve its parent back
		// to the very proxy it was walked under.
		let node = view_kid.as_node().ok_or_else(|| kind_error(&at, view_kid, real_kid))?;
		match node.parent() {
			Ok(Some(parent)) if parent.ptr_eq(view) => {}
			_ => {
				return Err(VerifyError::ParentIdentity { path: at.path });
			}
		}
		verify_at(&at, view_kid, real_kid)?;
	}
	Ok(())
}

fn document_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_document().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_document().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "full_path", v.full_path(), r.full_path())?;
	field(cur, "version", v.version(), r.version())?;
	node_fields(cur, v, r)?;
	container_pair(cur, view, real)
}

fn group_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_group().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_group().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "name", v.name(), r.name())?;
	node_fields(cur, v, r)?;
	container_pair(cur, view, real)
}

fn leaf_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_leaf().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_leaf().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "name", v.name(), r.name())?;
	field(cur, "value", v.value(), r.value())?;
	node_fields(cur, v, r)
}

fn project_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_project().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_project().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "full_path", v.full_path(), r.full_path())?;

	let pairs = [
		("properties", v.properties(), r.properties()),
		("items", v.items(), r.items()),
		("item_definitions", v.item_definitions(), r.item_definitions()),
	];
	for (name, view_list, real_list) in pairs {
		let Some((view_list, real_list)) = both(cur, name, view_list, real_list)? else {
			continue;
		};
		if view_list.len() != real_list.len() {
			return Err(VerifyError::ChildCount {
				path: cur.child(name).path,
				view: view_list.len(),
				real: real_list.len(),
			});
		}
		for (index, (view_e, real_e)) in view_list.iter().zip(&real_list).enumerate() {
			let at = cur.child(&child_label(real_e, index));
			verify_at(&at, view_e, real_e)?;
		}
	}
	Ok(())
}

fn property_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_property().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_property().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "name", v.name(), r.name())?;
	field(cur, "value", v.value(), r.value())?;
	field(cur, "unevaluated", v.unevaluated(), r.unevaluated())?;
	plain(cur, "is_reserved", v.is_reserved(), r.is_reserved())?;
	plain(cur, "is_environment", v.is_environment(), r.is_environment())
}

fn metadata_list(cur: &Cursor, view: ModelResult<Vec<Entity>>, real: ModelResult<Vec<Entity>>) -> Result<()> {
	let Some((view_list, real_list)) = both(cur, "metadata", view, real)? else {
		return Ok(());
	};
	if view_list.len() != real_list.len() {
		return Err(VerifyError::ChildCount {
			path: cur.path.clone(),
			view: view_list.len(),
			real: real_list.len(),
		});
	}
	for (index, (view_m, real_m)) in view_list.iter().zip(&real_list).enumerate() {
		let at = cur.child(&child_label(real_m, index));
		verify_at(&at, view_m, real_m)?;
	}
	Ok(())
}

fn item_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_item().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_item().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "item_type", v.item_type(), r.item_type())?;
	field(
		cur,
		"evaluated_include",
		v.evaluated_include(),
		r.evaluated_include(),
	)?;
	metadata_list(cur, v.metadata(), r.metadata())
}

fn item_definition_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_item_definition().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_item_definition().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "item_type", v.item_type(), r.item_type())?;
	metadata_list(cur, v.metadata(), r.metadata())
}

fn metadata_pair(cur: &Cursor, view: &Entity, real: &Entity) -> Result<()> {
	let v = view.as_metadata().ok_or_else(|| kind_error(cur, view, real))?;
	let r = real.as_metadata().ok_or_else(|| kind_error(cur, view, real))?;
	field(cur, "name", v.name(), r.name())?;
	field(cur, "value", v.value(), r.value())?;
	field(cur, "item_type", v.item_type(), r.item_type())
}

macro_rules! typed_entry {
	($(#[$meta:meta])* $name:ident, $kind:ident, $pair:ident) => {
		$(#[$meta])*
		pub fn $name(view: &Entity, real: &Entity) -> Result<()> {
			let cur = Cursor::root();
			check_flags(&cur, view, real)?;
			check_kind(&cur, view, real)?;
			if real.kind() != EntityKind::$kind {
				return Err(kind_error(&cur, view, real));
			}
			$pair(&cur, view, real)
		}
	};
}

typed_entry!(
	/// Verifies a document pair, failing on any other kind.
	verify_documents, Document, document_pair
);
typed_entry!(
	/// Verifies a group pair, failing on any other kind.
	verify_groups, Group, group_pair
);
typed_entry!(
	/// Verifies a leaf pair, failing on any other kind.
	verify_leaves, Leaf, leaf_pair
);
typed_entry!(
	/// Verifies a project pair, failing on any other kind.
	verify_projects, Project, project_pair
);
typed_entry!(
	/// Verifies a property pair, failing on any other kind.
	verify_properties, Property, property_pair
);
typed_entry!(
	/// Verifies an item pair, failing on any other kind.
	verify_items, Item, item_pair
);
typed_entry!(
	/// Verifies an item-definition pair, failing on any other kind.
	verify_item_definitions, ItemDefinition, item_definition_pair
);
typed_entry!(
	/// Verifies a metadata pair, failing on any other kind.
	verify_metadata, Metadata, metadata_pair
);
