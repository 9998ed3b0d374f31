//! Arena-backed authoritative document tree.

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slab::Slab;

use crate::entity::Entity;
use crate::error::{ModelError, Result};
use crate::handle::Handle;
use crate::kind::EntityKind;
use crate::location::ElementLocation;
use crate::ops::{ContainerOps, DocumentNodeOps, DocumentOps, GroupOps, LeafOps, Linkable};

/// Authoritative document root.
///
/// Owns the node arena; every child facade points back here weakly. The
/// document root itself acts as the top-level container.
pub struct LocalDocument {
	self_weak: Weak<LocalDocument>,
	state: Mutex<DocState>,
}

/// Authoritative container node.
pub struct LocalGroup {
	doc: Weak<LocalDocument>,
	node: usize,
	name: String,
}

/// Authoritative leaf node.
pub struct LocalLeaf {
	doc: Weak<LocalDocument>,
	node: usize,
	name: String,
}

struct DocState {
	path: String,
	version: u32,
	root_condition: String,
	root_label: String,
	root_first: Option<usize>,
	root_last: Option<usize>,
	nodes: Slab<Node>,
}

/// Where a node currently hangs.
#[derive(Copy, Clone, Eq, PartialEq)]
enum ParentLink {
	/// Created but not inserted anywhere.
	Detached,
	/// Direct child of the document root.
	Root,
	/// Child of the group at this arena index.
	Node(usize),
}

/// A container position: the root or a group node.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Slot {
	Root,
	Group(usize),
}

struct Node {
	is_group: bool,
	value: String,
	condition: String,
	label: String,
	parent: ParentLink,
	first: Option<usize>,
	last: Option<usize>,
	next: Option<usize>,
	prev: Option<usize>,
	facade: Entity,
}

impl DocState {
	fn first(&self, slot: Slot) -> Option<usize> {
		match slot {
			Slot::Root => self.root_first,
			Slot::Group(g) => self.nodes[g].first,
		}
	}

	fn last(&self, slot: Slot) -> Option<usize> {
		match slot {
			Slot::Root => self.root_last,
			Slot::Group(g) => self.nodes[g].last,
		}
	}

	fn set_first(&mut self, slot: Slot, v: Option<usize>) {
		match slot {
			Slot::Root => self.root_first = v,
			Slot::Group(g) => self.nodes[g].first = v,
		}
	}

	fn set_last(&mut self, slot: Slot, v: Option<usize>) {
		match slot {
			Slot::Root => self.root_last = v,
			Slot::Group(g) => self.nodes[g].last = v,
		}
	}

	fn parent_link(slot: Slot) -> ParentLink {
		match slot {
			Slot::Root => ParentLink::Root,
			Slot::Group(g) => ParentLink::Node(g),
		}
	}

	fn count(&self, slot: Slot) -> usize {
		let mut n = 0;
		let mut cur = self.first(slot);
		while let Some(i) = cur {
			n += 1;
			cur = self.nodes[i].next;
		}
		n
	}

	/// Rejects attaching `child` into `slot` when the attach would break
	/// structure: already parented, or slot lies inside `child`'s subtree.
	fn check_attach(&self, slot: Slot, child: usize) -> Result<()> {
		if self.nodes[child].parent != ParentLink::Detached {
			return Err(ModelError::AlreadyParented);
		}
		let mut cur = slot;
		loop {
			match cur {
				Slot::Root => return Ok(()),
				Slot::Group(g) if g == child => return Err(ModelError::SelfInsert),
				Slot::Group(g) => match self.nodes[g].parent {
					ParentLink::Node(p) => cur = Slot::Group(p),
					_ => return Ok(()),
				},
			}
		}
	}

	/// Splices `child` into `slot` immediately before `before` (or at the
	/// end when `before` is `None`). Caller has validated everything.
	fn splice_before(&mut self, slot: Slot, child: usize, before: Option<usize>) {
		let prev = match before {
			Some(b) => self.nodes[b].prev,
			None => self.last(slot),
		};
		self.nodes[child].parent = Self::parent_link(slot);
		self.nodes[child].prev = prev;
		self.nodes[child].next = before;
		match prev {
			Some(p) => self.nodes[p].next = Some(child),
			None => self.set_first(slot, Some(child)),
		}
		match before {
			Some(b) => self.nodes[b].prev = Some(child),
			None => self.set_last(slot, Some(child)),
		}
	}

	/// Unlinks `child` from its current container.
	fn detach(&mut self, slot: Slot, child: usize) {
		let (prev, next) = (self.nodes[child].prev, self.nodes[child].next);
		match prev {
			Some(p) => self.nodes[p].next = next,
			None => self.set_first(slot, next),
		}
		match next {
			Some(n) => self.nodes[n].prev = prev,
			None => self.set_last(slot, prev),
		}
		let node = &mut self.nodes[child];
		node.parent = ParentLink::Detached;
		node.prev = None;
		node.next = None;
	}
}

impl LocalDocument {
	/// Creates an empty document.
	pub fn new(path: impl Into<String>) -> Arc<Self> {
		Arc::new_cyclic(|self_weak| Self {
			self_weak: self_weak.clone(),
			state: Mutex::new(DocState {
				path: path.into(),
				version: 0,
				root_condition: String::new(),
				root_label: String::new(),
				root_first: None,
				root_last: None,
				nodes: Slab::new(),
			}),
		})
	}

	/// This document as an [`Entity`].
	#[must_use]
	pub fn entity(self: &Arc<Self>) -> Entity {
		Entity::Document(self.clone())
	}

	fn doc_entity(&self) -> Result<Entity> {
		self.self_weak
			.upgrade()
			.map(|d| Entity::Document(d))
			.ok_or(ModelError::Orphaned)
	}

	/// Resolves an entity to a node index in this document's arena.
	///
	/// Linked entities and nodes of other documents are foreign here; the
	/// link layer translates proxies to authoritative nodes before calling.
	fn node_index_of(&self, e: &Entity) -> Result<usize> {
		let any = e.linkable().as_any();
		if let Some(g) = any.downcast_ref::<LocalGroup>() {
			if Weak::ptr_eq(&g.doc, &self.self_weak) {
				return Ok(g.node);
			}
		} else if let Some(l) = any.downcast_ref::<LocalLeaf>() {
			if Weak::ptr_eq(&l.doc, &self.self_weak) {
				return Ok(l.node);
			}
		}
		Err(ModelError::ForeignChild)
	}

	fn alloc_group(&self, st: &mut DocState, name: &str) -> Entity {
		let entry = st.nodes.vacant_entry();
		let node = entry.key();
		let facade = Entity::Group(Arc::new(LocalGroup {
			doc: self.self_weak.clone(),
			node,
			name: name.to_owned(),
		}));
		entry.insert(Node {
			is_group: true,
			value: String::new(),
			condition: String::new(),
			label: String::new(),
			parent: ParentLink::Detached,
			first: None,
			last: None,
			next: None,
			prev: None,
			facade: facade.clone(),
		});
		facade
	}

	fn alloc_leaf(&self, st: &mut DocState, name: &str, value: &str) -> Entity {
		let entry = st.nodes.vacant_entry();
		let node = entry.key();
		let facade = Entity::Leaf(Arc::new(LocalLeaf {
			doc: self.self_weak.clone(),
			node,
			name: name.to_owned(),
		}));
		entry.insert(Node {
			is_group: false,
			value: value.to_owned(),
			condition: String::new(),
			label: String::new(),
			parent: ParentLink::Detached,
			first: None,
			last: None,
			next: None,
			prev: None,
			facade: facade.clone(),
		});
		facade
	}

	// Node-level operations shared by group and leaf facades.

	fn n_parent(&self, idx: usize) -> Result<Option<Entity>> {
		let st = self.state.lock();
		match st.nodes[idx].parent {
			ParentLink::Detached => Ok(None),
			ParentLink::Root => Ok(Some(self.doc_entity()?)),
			ParentLink::Node(p) => Ok(Some(st.nodes[p].facade.clone())),
		}
	}

	fn n_next(&self, idx: usize) -> Result<Option<Entity>> {
		let st = self.state.lock();
		Ok(st.nodes[idx].next.map(|n| st.nodes[n].facade.clone()))
	}

	fn n_prev(&self, idx: usize) -> Result<Option<Entity>> {
		let st = self.state.lock();
		Ok(st.nodes[idx].prev.map(|n| st.nodes[n].facade.clone()))
	}

	fn n_location(&self, idx: usize) -> Result<ElementLocation> {
		let st = self.state.lock();
		// Root owns line 1; nodes are addressed by arena slot.
		Ok(ElementLocation::new(st.path.clone(), idx as u32 + 2, 1))
	}

	fn n_condition(&self, idx: usize) -> Result<String> {
		Ok(self.state.lock().nodes[idx].condition.clone())
	}

	fn n_set_condition(&self, idx: usize, condition: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.nodes[idx].condition = condition.to_owned();
		st.version += 1;
		Ok(())
	}

	fn n_label(&self, idx: usize) -> Result<String> {
		Ok(self.state.lock().nodes[idx].label.clone())
	}

	fn n_set_label(&self, idx: usize, label: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.nodes[idx].label = label.to_owned();
		st.version += 1;
		Ok(())
	}

	fn n_value(&self, idx: usize) -> Result<String> {
		Ok(self.state.lock().nodes[idx].value.clone())
	}

	fn n_set_value(&self, idx: usize, value: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.nodes[idx].value = value.to_owned();
		st.version += 1;
		Ok(())
	}

	// Container-level operations shared by the root and group facades.

	fn c_first(&self, slot: Slot) -> Result<Option<Entity>> {
		let st = self.state.lock();
		Ok(st.first(slot).map(|i| st.nodes[i].facade.clone()))
	}

	fn c_last(&self, slot: Slot) -> Result<Option<Entity>> {
		let st = self.state.lock();
		Ok(st.last(slot).map(|i| st.nodes[i].facade.clone()))
	}

	fn c_count(&self, slot: Slot) -> Result<usize> {
		Ok(self.state.lock().count(slot))
	}

	fn c_children(&self, slot: Slot) -> Result<Vec<Entity>> {
		let st = self.state.lock();
		let mut out = Vec::new();
		let mut cur = st.first(slot);
		while let Some(i) = cur {
			out.push(st.nodes[i].facade.clone());
			cur = st.nodes[i].next;
		}
		Ok(out)
	}

	/// Resolves `reference` to a child of `slot`, or fails with `NotChild`.
	fn resolve_reference(&self, st: &DocState, slot: Slot, reference: &Entity) -> Result<usize> {
		let idx = self.node_index_of(reference)?;
		if st.nodes[idx].parent != DocState::parent_link(slot) {
			return Err(ModelError::NotChild);
		}
		Ok(idx)
	}

	fn c_insert_before(&self, slot: Slot, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		let child = self.node_index_of(child)?;
		let mut st = self.state.lock();
		let before = match reference {
			Some(r) => Some(self.resolve_reference(&st, slot, r)?),
			None => None,
		};
		st.check_attach(slot, child)?;
		st.splice_before(slot, child, before);
		st.version += 1;
		Ok(())
	}

	fn c_insert_after(&self, slot: Slot, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		let child = self.node_index_of(child)?;
		let mut st = self.state.lock();
		let before = match reference {
			Some(r) => st.nodes[self.resolve_reference(&st, slot, r)?].next,
			None => st.first(slot),
		};
		st.check_attach(slot, child)?;
		st.splice_before(slot, child, before);
		st.version += 1;
		Ok(())
	}

	fn c_remove(&self, slot: Slot, child: &Entity) -> Result<()> {
		let child = self.node_index_of(child)?;
		let mut st = self.state.lock();
		if st.nodes[child].parent != DocState::parent_link(slot) {
			return Err(ModelError::NotChild);
		}
		st.detach(slot, child);
		st.version += 1;
		Ok(())
	}

	/// Copies the subtree rooted at `idx` into detached nodes, returning the
	/// detached copy of `idx`.
	fn clone_subtree(&self, st: &mut DocState, idx: usize) -> Entity {
		let copy = if st.nodes[idx].is_group {
			let name = st.nodes[idx]
				.facade
				.linkable()
				.as_any()
				.downcast_ref::<LocalGroup>()
				.map_or_else(String::new, |g| g.name.clone());
			self.alloc_group(st, &name)
		} else {
			let name = st.nodes[idx]
				.facade
				.linkable()
				.as_any()
				.downcast_ref::<LocalLeaf>()
				.map_or_else(String::new, |l| l.name.clone());
			let value = st.nodes[idx].value.clone();
			self.alloc_leaf(st, &name, &value)
		};
		let copy_idx = match &copy {
			Entity::Group(g) => g.as_any().downcast_ref::<LocalGroup>().map(|g| g.node),
			Entity::Leaf(l) => l.as_any().downcast_ref::<LocalLeaf>().map(|l| l.node),
			_ => None,
		};
		let Some(copy_idx) = copy_idx else { return copy };
		st.nodes[copy_idx].condition = st.nodes[idx].condition.clone();
		st.nodes[copy_idx].label = st.nodes[idx].label.clone();
		if st.nodes[idx].is_group {
			let mut cur = st.nodes[idx].first;
			while let Some(c) = cur {
				let child_copy = self.clone_subtree(st, c);
				// Attach the fresh copy; it is detached by construction.
				if let Ok(child_idx) = self.node_index_of(&child_copy) {
					st.splice_before(Slot::Group(copy_idx), child_idx, None);
				}
				cur = st.nodes[c].next;
			}
		}
		copy
	}

	fn c_deep_clone(&self, slot: Slot) -> Result<Entity> {
		match slot {
			Slot::Group(g) => {
				let mut st = self.state.lock();
				Ok(self.clone_subtree(&mut st, g))
			}
			// Cloning the root produces a fresh document mirroring the tree.
			Slot::Root => {
				let children = self.c_children(Slot::Root)?;
				let st = self.state.lock();
				let copy = Self::new(st.path.clone());
				drop(st);
				for child in &children {
					let cloned = self.copy_into(&copy, child)?;
					copy.c_insert_before(Slot::Root, &cloned, None)?;
				}
				Ok(copy.entity())
			}
		}
	}

	/// Recreates `node` (and its subtree) inside `target`, detached.
	fn copy_into(&self, target: &Arc<Self>, node: &Entity) -> Result<Entity> {
		match node {
			Entity::Leaf(l) => {
				let name = l.name()?;
				let value = l.value()?;
				let copy = target.create_leaf(&name, &value)?;
				if let Some(n) = copy.as_node() {
					n.set_condition(&l.condition()?)?;
					n.set_label(&l.label()?)?;
				}
				Ok(copy)
			}
			Entity::Group(g) => {
				let copy = target.create_group(&g.name()?)?;
				if let Some(n) = copy.as_node() {
					n.set_condition(&g.condition()?)?;
					n.set_label(&g.label()?)?;
				}
				for child in g.children()? {
					let child_copy = self.copy_into(target, &child)?;
					if let Some(c) = copy.as_container() {
						c.append_child(&child_copy)?;
					}
				}
				Ok(copy)
			}
			_ => Err(ModelError::ForeignChild),
		}
	}
}

impl Linkable for LocalDocument {
	fn kind(&self) -> EntityKind {
		EntityKind::Document
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

impl DocumentNodeOps for LocalDocument {
	fn parent(&self) -> Result<Option<Entity>> {
		Ok(None)
	}

	fn containing_document(&self) -> Result<Entity> {
		self.doc_entity()
	}

	fn next_sibling(&self) -> Result<Option<Entity>> {
		Ok(None)
	}

	fn previous_sibling(&self) -> Result<Option<Entity>> {
		Ok(None)
	}

	fn location(&self) -> Result<ElementLocation> {
		Ok(ElementLocation::new(self.state.lock().path.clone(), 1, 1))
	}

	fn condition(&self) -> Result<String> {
		Ok(self.state.lock().root_condition.clone())
	}

	fn set_condition(&self, condition: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.root_condition = condition.to_owned();
		st.version += 1;
		Ok(())
	}

	fn label(&self) -> Result<String> {
		Ok(self.state.lock().root_label.clone())
	}

	fn set_label(&self, label: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.root_label = label.to_owned();
		st.version += 1;
		Ok(())
	}
}

impl ContainerOps for LocalDocument {
	fn first_child(&self) -> Result<Option<Entity>> {
		self.c_first(Slot::Root)
	}

	fn last_child(&self) -> Result<Option<Entity>> {
		self.c_last(Slot::Root)
	}

	fn child_count(&self) -> Result<usize> {
		self.c_count(Slot::Root)
	}

	fn children(&self) -> Result<Vec<Entity>> {
		self.c_children(Slot::Root)
	}

	fn insert_before(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		self.c_insert_before(Slot::Root, child, reference)
	}

	fn insert_after(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		self.c_insert_after(Slot::Root, child, reference)
	}

	fn append_child(&self, child: &Entity) -> Result<()> {
		self.c_insert_before(Slot::Root, child, None)
	}

	fn prepend_child(&self, child: &Entity) -> Result<()> {
		self.c_insert_after(Slot::Root, child, None)
	}

	fn remove_child(&self, child: &Entity) -> Result<()> {
		self.c_remove(Slot::Root, child)
	}

	fn deep_clone(&self) -> Result<Entity> {
		self.c_deep_clone(Slot::Root)
	}
}

impl DocumentOps for LocalDocument {
	fn full_path(&self) -> Result<String> {
		Ok(self.state.lock().path.clone())
	}

	fn set_full_path(&self, path: &str) -> Result<()> {
		let mut st = self.state.lock();
		st.path = path.to_owned();
		st.version += 1;
		Ok(())
	}

	fn version(&self) -> Result<u32> {
		Ok(self.state.lock().version)
	}

	fn create_group(&self, name: &str) -> Result<Entity> {
		let mut st = self.state.lock();
		Ok(self.alloc_group(&mut st, name))
	}

	fn create_leaf(&self, name: &str, value: &str) -> Result<Entity> {
		let mut st = self.state.lock();
		Ok(self.alloc_leaf(&mut st, name, value))
	}
}

impl LocalGroup {
	fn doc(&self) -> Result<Arc<LocalDocument>> {
		self.doc.upgrade().ok_or(ModelError::Orphaned)
	}
}

impl GroupOps for LocalGroup {
	fn name(&self) -> Result<String> {
		Ok(self.name.clone())
	}
}

impl Linkable for LocalGroup {
	fn kind(&self) -> EntityKind {
		EntityKind::Group
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

impl DocumentNodeOps for LocalGroup {
	fn parent(&self) -> Result<Option<Entity>> {
		self.doc()?.n_parent(self.node)
	}

	fn containing_document(&self) -> Result<Entity> {
		self.doc()?.doc_entity()
	}

	fn next_sibling(&self) -> Result<Option<Entity>> {
		self.doc()?.n_next(self.node)
	}

	fn previous_sibling(&self) -> Result<Option<Entity>> {
		self.doc()?.n_prev(self.node)
	}

	fn location(&self) -> Result<ElementLocation> {
		self.doc()?.n_location(self.node)
	}

	fn condition(&self) -> Result<String> {
		self.doc()?.n_condition(self.node)
	}

	fn set_condition(&self, condition: &str) -> Result<()> {
		self.doc()?.n_set_condition(self.node, condition)
	}

	fn label(&self) -> Result<String> {
		self.doc()?.n_label(self.node)
	}

	fn set_label(&self, label: &str) -> Result<()> {
		self.doc()?.n_set_label(self.node, label)
	}
}

impl ContainerOps for LocalGroup {
	fn first_child(&self) -> Result<Option<Entity>> {
		self.doc()?.c_first(Slot::Group(self.node))
	}

	fn last_child(&self) -> Result<Option<Entity>> {
		self.doc()?.c_last(Slot::Group(self.node))
	}

	fn child_count(&self) -> Result<usize> {
		self.doc()?.c_count(Slot::Group(self.node))
	}

	fn children(&self) -> Result<Vec<Entity>> {
		self.doc()?.c_children(Slot::Group(self.node))
	}

	fn insert_before(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		self.doc()?.c_insert_before(Slot::Group(self.node), child, reference)
	}

	fn insert_after(&self, child: &Entity, reference: Option<&Entity>) -> Result<()> {
		self.doc()?.c_insert_after(Slot::Group(self.node), child, reference)
	}

	fn append_child(&self, child: &Entity) -> Result<()> {
		self.doc()?.c_insert_before(Slot::Group(self.node), child, None)
	}

	fn prepend_child(&self, child: &Entity) -> Result<()> {
		self.doc()?.c_insert_after(Slot::Group(self.node), child, None)
	}

	fn remove_child(&self, child: &Entity) -> Result<()> {
		self.doc()?.c_remove(Slot::Group(self.node), child)
	}

	fn deep_clone(&self) -> Result<Entity> {
		self.doc()?.c_deep_clone(Slot::Group(self.node))
	}
}

impl LocalLeaf {
	fn doc(&self) -> Result<Arc<LocalDocument>> {
		self.doc.upgrade().ok_or(ModelError::Orphaned)
	}
}

impl Linkable for LocalLeaf {
	fn kind(&self) -> EntityKind {
		EntityKind::Leaf
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

impl DocumentNodeOps for LocalLeaf {
	fn parent(&self) -> Result<Option<Entity>> {
		self.doc()?.n_parent(self.node)
	}

	fn containing_document(&self) -> Result<Entity> {
		self.doc()?.doc_entity()
	}

	fn next_sibling(&self) -> Result<Option<Entity>> {
		self.doc()?.n_next(self.node)
	}

	fn previous_sibling(&self) -> Result<Option<Entity>> {
		self.doc()?.n_prev(self.node)
	}

	fn location(&self) -> Result<ElementLocation> {
		self.doc()?.n_location(self.node)
	}

	fn condition(&self) -> Result<String> {
		self.doc()?.n_condition(self.node)
	}

	fn set_condition(&self, condition: &str) -> Result<()> {
		self.doc()?.n_set_condition(self.node, condition)
	}

	fn label(&self) -> Result<String> {
		self.doc()?.n_label(self.node)
	}

	fn set_label(&self, label: &str) -> Result<()> {
		self.doc()?.n_set_label(self.node, label)
	}
}

impl LeafOps for LocalLeaf {
	fn name(&self) -> Result<String> {
		Ok(self.name.clone())
	}

	fn value(&self) -> Result<String> {
		self.doc()?.n_value(self.node)
	}

	fn set_value(&self, value: &str) -> Result<()> {
		self.doc()?.n_set_value(self.node, value)
	}
}
