//! Identity tables.
//!
//! Two tables share one id-allocation discipline: ids are handed out from a
//! per-table counter, skipping 0 (the null sentinel) and any id still in
//! the live set. Payloads are held weakly; an entry whose payload has been
//! collected is purged the moment a lookup notices, and the export side
//! additionally sweeps in bulk once the table has doubled since its last
//! sweep, so dead entries never accumulate. The export side never
//! resurrects: a purged id is simply unknown. The import side resurrects
//! by re-running the adapter factory, which produces a new proxy.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tether_model::{Entity, EntityKind, LinkError, LocalId, WeakEntity};

/// Export-side identity table: authoritative object reference -> id.
///
/// Re-exporting the same object (by reference identity) is idempotent.
#[derive(Default)]
pub struct ExportTable {
	inner: Mutex<ExportInner>,
}

/// Smallest table size at which the bulk sweep starts running.
const SWEEP_FLOOR: usize = 64;

struct ExportInner {
	next: u32,
	/// Next table size that triggers a bulk sweep of dead entries.
	sweep_at: usize,
	/// Identity key (payload allocation address) -> id.
	by_key: FxHashMap<usize, LocalId>,
	entries: FxHashMap<LocalId, ExportEntry>,
}

impl Default for ExportInner {
	fn default() -> Self {
		Self {
			next: 0,
			sweep_at: SWEEP_FLOOR,
			by_key: FxHashMap::default(),
			entries: FxHashMap::default(),
		}
	}
}

struct ExportEntry {
	payload: WeakEntity,
	kind: EntityKind,
	key: usize,
}

impl ExportInner {
	fn alloc_id(&mut self) -> LocalId {
		loop {
			self.next = self.next.wrapping_add(1);
			let id = LocalId(self.next);
			if !id.is_null() && !self.entries.contains_key(&id) {
				return id;
			}
		}
	}

	/// Discards every entry whose payload has been collected. Amortized
	/// over inserts: the caller re-arms `sweep_at` at twice the surviving
	/// size, so the total sweep cost stays linear in the insert count.
	fn sweep(&mut self) {
		let before = self.entries.len();
		self.entries.retain(|_, e| e.payload.upgrade().is_some());
		let entries = &self.entries;
		self.by_key.retain(|_, id| entries.contains_key(id));
		self.sweep_at = (self.entries.len() * 2).max(SWEEP_FLOOR);
		if before != self.entries.len() {
			tracing::trace!(dead = before - self.entries.len(), live = self.entries.len(), "swept export table");
		}
	}
}

impl ExportTable {
	/// Registers `entity`, returning its stable id. Safe under concurrent
	/// callers racing to register the same object: lock, re-check, insert.
	pub fn get_or_create(&self, entity: &Entity) -> LocalId {
		let key = entity.ptr_key();
		let mut inner = self.inner.lock();
		if let Some(&id) = inner.by_key.get(&key) {
			let live = inner
				.entries
				.get(&id)
				.and_then(|e| e.payload.upgrade())
				.is_some_and(|live| live.ptr_key() == key);
			if live {
				return id;
			}
			// The old payload died and its allocation was reused; the stale
			// entry must not capture the newcomer's identity.
			inner.by_key.remove(&key);
			inner.entries.remove(&id);
		}
		let id = inner.alloc_id();
		inner.by_key.insert(key, id);
		inner.entries.insert(
			id,
			ExportEntry {
				payload: entity.downgrade(),
				kind: entity.kind(),
				key,
			},
		);
		if inner.entries.len() >= inner.sweep_at {
			inner.sweep();
		}
		tracing::trace!(id = id.0, kind = %entity.kind(), "exported object");
		id
	}

	/// Resolves an id to its live payload; `None` when unknown or dead.
	/// A dead entry is purged on the spot.
	pub fn try_get_active(&self, id: LocalId) -> Option<Entity> {
		let mut inner = self.inner.lock();
		let entry = inner.entries.get(&id)?;
		if let Some(live) = entry.payload.upgrade() {
			return Some(live);
		}
		let key = entry.key;
		inner.entries.remove(&id);
		inner.by_key.remove(&key);
		tracing::trace!(id = id.0, "purged dead export entry");
		None
	}

	/// Kind tag attached at first registration, while the entry is
	/// retained.
	pub fn kind_of(&self, id: LocalId) -> Option<EntityKind> {
		self.inner.lock().entries.get(&id).map(|e| e.kind)
	}

	/// Number of retained entries.
	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	/// True when no entries exist.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops every entry, invalidating all previously issued ids.
	pub fn clear(&self) {
		let mut inner = self.inner.lock();
		inner.by_key.clear();
		inner.entries.clear();
	}
}

/// Import-side identity table: peer id -> cached proxy.
///
/// Importing the same peer id twice yields the same proxy instance while
/// the first one is alive; a reclaimed proxy is resurrected by re-running
/// the builder.
#[derive(Default)]
pub struct ImportTable {
	inner: Mutex<ImportInner>,
}

#[derive(Default)]
struct ImportInner {
	next: u32,
	by_peer: FxHashMap<LocalId, ImportEntry>,
}

struct ImportEntry {
	/// This table's own id for the proxy; a resurrected proxy gets a new one.
	id: LocalId,
	payload: WeakEntity,
}

impl ImportInner {
	fn alloc_id(&mut self) -> LocalId {
		loop {
			self.next = self.next.wrapping_add(1);
			let id = LocalId(self.next);
			if !id.is_null() && !self.by_peer.values().any(|e| e.id == id) {
				return id;
			}
		}
	}
}

impl ImportTable {
	/// Returns the cached proxy for `peer_local`, or builds and caches one.
	///
	/// The builder runs under the table lock so every racing importer
	/// observes the same proxy; it must not take other identity-table locks.
	pub fn get_or_insert(
		&self,
		peer_local: LocalId,
		build: impl FnOnce() -> Result<Entity, LinkError>,
	) -> Result<Entity, LinkError> {
		let mut inner = self.inner.lock();
		if let Some(entry) = inner.by_peer.get(&peer_local) {
			if let Some(proxy) = entry.payload.upgrade() {
				return Ok(proxy);
			}
			tracing::warn!(peer_local = peer_local.0, "resurrecting reclaimed proxy");
		}
		let proxy = build()?;
		let id = inner.alloc_id();
		inner.by_peer.insert(
			peer_local,
			ImportEntry {
				id,
				payload: proxy.downgrade(),
			},
		);
		tracing::trace!(peer_local = peer_local.0, id = id.0, kind = %proxy.kind(), "cached proxy");
		Ok(proxy)
	}

	/// Resolves a peer id to its live cached proxy. A dead entry is
	/// purged on the spot; the next `get_or_insert` builds afresh.
	pub fn try_get_active(&self, peer_local: LocalId) -> Option<Entity> {
		let mut inner = self.inner.lock();
		let entry = inner.by_peer.get(&peer_local)?;
		if let Some(proxy) = entry.payload.upgrade() {
			return Some(proxy);
		}
		inner.by_peer.remove(&peer_local);
		None
	}

	/// This table's own id for a peer id, while an entry exists.
	pub fn id_of(&self, peer_local: LocalId) -> Option<LocalId> {
		self.inner.lock().by_peer.get(&peer_local).map(|e| e.id)
	}

	/// Drops every cached proxy entry.
	pub fn clear(&self) {
		self.inner.lock().by_peer.clear();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use tether_model::{DocumentOps, LocalDocument};

	use super::*;

	fn detached_leaf(doc: &Arc<LocalDocument>, name: &str) -> Entity {
		doc.create_leaf(name, "").unwrap()
	}

	#[test]
	fn export_is_idempotent_per_identity() {
		let doc = LocalDocument::new("t.proj");
		let a = detached_leaf(&doc, "A");
		let b = detached_leaf(&doc, "B");
		let table = ExportTable::default();

		let id_a = table.get_or_create(&a);
		let id_b = table.get_or_create(&b);
		assert_ne!(id_a, id_b);
		assert_eq!(table.get_or_create(&a), id_a);
		assert_eq!(table.get_or_create(&a.clone()), id_a, "clones share identity");
	}

	#[test]
	fn ids_are_monotonic_and_skip_zero() {
		let doc = LocalDocument::new("t.proj");
		let table = ExportTable::default();
		let mut last = 0;
		for i in 0..10 {
			let id = table.get_or_create(&detached_leaf(&doc, &format!("N{i}")));
			assert!(id.0 > last, "ids must grow");
			assert!(!id.is_null());
			last = id.0;
		}
	}

	#[test]
	fn dead_payload_is_purged_on_lookup() {
		let doc = LocalDocument::new("t.proj");
		let table = ExportTable::default();
		let id = {
			let leaf = detached_leaf(&doc, "gone");
			table.get_or_create(&leaf)
		};
		// The facade is still held by the document arena.
		assert!(table.try_get_active(id).is_some());
		assert_eq!(table.kind_of(id), Some(EntityKind::Leaf));
		drop(doc);
		assert!(table.try_get_active(id).is_none(), "payload died with its document");
		assert!(table.is_empty(), "the failed lookup must discard the dead entry");
		assert_eq!(table.kind_of(id), None, "a purged id is fully forgotten");
	}

	#[test]
	fn sweep_bounds_table_growth_under_export_churn() {
		let table = ExportTable::default();
		// Each iteration drops the document, and with it the exported
		// leaf, before the next export. Without the amortized sweep the
		// table would hold one dead entry per iteration.
		for i in 0..10 * SWEEP_FLOOR {
			let doc = LocalDocument::new("churn.proj");
			table.get_or_create(&detached_leaf(&doc, &format!("N{i}")));
		}
		assert!(
			table.len() <= SWEEP_FLOOR,
			"dead entries must be swept, got {}",
			table.len()
		);
	}

	#[test]
	fn concurrent_export_of_one_object_yields_one_id() {
		let doc = LocalDocument::new("t.proj");
		let leaf = detached_leaf(&doc, "shared");
		let table = Arc::new(ExportTable::default());

		let ids: Vec<LocalId> = std::thread::scope(|scope| {
			let handles: Vec<_> = (0..8)
				.map(|_| {
					let table = Arc::clone(&table);
					let leaf = leaf.clone();
					scope.spawn(move || table.get_or_create(&leaf))
				})
				.collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});
		assert!(ids.windows(2).all(|w| w[0] == w[1]), "racing exporters must agree: {ids:?}");
	}

	#[test]
	fn import_caches_and_resurrects() {
		let doc = LocalDocument::new("t.proj");
		let table = ImportTable::default();
		let peer = LocalId(7);

		let first_id = {
			// The payload's document lives only inside this block, so the
			// cached entry tombstones when it drops.
			let doomed = LocalDocument::new("doomed.proj");
			let first = table.get_or_insert(peer, || Ok(detached_leaf(&doomed, "P"))).unwrap();
			let again = table.get_or_insert(peer, || panic!("must reuse cached proxy")).unwrap();
			assert!(first.ptr_eq(&again));
			table.id_of(peer).unwrap()
		};

		assert!(table.try_get_active(peer).is_none(), "entry died with its payload");
		let reborn = table.get_or_insert(peer, || Ok(detached_leaf(&doc, "P2"))).unwrap();
		assert!(table.try_get_active(peer).unwrap().ptr_eq(&reborn));
		assert_ne!(table.id_of(peer), Some(first_id), "resurrection allocates a fresh id");
	}

	#[test]
	fn import_build_failure_is_propagated_and_not_cached() {
		let doc = LocalDocument::new("t.proj");
		let table = ImportTable::default();
		let peer = LocalId(3);
		let err = table
			.get_or_insert(peer, || {
				Err(LinkError::UnknownHandle {
					handle: tether_model::Handle::NULL,
				})
			})
			.unwrap_err();
		assert!(matches!(err, LinkError::UnknownHandle { .. }));
		assert!(table.try_get_active(peer).is_none());
		// A later successful build still works.
		table.get_or_insert(peer, || Ok(detached_leaf(&doc, "ok"))).unwrap();
	}
}
