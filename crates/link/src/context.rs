//! Collection contexts.
//!
//! One context per participating graph owner. A context owns one export
//! table for objects it hosts and one import table per connected peer for
//! proxies it has built. The connected-peer map is published copy-on-write
//! so connect/disconnect are safe against in-flight import/export traffic.

use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use tether_model::{ContextId, Entity, Handle, LinkError};

use crate::registry::AdapterRegistry;
use crate::table::{ExportTable, ImportTable};

/// A participant in a connectivity group.
pub struct CollectionContext {
	id: ContextId,
	exports: ExportTable,
	peers: ArcSwap<FxHashMap<ContextId, Peer>>,
	registry: Arc<AdapterRegistry>,
	self_weak: Weak<CollectionContext>,
}

#[derive(Clone)]
struct Peer {
	ctx: Weak<CollectionContext>,
	imports: Arc<ImportTable>,
}

impl CollectionContext {
	pub(crate) fn new(id: ContextId, registry: Arc<AdapterRegistry>) -> Arc<Self> {
		Arc::new_cyclic(|self_weak| Self {
			id,
			exports: ExportTable::default(),
			peers: ArcSwap::from_pointee(FxHashMap::default()),
			registry,
			self_weak: self_weak.clone(),
		})
	}

	/// This context's unique id.
	#[must_use]
	pub fn id(&self) -> ContextId {
		self.id
	}

	/// Exports an object, returning a handle a peer can resolve.
	///
	/// Null-safe: `None` maps to [`Handle::NULL`]. Pass-through for
	/// proxies: an already-linked entity returns the handle it carries,
	/// never a second wrapping layer.
	pub fn export(&self, entity: Option<&Entity>) -> Handle {
		let Some(entity) = entity else {
			return Handle::NULL;
		};
		if let Some(existing) = entity.link_handle() {
			return existing;
		}
		let local = self.exports.get_or_create(entity);
		tracing::debug!(ctx = %self.id, id = local.0, kind = %entity.kind(), "export");
		Handle::new(self.id, local)
	}

	/// Resolves a handle to an entity.
	///
	/// Null handles resolve to `None`. A loopback handle (owned by this
	/// context) resolves through the export table to the authoritative
	/// object itself. A foreign handle requires its owner to be connected
	/// and resolves to the cached or freshly built proxy.
	pub fn import(&self, handle: Handle) -> Result<Option<Entity>, LinkError> {
		if handle.is_null() {
			return Ok(None);
		}
		if handle.owner == self.id {
			return self
				.exports
				.try_get_active(handle.local)
				.map(Some)
				.ok_or(LinkError::UnknownHandle { handle });
		}
		let peers = self.peers.load();
		let peer = peers.get(&handle.owner).ok_or(LinkError::NotConnected {
			owner: handle.owner,
			resolver: self.id,
		})?;
		let owner = peer.ctx.upgrade().ok_or(LinkError::ContextGone)?;
		// Fail fast on stale handles and fetch the kind tag the owner
		// attached at export time.
		if owner.exports.try_get_active(handle.local).is_none() {
			return Err(LinkError::UnknownHandle { handle });
		}
		let kind = owner
			.exports
			.kind_of(handle.local)
			.ok_or(LinkError::UnknownHandle { handle })?;
		let registry = &self.registry;
		let self_weak = &self.self_weak;
		let proxy = peer.imports.get_or_insert(handle.local, || {
			tracing::debug!(ctx = %self.id, %handle, %kind, "building link adapter");
			registry.create(kind, handle, self_weak.clone())
		})?;
		Ok(Some(proxy))
	}

	/// Connects this context to `peer`, allocating the import table that
	/// will cache proxies for the peer's handles. Idempotent. Connection is
	/// one-directional; the peer must connect back for reverse resolution.
	pub fn connect(&self, peer: &Arc<CollectionContext>) {
		if peer.id == self.id {
			return;
		}
		let peer_entry = Peer {
			ctx: Arc::downgrade(peer),
			imports: Arc::new(ImportTable::default()),
		};
		self.peers.rcu(|current| {
			let mut next = FxHashMap::clone(current);
			next.entry(peer.id).or_insert_with(|| peer_entry.clone());
			next
		});
		tracing::debug!(ctx = %self.id, peer = %peer.id, "connected");
	}

	/// True when handles owned by `peer` can currently be resolved here.
	#[must_use]
	pub fn is_connected(&self, peer: ContextId) -> bool {
		self.peers.load().contains_key(&peer)
	}

	/// Severs all connectivity. Cached proxies for former peers are
	/// dropped; their handles become unresolvable here.
	pub fn disconnect_all(&self) {
		self.peers.store(Arc::new(FxHashMap::default()));
		tracing::debug!(ctx = %self.id, "disconnected all peers");
	}

	/// Tears down this context's tables and connectivity, invalidating all
	/// handles it ever issued.
	pub fn clear(&self) {
		self.exports.clear();
		self.disconnect_all();
	}

	/// Number of exported objects currently retained.
	#[must_use]
	pub fn exported_len(&self) -> usize {
		self.exports.len()
	}

	/// The context owning `id`: this context for loopback, otherwise the
	/// connected peer.
	pub(crate) fn peer_context(&self, id: ContextId) -> Result<Arc<CollectionContext>, LinkError> {
		if id == self.id {
			return self.self_weak.upgrade().ok_or(LinkError::ContextGone);
		}
		let peers = self.peers.load();
		let peer = peers.get(&id).ok_or(LinkError::NotConnected {
			owner: id,
			resolver: self.id,
		})?;
		peer.ctx.upgrade().ok_or(LinkError::ContextGone)
	}

	/// Resolves a handle to the authoritative object on its owner's side.
	/// Used by adapters to forward operations.
	pub(crate) fn resolve_authoritative(&self, handle: Handle) -> Result<Entity, LinkError> {
		let owner = self.peer_context(handle.owner)?;
		owner
			.exports
			.try_get_active(handle.local)
			.ok_or(LinkError::UnknownHandle { handle })
	}

	/// Brings an authoritative entity returned by a remote operation into
	/// this context: export on the owning side, import here. Proxy inputs
	/// pass their carried handle through unchanged.
	pub(crate) fn import_entity(&self, owner: ContextId, entity: &Entity) -> Result<Entity, LinkError> {
		let handle = match entity.link_handle() {
			Some(h) => h,
			None => self.peer_context(owner)?.export(Some(entity)),
		};
		self.import(handle)?.ok_or(LinkError::UnknownHandle { handle })
	}
}

impl std::fmt::Debug for CollectionContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CollectionContext")
			.field("id", &self.id)
			.field("exported", &self.exports.len())
			.field("peers", &self.peers.load().len())
			.finish()
	}
}
