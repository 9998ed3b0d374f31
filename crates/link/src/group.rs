//! Connectivity groups.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use tether_model::ContextId;

use crate::context::CollectionContext;
use crate::registry::AdapterRegistry;

/// Registry of collection contexts that may resolve each other's handles.
///
/// The group mediates no data flow; it guarantees unique context ids and
/// offers convenience operations over all members.
pub struct ConnectivityGroup {
	next_id: AtomicU32,
	registry: Arc<AdapterRegistry>,
	members: Mutex<Vec<Arc<CollectionContext>>>,
}

impl ConnectivityGroup {
	/// Creates a group using the standard adapter registry.
	#[must_use]
	pub fn new() -> Self {
		Self::with_registry(AdapterRegistry::standard())
	}

	/// Creates a group with a caller-populated adapter registry.
	#[must_use]
	pub fn with_registry(registry: AdapterRegistry) -> Self {
		Self {
			next_id: AtomicU32::new(1),
			registry: Arc::new(registry),
			members: Mutex::new(Vec::new()),
		}
	}

	/// Allocates a context with a fresh unique id and registers it.
	pub fn create_context(&self) -> Arc<CollectionContext> {
		let id = ContextId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let ctx = CollectionContext::new(id, Arc::clone(&self.registry));
		self.members.lock().push(Arc::clone(&ctx));
		tracing::debug!(ctx = %id, "created collection context");
		ctx
	}

	/// Connects `a` to `b` in that direction only.
	pub fn connect(&self, a: &Arc<CollectionContext>, b: &Arc<CollectionContext>) {
		a.connect(b);
	}

	/// Connects every ordered pair of members.
	pub fn connect_all(&self) {
		let members = self.members.lock();
		for a in members.iter() {
			for b in members.iter() {
				if a.id() != b.id() {
					a.connect(b);
				}
			}
		}
	}

	/// Disconnects every member pairwise and clears every member's tables,
	/// invalidating all issued handles. The contexts themselves survive and
	/// can be reconnected.
	pub fn remove_all(&self) {
		let members = self.members.lock();
		for ctx in members.iter() {
			ctx.clear();
		}
		tracing::debug!(members = members.len(), "cleared connectivity group");
	}

	/// Current members, in creation order.
	#[must_use]
	pub fn contexts(&self) -> Vec<Arc<CollectionContext>> {
		self.members.lock().clone()
	}
}

impl Default for ConnectivityGroup {
	fn default() -> Self {
		Self::new()
	}
}
