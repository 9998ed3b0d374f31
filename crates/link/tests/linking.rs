//! End-to-end linking scenarios across two and three contexts.

use pretty_assertions::assert_eq;
use tether_link::{AdapterRegistry, ConnectivityGroup, Handle, LinkError};
use tether_model::local::{LocalDocument, LocalProject};
use tether_model::{
	ContainerOps, DocumentNodeOps, DocumentOps, Entity, EntityKind, GroupOps, ItemDefinitionOps,
	ItemOps, LeafOps, ModelError, ProjectOps, PropertyOps,
};

/// A document shaped `root -> [E1, E2(leaf under it)]` used by most tests.
fn sample_document() -> std::sync::Arc<LocalDocument> {
	let doc = LocalDocument::new("/src/app.doc");
	let root = doc.entity();
	let container = root.as_container().unwrap();
	let e1 = doc.create_group("E1").unwrap();
	let e2 = doc.create_group("E2").unwrap();
	container.append_child(&e1).unwrap();
	container.append_child(&e2).unwrap();
	let leaf = doc.create_leaf("Flag", "on").unwrap();
	e2.as_container().unwrap().append_child(&leaf).unwrap();
	doc
}

#[test]
fn export_is_idempotent_per_object() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let doc = sample_document();
	let root = doc.entity();

	let first = a.export(Some(&root));
	let second = a.export(Some(&root));
	assert_eq!(first, second);
	assert_eq!(a.exported_len(), 1);

	let other = a.export(Some(&doc.create_group("X").unwrap()));
	assert_ne!(first, other);
}

#[test]
fn null_round_trips_without_table_traffic() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect(&a, &b);

	assert!(a.export(None).is_null());
	assert!(b.import(Handle::NULL).unwrap().is_none());
	assert_eq!(a.exported_len(), 0);
}

#[test]
fn import_caches_one_proxy_per_handle() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	let first = b.import(handle).unwrap().unwrap();
	let second = b.import(handle).unwrap().unwrap();
	assert!(first.ptr_eq(&second), "same handle must yield same proxy");
	assert!(first.is_linked());
	assert_eq!(first.kind(), EntityKind::Document);
}

#[test]
fn exporting_a_proxy_never_double_wraps() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));
	let proxy = b.import(handle).unwrap().unwrap();

	// Pushing the proxy back out of either side returns the original
	// handle instead of registering a second layer.
	assert_eq!(b.export(Some(&proxy)), handle);
	assert_eq!(a.export(Some(&proxy)), handle);
	assert_eq!(b.exported_len(), 0);
}

#[test]
fn loopback_import_returns_the_authoritative_object() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();

	let doc = sample_document();
	let root = doc.entity();
	let handle = a.export(Some(&root));

	let back = a.import(handle).unwrap().unwrap();
	assert!(back.ptr_eq(&root), "loopback must not build a proxy");
	assert!(!back.is_linked());
}

#[test]
fn unconnected_owner_is_rejected() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	match b.import(handle) {
		Err(LinkError::NotConnected { owner, resolver }) => {
			assert_eq!(owner, a.id());
			assert_eq!(resolver, b.id());
		}
		other => panic!("expected NotConnected, got {other:?}"),
	}
}

#[test]
fn unknown_local_id_is_rejected() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let live = a.export(Some(&doc.entity()));
	let stale = Handle::new(live.owner, tether_link::LocalId(live.local.0 + 40));

	assert_eq!(
		b.import(stale).err(),
		Some(LinkError::UnknownHandle { handle: stale })
	);
}

#[test]
fn empty_registry_reports_unsupported_kind() {
	let group = ConnectivityGroup::with_registry(AdapterRegistry::empty());
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	assert_eq!(
		b.import(handle).err(),
		Some(LinkError::UnsupportedKind {
			kind: EntityKind::Document
		})
	);
}

#[test]
fn navigation_from_a_proxy_preserves_identity() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));
	let root = b.import(handle).unwrap().unwrap();
	let container = root.as_container().unwrap();

	let children = container.children().unwrap();
	assert_eq!(children.len(), 2);
	let e1 = &children[0];
	let e2 = &children[1];
	assert_eq!(e1.as_group().unwrap().name().unwrap(), "E1");
	assert_eq!(e2.as_group().unwrap().name().unwrap(), "E2");

	// Sibling and parent navigation land on the same cached proxies.
	let next = e1.as_node().unwrap().next_sibling().unwrap().unwrap();
	assert!(next.ptr_eq(e2));
	let parent = e1.as_node().unwrap().parent().unwrap().unwrap();
	assert!(parent.ptr_eq(&root));
	let again = container.first_child().unwrap().unwrap();
	assert!(again.ptr_eq(e1));

	let owning = e2.as_node().unwrap().containing_document().unwrap();
	assert!(owning.ptr_eq(&root));
}

#[test]
fn mutations_are_visible_in_both_directions() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let root = doc.entity();
	let handle = a.export(Some(&root));
	let proxy_root = b.import(handle).unwrap().unwrap();

	let e2 = proxy_root.as_container().unwrap().children().unwrap()[1].clone();
	let flag = e2.as_container().unwrap().first_child().unwrap().unwrap();
	assert_eq!(flag.as_leaf().unwrap().value().unwrap(), "on");

	// Write through the proxy, read on the authoritative side.
	flag.as_leaf().unwrap().set_value("off").unwrap();
	let real_e2 = root.as_container().unwrap().children().unwrap()[1].clone();
	let real_flag = real_e2.as_container().unwrap().first_child().unwrap().unwrap();
	assert_eq!(real_flag.as_leaf().unwrap().value().unwrap(), "off");

	// Write on the authoritative side, read through the proxy.
	real_flag.as_leaf().unwrap().set_value("auto").unwrap();
	assert_eq!(flag.as_leaf().unwrap().value().unwrap(), "auto");
	assert_eq!(
		proxy_root.as_document().unwrap().version().unwrap(),
		root.as_document().unwrap().version().unwrap()
	);
}

#[test]
fn structural_edits_forward_through_proxies() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));
	let proxy_root = b.import(handle).unwrap().unwrap();
	let proxy_doc = proxy_root.as_document().unwrap();

	// Create through the proxy document, attach via a proxy container.
	let created = proxy_doc.create_group("E3").unwrap();
	assert!(created.is_linked());
	proxy_root.as_container().unwrap().append_child(&created).unwrap();

	let names: Vec<String> = doc
		.entity()
		.as_container()
		.unwrap()
		.children()
		.unwrap()
		.iter()
		.map(|e| e.as_group().unwrap().name().unwrap())
		.collect();
	assert_eq!(names, ["E1", "E2", "E3"]);

	// Detach through the proxy as well.
	let children = proxy_root.as_container().unwrap().children().unwrap();
	proxy_root.as_container().unwrap().remove_child(&children[0]).unwrap();
	assert_eq!(doc.entity().as_container().unwrap().child_count().unwrap(), 2);

	// Model errors surface unchanged through the forwarding layer.
	assert_eq!(
		proxy_root.as_container().unwrap().remove_child(&children[0]),
		Err(ModelError::NotChild)
	);
}

#[test]
fn deep_clone_through_a_proxy_returns_a_proxy() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));
	let proxy_root = b.import(handle).unwrap().unwrap();

	let e2 = proxy_root.as_container().unwrap().children().unwrap()[1].clone();
	let copy = e2.as_container().unwrap().deep_clone().unwrap();
	assert!(copy.is_linked());
	assert!(!copy.ptr_eq(&e2));
	assert_eq!(copy.as_group().unwrap().name().unwrap(), "E2");
	assert_eq!(copy.as_container().unwrap().child_count().unwrap(), 1);
	assert!(copy.as_node().unwrap().parent().unwrap().is_none());
}

#[test]
fn three_contexts_resolve_pairwise() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	let c = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	let in_b = b.import(handle).unwrap().unwrap();
	let in_c = c.import(handle).unwrap().unwrap();
	// Each resolving context caches its own proxy for the same handle.
	assert!(!in_b.ptr_eq(&in_c));
	assert_eq!(in_b.link_handle(), in_c.link_handle());
}

#[test]
fn remove_all_invalidates_every_handle() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));
	let proxy = b.import(handle).unwrap().unwrap();

	group.remove_all();

	assert!(matches!(b.import(handle), Err(LinkError::NotConnected { .. })));
	// Cached proxies go dark rather than dangling.
	assert!(matches!(
		proxy.as_document().unwrap().full_path(),
		Err(ModelError::Link(LinkError::NotConnected { .. }))
	));
}

#[test]
fn dead_exports_are_reclaimed_on_failed_import() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = LocalDocument::new("/src/doomed.doc");
	let handles: Vec<Handle> = (0..100)
		.map(|i| a.export(Some(&doc.create_leaf(&format!("L{i}"), "").unwrap())))
		.collect();
	assert_eq!(a.exported_len(), 100);

	drop(doc);
	for handle in handles {
		assert_eq!(
			b.import(handle).err(),
			Some(LinkError::UnknownHandle { handle })
		);
	}
	assert_eq!(a.exported_len(), 0, "failed imports must purge the dead export entries");
}

#[test]
fn racing_imports_of_one_handle_agree_on_one_proxy() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	let proxies: Vec<Entity> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..8)
			.map(|_| scope.spawn(|| b.import(handle).unwrap().unwrap()))
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});
	assert!(
		proxies.windows(2).all(|w| w[0].ptr_eq(&w[1])),
		"racing importers must share one cached proxy"
	);
}

#[test]
fn connect_churn_during_imports_stays_consistent() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	b.connect(&a);

	let doc = sample_document();
	let handle = a.export(Some(&doc.entity()));

	std::thread::scope(|scope| {
		scope.spawn(|| {
			for _ in 0..200 {
				b.disconnect_all();
				b.connect(&a);
			}
		});
		for _ in 0..4 {
			scope.spawn(|| {
				// An import overlapping the churn sees either a proxy or a
				// clean connectivity error, never a torn state.
				for _ in 0..200 {
					match b.import(handle) {
						Ok(Some(proxy)) => assert_eq!(proxy.link_handle(), Some(handle)),
						Err(LinkError::NotConnected { owner, resolver }) => {
							assert_eq!(owner, a.id());
							assert_eq!(resolver, b.id());
						}
						other => panic!("unexpected import outcome: {other:?}"),
					}
				}
			});
		}
	});

	b.connect(&a);
	assert!(b.import(handle).unwrap().is_some(), "reconnect restores resolution");
}

#[test]
fn project_surface_forwards_end_to_end() {
	let group = ConnectivityGroup::new();
	let a = group.create_context();
	let b = group.create_context();
	group.connect_all();

	let doc = LocalDocument::new("/src/build.doc");
	let root = doc.entity();
	let container = root.as_container().unwrap();
	container
		.append_child(&doc.create_leaf("Configuration", "Release").unwrap())
		.unwrap();
	let sources = doc.create_group("Compile").unwrap();
	container.append_child(&sources).unwrap();
	sources
		.as_container()
		.unwrap()
		.append_child(&doc.create_leaf("main.rs", "").unwrap())
		.unwrap();

	let project = LocalProject::evaluate(&doc).unwrap();
	project.add_item_definition("Compile", &[("Warn", "all")]);
	let handle = a.export(Some(&project.entity()));
	let proxy = b.import(handle).unwrap().unwrap();
	let ops = proxy.as_project().unwrap();

	assert_eq!(ops.full_path().unwrap(), "/src/build.doc");
	assert_eq!(
		ops.property_value("Configuration").unwrap().as_deref(),
		Some("Release")
	);

	// Property identity is stable across repeated lookups.
	let p1 = ops.property("Configuration").unwrap().unwrap();
	let p2 = ops.property("Configuration").unwrap().unwrap();
	assert!(p1.ptr_eq(&p2));
	assert!(p1.is_linked());

	// Updating keeps the same underlying property, so the same proxy too.
	let updated = ops.set_property("Configuration", "Debug").unwrap();
	assert!(updated.ptr_eq(&p1));
	assert_eq!(p1.as_property().unwrap().value().unwrap(), "Debug");

	let items = ops.items_of_type("Compile").unwrap();
	assert_eq!(items.len(), 1);
	let item = items[0].as_item().unwrap();
	assert_eq!(item.evaluated_include().unwrap(), "main.rs");
	item.set_metadata("Opt", "3").unwrap();
	assert_eq!(item.metadata_value("Opt").unwrap().as_deref(), Some("3"));

	let definition = ops.item_definition("Compile").unwrap().unwrap();
	assert_eq!(
		definition
			.as_item_definition()
			.unwrap()
			.metadata_value("Warn")
			.unwrap()
			.as_deref(),
		Some("all")
	);

	// Reserved properties stay read-only through the link.
	let reserved = ops.property("ProjectPath").unwrap().unwrap();
	assert!(reserved.as_property().unwrap().is_reserved());
	assert_eq!(
		reserved.as_property().unwrap().set_value("/elsewhere"),
		Err(ModelError::ReadOnly {
			name: "ProjectPath".to_owned()
		})
	);

	// Item removal by proxy identity.
	let victim: Entity = items[0].clone();
	ops.remove_item(&victim).unwrap();
	assert!(ops.items().unwrap().iter().all(|i| !i.ptr_eq(&victim)));
}
