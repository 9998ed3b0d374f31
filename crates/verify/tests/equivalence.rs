//! Whole-graph equivalence runs against mirrored documents and projects.

use pretty_assertions::assert_eq;
use tether_model::local::LocalProject;
use tether_model::{ContainerOps, DocumentOps, LeafOps, ProjectOps};
use tether_verify::fixtures::{sample_document, sample_project, Mirror};
use tether_verify::{verify, verify_documents, verify_leaves, verify_projects, VerifyError};

#[test]
fn mirrored_document_verifies_clean() {
	let mirror = Mirror::new();
	let doc = sample_document().unwrap();
	let real = doc.entity();
	let view = mirror.reflect(&real).unwrap();

	verify(&view, &real).unwrap();
	verify_documents(&view, &real).unwrap();
}

#[test]
fn mirrored_project_verifies_clean() {
	let mirror = Mirror::new();
	let (_doc, project) = sample_project().unwrap();
	let real = project.entity();
	let view = mirror.reflect(&real).unwrap();

	// Reserved and environment properties fail `unevaluated()` on both
	// sides with the same error, which counts as agreement.
	verify(&view, &real).unwrap();
	verify_projects(&view, &real).unwrap();
}

#[test]
fn verification_tracks_live_mutation() {
	let mirror = Mirror::new();
	let doc = sample_document().unwrap();
	let real = doc.entity();
	let view = mirror.reflect(&real).unwrap();
	verify(&view, &real).unwrap();

	// Mutate through the proxy; the mirrored pair must still agree.
	let config = view.as_container().unwrap().first_child().unwrap().unwrap();
	config.as_leaf().unwrap().set_value("Debug").unwrap();
	let extra = view.as_document().unwrap().create_group("Extra").unwrap();
	view.as_container().unwrap().append_child(&extra).unwrap();

	verify(&view, &real).unwrap();
}

#[test]
fn unlinked_view_is_rejected() {
	let doc = sample_document().unwrap();
	let real = doc.entity();

	match verify(&real, &real) {
		Err(VerifyError::LinkFlag { path }) => assert_eq!(path, "root"),
		other => panic!("expected LinkFlag, got {other:?}"),
	}
}

#[test]
fn kind_confusion_is_rejected() {
	let mirror = Mirror::new();
	let doc = sample_document().unwrap();
	let real = doc.entity();
	let view = mirror.reflect(&real).unwrap();

	match verify_leaves(&view, &real) {
		Err(VerifyError::KindMismatch { path, .. }) => assert_eq!(path, "root"),
		other => panic!("expected KindMismatch, got {other:?}"),
	}
}

#[test]
fn divergent_leaf_value_is_reported_with_its_path() {
	let mirror = Mirror::new();
	let doc_a = sample_document().unwrap();
	let doc_b = sample_document().unwrap();
	let view = mirror.reflect(&doc_a.entity()).unwrap();

	// Same shape, one different value deep in the second graph.
	let compile = doc_b.entity().as_container().unwrap().children().unwrap()[1].clone();
	let leaf = compile.as_container().unwrap().first_child().unwrap().unwrap();
	leaf.as_leaf().unwrap().set_value("src/lib.rs").unwrap();

	// Versions differ too, but the comparison order makes the version
	// field fire first; pin the leaf divergence through the subtree.
	match verify(&view, &doc_b.entity()) {
		Err(VerifyError::Mismatch { field, .. }) => assert_eq!(field, "version"),
		other => panic!("expected Mismatch, got {other:?}"),
	}
	let view_compile = view.as_container().unwrap().children().unwrap()[1].clone();
	match verify_leaves(
		&view_compile.as_container().unwrap().first_child().unwrap().unwrap(),
		&leaf,
	) {
		Err(VerifyError::Mismatch { path, field, view, real }) => {
			assert_eq!(field, "value");
			assert_eq!(path, "root");
			assert_eq!(view, "\"src/main.rs\"");
			assert_eq!(real, "\"src/lib.rs\"");
		}
		other => panic!("expected Mismatch, got {other:?}"),
	}
}

#[test]
fn missing_child_is_reported_as_count_divergence() {
	let mirror = Mirror::new();
	let doc_a = sample_document().unwrap();
	let doc_b = sample_document().unwrap();
	let view = mirror.reflect(&doc_a.entity()).unwrap();

	let victim = doc_b.entity().as_container().unwrap().first_child().unwrap().unwrap();
	doc_b
		.entity()
		.as_container()
		.unwrap()
		.remove_child(&victim)
		.unwrap();

	// Removal bumps the revision counter, so either the version or the
	// child count is the first field to fire.
	match verify(&view, &doc_b.entity()) {
		Err(VerifyError::Mismatch { field, .. }) => {
			assert!(field == "version" || field == "child_count");
		}
		other => panic!("expected Mismatch, got {other:?}"),
	}
}

#[test]
fn one_sided_failure_is_an_error_divergence() {
	let mirror = Mirror::new();
	let (_doc, project) = sample_project().unwrap();
	let reserved = project.entity().as_project().unwrap().property("ProjectPath").unwrap().unwrap();
	let view = mirror.reflect(&reserved).unwrap();

	// A plain property with the same name and value, but a backing
	// unevaluated form the reserved one lacks.
	let other = LocalProject::new("/proj/build.doc");
	let plain = other
		.entity()
		.as_project()
		.unwrap()
		.set_property("ProjectPath", "/proj/build.doc")
		.unwrap();

	match tether_verify::verify_properties(&view, &plain) {
		Err(VerifyError::ErrorDivergence { field, view, real, .. }) => {
			assert_eq!(field, "unevaluated");
			assert!(view.is_some(), "reserved side must carry the failure");
			assert!(real.is_none(), "plain side must have succeeded");
		}
		other => panic!("expected ErrorDivergence, got {other:?}"),
	}
}
