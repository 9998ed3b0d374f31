//! Authoritative in-memory implementations of every entity kind.
//!
//! Document trees are arena-backed: one slab of nodes per document with
//! index links for parent/child/sibling structure, and one stable facade
//! `Arc` per node so reference identity is well defined. Facades hold a
//! `Weak` back to the document; cycles exist only as indices.

mod document;
mod project;

pub use document::{LocalDocument, LocalGroup, LocalLeaf};
pub use project::{LocalItem, LocalItemDefinition, LocalMetadata, LocalProject, LocalProperty};
