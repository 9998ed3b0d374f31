//! Equivalence validation between proxy views and authoritative graphs.
//!
//! Given a linked view and the real graph behind it, [`verify`] walks both
//! in lockstep and proves every observable equal: field values, failures,
//! child counts, sibling order, and parent reference identity. Any
//! divergence is a [`VerifyError`] naming the node path and field.

#![warn(missing_docs)]

mod compare;
mod error;
pub mod fixtures;

pub use compare::{
	verify, verify_documents, verify_groups, verify_item_definitions, verify_items, verify_leaves,
	verify_metadata, verify_projects, verify_properties,
};
pub use error::{Result, VerifyError};
