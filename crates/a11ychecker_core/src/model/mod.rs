//! Document and issue model shared by every checker layer.
//!
//! # Responsibility
//! - Define the editable tree the checker decorates.
//! - Define issue records and their ordered list.
//!
//! # Invariants
//! - Tree nodes are addressed by `NodeId`, never by pointer.
//! - Issues refer to live nodes only through resolved `NodeId`s.

pub mod document;
pub mod issue;
