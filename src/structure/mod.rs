//! PDF logical structure trees (Tagged PDF).
//!
//! Builds and traverses the structure tree that gives a document its
//! accessible reading order and semantic roles.
//!
//! PDF Spec: ISO 32000-1:2008, Sections 14.7-14.8

pub mod builder;
pub mod traversal;
pub mod types;

pub use builder::{ElementOptions, ListItemSpec, ListSpec, McidAssignment, StructureTreeBuilder, TableSpec};
pub use types::{NodeChild, NodeId, StructNode, StructTag, StructTree};
