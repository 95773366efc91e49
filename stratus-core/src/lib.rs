//! Stratus Core
//!
//! Provider-agnostic model for declarative infrastructure: immutable
//! resource descriptors, an explicit dependency graph, attribute schemas,
//! and serialization of the graph into a manifest for an external
//! diff-and-apply engine.

pub mod error;
pub mod graph;
pub mod resource;
pub mod schema;
pub mod synth;
