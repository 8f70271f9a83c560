//! An in-memory, strongly typed document object graph.
//!
//! A document is a tree of named nodes. Each node has a kind from a
//! [`TypeRegistry`]; kinds form a hierarchy and carry a builder that declares
//! the node's children (values, sets, links, nested composites). Documents are
//! read from and written to JSON-with-comments text through
//! [`docgraph_jsonc`].
//!
//! Nodes live in a flat arena owned by [`Graph`] and are addressed by
//! [`NodeId`]. The graph keeps itself consistent through a dirty/clean
//! protocol: mutations mark the node, its ancestors and every link that points
//! at it dirty straight away, and [`Graph::update`] walks dirty sub-trees,
//! re-resolving links, until everything is clean again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use docgraph::{Graph, NumberSpec, SerializeOptions, TypeRegistry};
//! use serde_json::json;
//!
//! let mut registry = TypeRegistry::new();
//! registry
//!     .register("Point", None, Some("Node"), |g, id| {
//!         g.add_number(id, "weight", NumberSpec { default: Some(1.0), min: Some(0.0), max: Some(10.0) })?;
//!         g.add_link(id, "next", "", None)?;
//!         Ok(())
//!     })
//!     .unwrap();
//! registry
//!     .register("Plot", None, Some("Node"), |g, id| {
//!         g.add_set(id, "points", "Point")?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let text = r#"{
//!     "points": {
//!         "a": { "weight": 3, "next": "../b" }, // trailing commas are fine
//!         "b": {},
//!     },
//! }"#;
//! let mut graph = Graph::load_document(Arc::new(registry), "Plot", "plot", text).unwrap();
//! let root = graph.root().unwrap();
//! assert!(graph.update(root, false).unwrap());
//!
//! let a = graph.find("/plot/points/a").unwrap();
//! let next = graph.child(a, "next").unwrap();
//! assert_eq!(graph.target(next).unwrap(), graph.find("/plot/points/b"));
//!
//! let saved = graph.serialize(root, &SerializeOptions { optimize: true }).unwrap();
//! assert_eq!(saved, Some(json!({"points": {"a": {"weight": 3, "next": "../b"}, "b": {}}})));
//! ```

pub mod constants;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod graph;
pub mod link;
pub mod registry;
pub mod set;
pub mod value;

pub use diagnostics::Diagnostic;
pub use error::{
    ConfigurationError, GraphError, ReferenceError, Result, StructuralError, ValidationError,
};
pub use graph::{Graph, Node, NodeId, Payload, SerializeOptions, Shape};
pub use link::{LinkSetState, LinkState};
pub use registry::{Builder, KindId, NodeKind, TypeRegistry};
pub use set::{SetKey, SetMode, SetState};
pub use value::{NumberSpec, NumberState, Simple, StringState};
