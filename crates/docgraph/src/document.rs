//! Loading and saving whole documents as text.

use std::sync::Arc;

use docgraph_jsonc::{pretty_print_value, PrettyOptions};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::graph::{Graph, NodeId, SerializeOptions};
use crate::registry::TypeRegistry;

impl Graph {
    /// Parse `text`, build a root of kind `kind` from it and run a first
    /// update so links are resolved.
    pub fn load_document(registry: Arc<TypeRegistry>, kind: &str, name: &str, text: &str) -> Result<Graph> {
        let raw = docgraph_jsonc::parse(text)?;
        let mut graph = Graph::new(registry);
        let root = graph.construct(kind, name, None, Some(&raw))?;
        let clean = graph.update(root, false)?;
        debug!(root = name, nodes = graph.len(), clean, "document loaded");
        Ok(graph)
    }

    /// Pretty-printed document text for the sub-tree at `id`. An absent
    /// serialization is written as `{}`.
    pub fn save_document(&self, id: NodeId, options: &SerializeOptions, pretty: &PrettyOptions) -> Result<String> {
        let value = self
            .serialize(id, options)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        Ok(pretty_print_value(&value, pretty))
    }
}
