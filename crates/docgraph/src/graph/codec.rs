//! Generic deserialize/serialize dispatch.
//!
//! Each payload shape has its own pair of routines in the `set`, `link` and
//! `value` modules; plain composites are handled here by mapping object keys
//! onto same-named children.

use serde_json::{Map, Value};
use tracing::trace;

use crate::constants::{DEBUG_KEY, RESERVED_KEYS};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::graph::{Graph, NodeId, Shape};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Omit values that are unset or equal to their default, and containers
    /// left empty by that.
    pub optimize: bool,
}

impl SerializeOptions {
    pub const FULL: Self = Self { optimize: false };
    pub const OPTIMIZED: Self = Self { optimize: true };
}

impl Graph {
    /// Apply a document value to `id` and its sub-tree.
    pub fn deserialize(&mut self, id: NodeId, raw: &Value) -> Result<()> {
        match self.shape(id)? {
            Shape::Plain => self.deserialize_fields(id, raw),
            Shape::Set => self.deserialize_set(id, raw),
            Shape::Link => self.deserialize_link(id, raw),
            Shape::LinkSet => self.deserialize_link_set(id, raw),
            Shape::Boolean | Shape::Number | Shape::String => self.deserialize_simple(id, raw),
            Shape::Vector | Shape::Color => self.deserialize_complex(id, raw),
        }
    }

    /// Document form of `id`, or `None` when it has nothing to say.
    pub fn serialize(&self, id: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        match self.shape(id)? {
            Shape::Plain => self.serialize_fields(id, options),
            Shape::Set => self.serialize_set(id, options),
            Shape::Link => self.serialize_link(id, options),
            Shape::LinkSet => self.serialize_link_set(id, options),
            Shape::Boolean | Shape::Number | Shape::String => self.serialize_simple(id, options),
            Shape::Vector | Shape::Color => self.serialize_complex(id, options),
        }
    }

    /// True when `id` holds nothing beyond its defaults.
    pub fn is_default(&self, id: NodeId) -> Result<bool> {
        let node = self.node(id)?;
        if let Some(simple) = node.payload.as_boolean() {
            return Ok(simple.is_default());
        }
        if let Some(number) = node.payload.as_number() {
            return Ok(number.simple.is_default());
        }
        if let Some(string) = node.payload.as_string() {
            return Ok(string.simple.is_default());
        }
        if let Some(link) = node.payload.as_link() {
            return Ok(link.reference.is_empty() && link.strength.is_none());
        }
        for child in node.children() {
            if !self.is_default(child)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when no value in `id` was ever assigned.
    pub fn is_undefined(&self, id: NodeId) -> Result<bool> {
        let node = self.node(id)?;
        if let Some(simple) = node.payload.as_boolean() {
            return Ok(simple.is_undefined());
        }
        if let Some(number) = node.payload.as_number() {
            return Ok(number.simple.is_undefined());
        }
        if let Some(string) = node.payload.as_string() {
            return Ok(string.simple.is_undefined());
        }
        if let Some(link) = node.payload.as_link() {
            return Ok(link.reference.is_empty() && link.strength.is_none());
        }
        for child in node.children() {
            if !self.is_undefined(child)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Handle the `debug` flag. Returns true when `key` was reserved.
    pub(crate) fn take_reserved(&mut self, id: NodeId, key: &str, value: &Value) -> Result<bool> {
        if key == DEBUG_KEY {
            let node = self.node_mut(id)?;
            node.debug = value.as_bool().unwrap_or(false);
            if node.debug {
                trace!(node = %id, name = %node.name, "debug enabled");
            }
            return Ok(true);
        }
        Ok(RESERVED_KEYS.contains(&key))
    }

    pub(crate) fn deserialize_fields(&mut self, id: NodeId, raw: &Value) -> Result<()> {
        let Value::Object(map) = raw else {
            return Ok(());
        };
        for (key, value) in map {
            if self.take_reserved(id, key, value)? {
                continue;
            }
            match self.child(id, key) {
                Some(child) => self.deserialize(child, value)?,
                None => self.diagnostics.report(Diagnostic::UnknownKey {
                    path: self.path_or_id(id),
                    key: key.clone(),
                }),
            }
        }
        Ok(())
    }

    fn serialize_fields(&self, id: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let node = self.node(id)?;
        let mut map = Map::new();
        if node.debug {
            map.insert(DEBUG_KEY.to_string(), Value::Bool(true));
        }
        for (name, child) in &node.children {
            if let Some(value) = self.serialize(*child, options)? {
                map.insert(name.clone(), value);
            }
        }
        if options.optimize && map.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::Object(map)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::constants::kinds;
    use crate::registry::TypeRegistry;
    use crate::value::NumberSpec;

    fn graph() -> Graph {
        let mut registry = TypeRegistry::new();
        registry
            .register("Item", None, Some(kinds::NODE), |g, id| {
                g.add_number(id, "size", NumberSpec { default: Some(1.0), ..NumberSpec::default() })?;
                g.add_boolean(id, "visible", Some(true))?;
                g.add_node(id, "inner", kinds::NODE)?;
                Ok(())
            })
            .unwrap();
        Graph::new(Arc::new(registry))
    }

    #[test]
    fn optimized_output_is_sparse() {
        let mut g = graph();
        let root = g.construct("Item", "item", None, Some(&json!({"size": 2}))).unwrap();
        assert_eq!(
            g.serialize(root, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!({"size": 2}))
        );
        assert_eq!(
            g.serialize(root, &SerializeOptions::FULL).unwrap(),
            Some(json!({"size": 2, "visible": true, "inner": {}}))
        );
    }

    #[test]
    fn empty_optimized_document_is_absent() {
        let mut g = graph();
        let root = g.construct("Item", "item", None, None).unwrap();
        assert_eq!(g.serialize(root, &SerializeOptions::OPTIMIZED).unwrap(), None);
        assert!(g.is_default(root).unwrap());
        assert!(g.is_undefined(root).unwrap());
    }

    #[test]
    fn unknown_keys_are_reported_and_dropped() {
        let mut g = graph();
        let root = g
            .construct("Item", "item", None, Some(&json!({"size": 3, "colour": "red"})))
            .unwrap();
        assert_eq!(
            g.diagnostics(),
            vec![Diagnostic::UnknownKey {
                path: "/item".to_string(),
                key: "colour".to_string()
            }]
        );
        assert_eq!(
            g.serialize(root, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!({"size": 3}))
        );
    }

    #[test]
    fn reserved_keys_are_not_children() {
        let mut g = graph();
        let root = g
            .construct("Item", "item", None, Some(&json!({"name": "x", "type": "item", "debug": true})))
            .unwrap();
        assert!(g.diagnostics().is_empty());
        assert!(g.node(root).unwrap().is_debug());
        assert_eq!(
            g.serialize(root, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!({"debug": true}))
        );
    }

    #[test]
    fn non_object_input_is_ignored_for_composites() {
        let mut g = graph();
        let root = g.construct("Item", "item", None, Some(&json!([1, 2]))).unwrap();
        assert!(g.is_undefined(root).unwrap());
    }
}
