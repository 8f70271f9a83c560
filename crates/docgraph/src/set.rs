//! Homogeneous collections of nodes.
//!
//! A set declares an item kind. An array document makes it *indexed*: items
//! are named by their `name` key or `<ItemKind>_<position>`. An object makes
//! it *keyed*: each key names one item. Either way an item's `type` tag picks
//! a sub-kind of the declared item kind.

use std::fmt;

use serde_json::{Map, Value};

use crate::constants::{kinds, DEBUG_KEY, NAME_KEY, TYPE_KEY};
use crate::diagnostics::Diagnostic;
use crate::error::{describe, Result, StructuralError, ValidationError};
use crate::graph::{Graph, NodeId, Payload, SerializeOptions, Shape};
use crate::registry::KindId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Indexed,
    Keyed,
}

impl SetMode {
    fn as_str(self) -> &'static str {
        match self {
            SetMode::Indexed => "indexed",
            SetMode::Keyed => "keyed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetState {
    pub(crate) item_kind: KindId,
    /// Unset until the first item arrives.
    pub(crate) mode: Option<SetMode>,
}

impl SetState {
    pub(crate) fn new(item_kind: KindId) -> Self {
        Self {
            item_kind,
            mode: None,
        }
    }

    pub fn item_kind(&self) -> KindId {
        self.item_kind
    }

    pub fn mode(&self) -> Option<SetMode> {
        self.mode
    }
}

/// Addresses one item of a set or link set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetKey {
    Name(String),
    /// Zero-based position in iteration order.
    Index(usize),
}

impl From<&str> for SetKey {
    fn from(name: &str) -> Self {
        SetKey::Name(name.to_string())
    }
}

impl From<String> for SetKey {
    fn from(name: String) -> Self {
        SetKey::Name(name)
    }
}

impl From<usize> for SetKey {
    fn from(index: usize) -> Self {
        SetKey::Index(index)
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetKey::Name(name) => f.write_str(name),
            SetKey::Index(index) => write!(f, "{index}"),
        }
    }
}

impl Graph {
    /// Declare a set child holding items of kind `item_kind`.
    pub fn add_set(&mut self, parent: NodeId, name: &str, item_kind: &str) -> Result<NodeId> {
        let id = self.construct(kinds::NODE_SET, name, Some(parent), None)?;
        self.set_item_kind(id, item_kind)?;
        Ok(id)
    }

    /// Change the declared item kind. Used by builders of set sub-kinds.
    pub fn set_item_kind(&mut self, set: NodeId, item_kind: &str) -> Result<()> {
        let kind = self.registry().require(item_kind)?;
        self.payload_mut(set, Shape::Set, Payload::as_set_mut)?.item_kind = kind;
        Ok(())
    }

    pub fn set_state(&self, set: NodeId) -> Result<&SetState> {
        self.payload(set, "set", Payload::as_set)
    }

    pub fn set_mode(&self, set: NodeId) -> Result<Option<SetMode>> {
        Ok(self.set_state(set)?.mode)
    }

    pub fn items(&self, set: NodeId) -> Result<Vec<NodeId>> {
        self.set_state(set)?;
        self.children(set)
    }

    /// Item lookup on a set or link set. A miss is reported as a diagnostic.
    pub fn get(&self, set: NodeId, key: impl Into<SetKey>) -> Result<Option<NodeId>> {
        if !self.shape(set)?.is_collection() {
            return Err(self.wrong_kind(set, "set"));
        }
        let key = key.into();
        let found = self.lookup_item(set, &key);
        if found.is_none() {
            self.diagnostics.report(Diagnostic::InvalidAccess {
                path: self.path_or_id(set),
                key: key.to_string(),
            });
        }
        Ok(found)
    }

    pub(crate) fn lookup_item(&self, set: NodeId, key: &SetKey) -> Option<NodeId> {
        let node = self.try_node(set)?;
        match key {
            SetKey::Name(name) => node.child(name),
            SetKey::Index(index) => node.children().nth(*index),
        }
    }

    /// Add a named item to a keyed (or still empty) set.
    pub fn insert(&mut self, set: NodeId, name: &str, raw: &Value) -> Result<NodeId> {
        self.claim_mode(set, SetMode::Keyed)?;
        self.construct_item(set, name, raw, false)
    }

    /// Append an item to an indexed (or still empty) set. The item is named
    /// by `raw`'s `name` key when present.
    pub fn push(&mut self, set: NodeId, raw: &Value) -> Result<NodeId> {
        self.claim_mode(set, SetMode::Indexed)?;
        match raw.get(NAME_KEY).and_then(Value::as_str) {
            Some(name) => self.construct_item(set, name, raw, false),
            None => {
                let name = self.generated_name(set, self.node(set)?.child_count() + 1)?;
                self.construct_item(set, &name, raw, true)
            }
        }
    }

    /// Drop an item and its sub-tree. Links that pointed into it become
    /// unresolved.
    pub fn remove(&mut self, set: NodeId, key: impl Into<SetKey>) -> Result<()> {
        if !self.shape(set)?.is_collection() {
            return Err(self.wrong_kind(set, "set"));
        }
        let key = key.into();
        let item = self.lookup_item(set, &key).ok_or_else(|| StructuralError::MissingEntry {
            path: self.path_or_id(set),
            key: key.to_string(),
        })?;
        self.discard(item);
        Ok(())
    }

    /// Remove every item, keeping the mode.
    pub(crate) fn clear_items(&mut self, set: NodeId) -> Result<()> {
        for item in self.children(set)? {
            self.discard(item);
        }
        Ok(())
    }

    fn claim_mode(&mut self, set: NodeId, wanted: SetMode) -> Result<()> {
        let mode = self.set_state(set)?.mode;
        match mode {
            Some(mode) if mode != wanted && self.node(set)?.child_count() > 0 => {
                Err(StructuralError::ShapeMismatch {
                    path: self.path_or_id(set),
                    actual: mode.as_str(),
                    requested: wanted.as_str(),
                }
                .into())
            }
            _ => {
                self.payload_mut(set, Shape::Set, Payload::as_set_mut)?.mode = Some(wanted);
                Ok(())
            }
        }
    }

    /// `<ItemKind>_<n>`, bumping `n` past names already taken.
    fn generated_name(&self, set: NodeId, mut position: usize) -> Result<String> {
        let kind = self.registry().kind(self.set_state(set)?.item_kind).name();
        loop {
            let name = format!("{kind}_{position}");
            if self.child(set, &name).is_none() {
                return Ok(name);
            }
            position += 1;
        }
    }

    /// Concrete kind for an item: the declared item kind, or the sub-kind
    /// named by the item's `type` tag.
    fn item_kind_for(&self, set: NodeId, raw: &Value) -> Result<KindId> {
        let base = self.set_state(set)?.item_kind;
        match raw.get(TYPE_KEY) {
            None => Ok(base),
            Some(Value::String(tag)) => self.registry().resolve_tag(base, tag).ok_or_else(|| {
                StructuralError::UnknownTag {
                    base: self.registry().kind(base).name().to_string(),
                    tag: tag.clone(),
                }
                .into()
            }),
            Some(other) => Err(ValidationError::TypeMismatch {
                expected: "type tag",
                found: describe(other),
            }
            .into()),
        }
    }

    fn construct_item(&mut self, set: NodeId, name: &str, raw: &Value, generated: bool) -> Result<NodeId> {
        let kind = self.item_kind_for(set, raw)?;
        let item = self.construct_kind(kind, name, Some(set), Some(raw))?;
        self.node_mut(item)?.generated_name = generated;
        Ok(item)
    }

    /// Replace all items with those described by `raw`.
    pub(crate) fn deserialize_set(&mut self, set: NodeId, raw: &Value) -> Result<()> {
        match raw {
            Value::Null => self.clear_items(set),
            Value::Array(items) => {
                self.clear_items(set)?;
                self.claim_mode(set, SetMode::Indexed)?;
                for (position, item) in items.iter().enumerate() {
                    match item.get(NAME_KEY).and_then(Value::as_str) {
                        Some(name) => self.construct_item(set, name, item, false)?,
                        None => {
                            let name = self.generated_name(set, position + 1)?;
                            self.construct_item(set, &name, item, true)?
                        }
                    };
                }
                Ok(())
            }
            Value::Object(map) => {
                self.clear_items(set)?;
                self.claim_mode(set, SetMode::Keyed)?;
                for (name, item) in map {
                    if self.take_reserved(set, name, item)? {
                        continue;
                    }
                    self.construct_item(set, name, item, false)?;
                }
                Ok(())
            }
            other => Err(ValidationError::TypeMismatch {
                expected: "array or object",
                found: describe(other),
            }
            .into()),
        }
    }

    /// An item's document form. Items never vanish from their set: when the
    /// item has nothing to say, value items fall back to their full form and
    /// composites to `{}`.
    fn serialize_item(&self, item: NodeId, options: &SerializeOptions) -> Result<Value> {
        if let Some(value) = self.serialize(item, options)? {
            return Ok(value);
        }
        let shape = self.shape(item)?;
        if shape.is_simple() || shape.is_complex() || shape == Shape::Link {
            return Ok(self.serialize(item, &SerializeOptions::FULL)?.unwrap_or(Value::Null));
        }
        Ok(Value::Object(Map::new()))
    }

    /// Prefix `value` with `name`/`type` entries when required.
    fn tag_item(&self, item: NodeId, declared: KindId, value: Value, with_name: bool) -> Result<Value> {
        let node = self.node(item)?;
        let with_type = node.kind != declared;
        let Value::Object(fields) = value else {
            return Ok(value);
        };
        if !with_type && !with_name {
            return Ok(Value::Object(fields));
        }
        let mut tagged = Map::new();
        if with_name {
            tagged.insert(NAME_KEY.to_string(), Value::String(node.name.clone()));
        }
        if with_type {
            let tag = self.registry().kind(node.kind).tag().to_string();
            tagged.insert(TYPE_KEY.to_string(), Value::String(tag));
        }
        tagged.extend(fields);
        Ok(Value::Object(tagged))
    }

    pub(crate) fn serialize_set(&self, set: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let state = self.set_state(set)?;
        let declared = state.item_kind;
        let node = self.node(set)?;
        if options.optimize && node.child_count() == 0 && !node.debug {
            return Ok(None);
        }
        match state.mode {
            Some(SetMode::Indexed) => {
                let mut out = Vec::with_capacity(node.child_count());
                for item in node.children() {
                    let explicit = !self.node(item)?.generated_name;
                    let value = self.serialize_item(item, options)?;
                    out.push(self.tag_item(item, declared, value, explicit)?);
                }
                Ok(Some(Value::Array(out)))
            }
            Some(SetMode::Keyed) | None => {
                let mut out = Map::new();
                if node.debug {
                    out.insert(DEBUG_KEY.to_string(), Value::Bool(true));
                }
                for (name, &item) in &node.children {
                    let value = self.serialize_item(item, options)?;
                    out.insert(name.clone(), self.tag_item(item, declared, value, false)?);
                }
                Ok(Some(Value::Object(out)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::GraphError;
    use crate::registry::TypeRegistry;
    use crate::value::NumberSpec;

    fn setup() -> (Graph, NodeId) {
        let mut registry = TypeRegistry::new();
        registry
            .register("Entry", None, Some(kinds::NODE), |g, id| {
                g.add_number(id, "value", NumberSpec::default())?;
                Ok(())
            })
            .unwrap();
        registry
            .register("Alpha", None, Some("Entry"), |g, id| {
                g.add_boolean(id, "strong", Some(false))?;
                Ok(())
            })
            .unwrap();
        registry
            .register("Holder", None, Some(kinds::NODE), |g, id| {
                g.add_set(id, "entries", "Entry")?;
                Ok(())
            })
            .unwrap();
        let mut g = Graph::new(Arc::new(registry));
        let root = g.construct("Holder", "holder", None, None).unwrap();
        let set = g.child(root, "entries").unwrap();
        (g, set)
    }

    #[test]
    fn array_items_get_generated_or_explicit_names() {
        let (mut g, set) = setup();
        g.deserialize(set, &json!([{"value": 1}, {"name": "second", "value": 2}, {}]))
            .unwrap();
        let names: Vec<String> = g
            .items(set)
            .unwrap()
            .into_iter()
            .map(|id| g.node(id).unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["Entry_1", "second", "Entry_3"]);
        assert_eq!(g.set_mode(set).unwrap(), Some(SetMode::Indexed));
    }

    #[test]
    fn type_tags_pick_sub_kinds() {
        let (mut g, set) = setup();
        g.deserialize(set, &json!([{"type": "alpha", "value": 1}, {"value": 2}]))
            .unwrap();
        let first = g.get(set, 0_usize).unwrap().unwrap();
        let second = g.get(set, 1_usize).unwrap().unwrap();
        assert_eq!(g.kind_name(first).unwrap(), "Alpha");
        assert_eq!(g.kind_name(second).unwrap(), "Entry");
        assert_eq!(
            g.serialize(set, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!([{"type": "alpha", "value": 1}, {"value": 2}]))
        );
    }

    #[test]
    fn unknown_tag_is_structural() {
        let (mut g, set) = setup();
        let err = g.deserialize(set, &json!([{"type": "beta"}])).unwrap_err();
        assert_eq!(
            err,
            GraphError::Structural(StructuralError::UnknownTag {
                base: "Entry".to_string(),
                tag: "beta".to_string()
            })
        );
    }

    #[test]
    fn keyed_sets_round_trip_and_items_never_vanish() {
        let (mut g, set) = setup();
        g.deserialize(set, &json!({"b": {"value": 2}, "a": {}})).unwrap();
        assert_eq!(g.set_mode(set).unwrap(), Some(SetMode::Keyed));
        assert_eq!(
            g.serialize(set, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!({"b": {"value": 2}, "a": {}}))
        );
    }

    #[test]
    fn redeserializing_replaces_items() {
        let (mut g, set) = setup();
        g.deserialize(set, &json!({"a": {}, "b": {}})).unwrap();
        g.deserialize(set, &json!({"c": {}})).unwrap();
        assert_eq!(g.items(set).unwrap().len(), 1);
        assert!(g.get(set, "c").unwrap().is_some());
    }

    #[test]
    fn misses_are_diagnostics() {
        let (mut g, set) = setup();
        g.deserialize(set, &json!({"a": {}})).unwrap();
        assert_eq!(g.get(set, "zzz").unwrap(), None);
        assert_eq!(g.get(set, 5_usize).unwrap(), None);
        assert_eq!(g.diagnostics().len(), 2);
        let holder = g.root().unwrap();
        assert!(g.get(holder, "entries").is_err());
    }

    #[test]
    fn insert_push_and_remove() {
        let (mut g, set) = setup();
        let first = g.push(set, &json!({"value": 1})).unwrap();
        g.push(set, &json!({"type": "alpha"})).unwrap();
        assert_eq!(g.node(first).unwrap().name(), "Entry_1");
        assert!(matches!(
            g.insert(set, "named", &json!({})),
            Err(GraphError::Structural(StructuralError::ShapeMismatch { .. }))
        ));
        g.remove(set, 0_usize).unwrap();
        let again = g.push(set, &json!({})).unwrap();
        // Entry_2 is still taken.
        assert_eq!(g.node(again).unwrap().name(), "Entry_3");
        assert!(matches!(
            g.remove(set, "missing"),
            Err(GraphError::Structural(StructuralError::MissingEntry { .. }))
        ));
    }

    #[test]
    fn keyed_set_keeps_its_debug_flag() {
        let (mut g, set) = setup();
        let raw = json!({"debug": true, "a": {"value": 1}});
        g.deserialize(set, &raw).unwrap();
        assert!(g.node(set).unwrap().is_debug());
        assert_eq!(g.serialize(set, &SerializeOptions::OPTIMIZED).unwrap(), Some(raw));
    }

    #[test]
    fn empty_set_is_absent_when_optimized() {
        let (g, set) = setup();
        assert_eq!(g.serialize(set, &SerializeOptions::OPTIMIZED).unwrap(), None);
        assert_eq!(g.serialize(set, &SerializeOptions::FULL).unwrap(), Some(json!({})));
    }
}
