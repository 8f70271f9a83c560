//! Collections of links.
//!
//! An array document produces anonymous entries named `NodeLink_<n>`. An
//! object produces named entries; a bare number as the value means "the
//! same-named node, with this strength", so `{"Foo": 0.5}` is shorthand for
//! `{"Foo": {"reference": "Foo", "strength": 0.5}}`.

use serde_json::{Map, Value};

use crate::constants::{kinds, DEBUG_KEY, REFERENCE_KEY, STRENGTH_KEY};
use crate::error::{describe, Result, ValidationError};
use crate::graph::{Graph, NodeId, Payload, SerializeOptions, Shape};
use crate::registry::KindId;
use crate::set::SetMode;
use crate::value::number_value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSetState {
    pub(crate) origin: String,
    pub(crate) target_kind: Option<KindId>,
    pub(crate) mode: Option<SetMode>,
}

impl LinkSetState {
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn target_kind(&self) -> Option<KindId> {
        self.target_kind
    }

    pub fn mode(&self) -> Option<SetMode> {
        self.mode
    }
}

impl Graph {
    /// Declare a link set child. Every entry inherits `origin` and
    /// `target_kind`.
    pub fn add_link_set(
        &mut self,
        parent: NodeId,
        name: &str,
        origin: &str,
        target_kind: Option<&str>,
    ) -> Result<NodeId> {
        let target_kind = target_kind
            .map(|k| self.registry().require(k))
            .transpose()?;
        let id = self.construct(kinds::NODE_LINK_SET, name, Some(parent), None)?;
        let state = self.link_set_state_mut(id)?;
        state.origin = origin.to_string();
        state.target_kind = target_kind;
        Ok(id)
    }

    pub fn link_set_state(&self, link_set: NodeId) -> Result<&LinkSetState> {
        self.payload(link_set, "link set", Payload::as_link_set)
    }

    fn link_set_state_mut(&mut self, link_set: NodeId) -> Result<&mut LinkSetState> {
        self.payload_mut(link_set, Shape::LinkSet, Payload::as_link_set_mut)
    }

    /// Resolved targets of the entries, in entry order. Unresolved entries
    /// are skipped.
    pub fn targets(&self, link_set: NodeId) -> Result<Vec<NodeId>> {
        self.link_set_state(link_set)?;
        let mut out = Vec::new();
        for entry in self.node(link_set)?.children() {
            if let Some(target) = self.link_state(entry)?.target {
                out.push(target);
            }
        }
        Ok(out)
    }

    /// Append one entry.
    pub fn add_link_entry(&mut self, link_set: NodeId, name: &str, raw: &Value) -> Result<NodeId> {
        let state = self.link_set_state(link_set)?;
        let origin = state.origin.clone();
        let target_kind = state.target_kind;
        let entry = self.construct(kinds::NODE_LINK, name, Some(link_set), None)?;
        let link = self.link_state_mut(entry)?;
        link.origin = origin;
        link.target_kind = target_kind;
        if let Err(e) = self.deserialize_link(entry, raw) {
            self.discard(entry);
            return Err(e);
        }
        Ok(entry)
    }

    pub(crate) fn deserialize_link_set(&mut self, link_set: NodeId, raw: &Value) -> Result<()> {
        let mode = match raw {
            Value::Null => {
                return self.clear_items(link_set);
            }
            Value::Array(_) => SetMode::Indexed,
            Value::Object(_) => SetMode::Keyed,
            other => {
                return Err(ValidationError::TypeMismatch {
                    expected: "array or object",
                    found: describe(other),
                }
                .into())
            }
        };
        self.clear_items(link_set)?;
        self.link_set_state_mut(link_set)?.mode = Some(mode);

        match raw {
            Value::Array(entries) => {
                for (position, entry) in entries.iter().enumerate() {
                    let name = format!("{}_{}", kinds::NODE_LINK, position + 1);
                    let id = self.add_link_entry(link_set, &name, entry)?;
                    self.node_mut(id)?.generated_name = true;
                }
            }
            Value::Object(map) => {
                for (name, entry) in map {
                    if self.take_reserved(link_set, name, entry)? {
                        continue;
                    }
                    let entry = match entry {
                        Value::Number(_) => {
                            let mut shorthand = Map::new();
                            shorthand.insert(REFERENCE_KEY.to_string(), Value::String(name.clone()));
                            shorthand.insert(STRENGTH_KEY.to_string(), entry.clone());
                            Value::Object(shorthand)
                        }
                        _ => entry.clone(),
                    };
                    self.add_link_entry(link_set, name, &entry)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn serialize_link_set(&self, link_set: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let state = self.link_set_state(link_set)?;
        let node = self.node(link_set)?;
        if options.optimize && node.child_count() == 0 && !node.debug {
            return Ok(None);
        }
        let entry_value = |entry: NodeId| -> Result<Value> {
            Ok(self
                .serialize_link(entry, &SerializeOptions::FULL)?
                .unwrap_or(Value::Null))
        };
        match state.mode {
            Some(SetMode::Indexed) => {
                let entries = node.children().map(entry_value).collect::<Result<Vec<_>>>()?;
                Ok(Some(Value::Array(entries)))
            }
            Some(SetMode::Keyed) | None => {
                let mut out = Map::new();
                if node.debug {
                    out.insert(DEBUG_KEY.to_string(), Value::Bool(true));
                }
                for (name, &entry) in &node.children {
                    let link = self.link_state(entry)?;
                    let value = match link.strength {
                        Some(strength) if link.reference == *name => number_value(strength),
                        _ => entry_value(entry)?,
                    };
                    out.insert(name.clone(), value);
                }
                Ok(Some(Value::Object(out)))
            }
        }
    }
}
