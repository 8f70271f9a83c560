//! Path-based cross references.
//!
//! A link stores a textual reference that is resolved during
//! [`Graph::update`] by walking the tree from the link's owner, the nearest
//! ancestor that is not itself a link or link set. A resolved link is listed
//! in its target's back-references, so dirtying the target dirties the link
//! and its ancestors too.

mod path;
mod set;

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{kinds, REFERENCE_KEY, STRENGTH_KEY};
use crate::diagnostics::Diagnostic;
use crate::error::{describe, GraphError, ReferenceError, Result, ValidationError};
use crate::graph::{Graph, NodeId, Payload, SerializeOptions, Shape};
use crate::registry::KindId;
use crate::value::number_value;

use path::Step;

pub use set::LinkSetState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkState {
    pub(crate) reference: String,
    /// Prefix joined in front of the reference before resolving.
    pub(crate) origin: String,
    pub(crate) target_kind: Option<KindId>,
    pub(crate) strength: Option<f64>,
    pub(crate) target: Option<NodeId>,
    /// Last failure, so each distinct error is reported once.
    pub(crate) last_error: Option<ReferenceError>,
}

impl LinkState {
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn target_kind(&self) -> Option<KindId> {
        self.target_kind
    }

    pub fn strength(&self) -> Option<f64> {
        self.strength
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn last_error(&self) -> Option<&ReferenceError> {
        self.last_error.as_ref()
    }
}

impl Graph {
    /// Declare a link child. When `target_kind` is given the resolved node
    /// must be of that kind.
    pub fn add_link(
        &mut self,
        parent: NodeId,
        name: &str,
        origin: &str,
        target_kind: Option<&str>,
    ) -> Result<NodeId> {
        let target_kind = target_kind
            .map(|k| self.registry().require(k))
            .transpose()?;
        let id = self.construct(kinds::NODE_LINK, name, Some(parent), None)?;
        let state = self.link_state_mut(id)?;
        state.origin = origin.to_string();
        state.target_kind = target_kind;
        Ok(id)
    }

    pub fn link_state(&self, link: NodeId) -> Result<&LinkState> {
        self.payload(link, "link", Payload::as_link)
    }

    pub(crate) fn link_state_mut(&mut self, link: NodeId) -> Result<&mut LinkState> {
        self.payload_mut(link, Shape::Link, Payload::as_link_mut)
    }

    /// The resolved node. `None` until an update succeeds.
    pub fn target(&self, link: NodeId) -> Result<Option<NodeId>> {
        Ok(self.link_state(link)?.target)
    }

    pub fn reference(&self, link: NodeId) -> Result<&str> {
        Ok(&self.link_state(link)?.reference)
    }

    pub fn strength(&self, link: NodeId) -> Result<Option<f64>> {
        Ok(self.link_state(link)?.strength)
    }

    /// Links currently resolved to `id`.
    pub fn back_refs(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.back_refs.clone())
    }

    pub fn set_reference(&mut self, link: NodeId, reference: &str) -> Result<()> {
        let state = self.link_state_mut(link)?;
        if state.reference == reference {
            return Ok(());
        }
        state.reference = reference.to_string();
        self.mark_dirty(link);
        Ok(())
    }

    pub fn set_strength(&mut self, link: NodeId, strength: Option<f64>) -> Result<()> {
        let state = self.link_state_mut(link)?;
        if state.strength == strength {
            return Ok(());
        }
        state.strength = strength;
        self.mark_dirty(link);
        Ok(())
    }

    /// Resolve the reference of `link`. Returns whether it is usable.
    pub(crate) fn resolve_link(&mut self, link: NodeId) -> Result<bool> {
        let state = self.link_state(link)?;
        if state.reference.is_empty() {
            self.retarget(link, None)?;
            self.link_state_mut(link)?.last_error = None;
            return Ok(true);
        }
        let full = path::compose(&state.origin, &state.reference);
        let required = state.target_kind;

        match self.walk_reference(link, &full, required) {
            Ok(target) => {
                if self.link_state(link)?.target != Some(target) {
                    debug!(link = %self.path_or_id(link), target = %self.path_or_id(target), "link resolved");
                }
                self.retarget(link, Some(target))?;
                self.link_state_mut(link)?.last_error = None;
                Ok(true)
            }
            Err(error) => {
                self.retarget(link, None)?;
                if self.link_state(link)?.last_error.as_ref() != Some(&error) {
                    self.diagnostics.report(Diagnostic::Reference {
                        link: self.path_or_id(link),
                        error: error.clone(),
                    });
                    self.link_state_mut(link)?.last_error = Some(error);
                }
                Ok(false)
            }
        }
    }

    /// Nearest ancestor of `link` that is neither a link nor a link set.
    fn link_owner(&self, link: NodeId) -> Option<NodeId> {
        let mut at = self.try_node(link)?.parent;
        while let Some(current) = at {
            let node = self.try_node(current)?;
            if !node.shape().is_link() {
                return Some(current);
            }
            at = node.parent;
        }
        None
    }

    fn walk_reference(
        &self,
        link: NodeId,
        reference: &str,
        required: Option<KindId>,
    ) -> std::result::Result<NodeId, ReferenceError> {
        let route = path::parse(reference);
        let above_root = || ReferenceError::AboveRoot {
            reference: reference.to_string(),
        };
        let unresolved = |segment: &str, at: NodeId| ReferenceError::Unresolved {
            reference: reference.to_string(),
            segment: segment.to_string(),
            at: self.path_or_id(at),
        };

        let mut steps = route.steps.iter();
        let mut at = if route.absolute {
            let root = self.root().ok_or_else(above_root)?;
            match steps.next() {
                Some(Step::Down(name)) if self.try_node(root).map(|n| n.name.as_str()) == Some(*name) => root,
                Some(Step::Down(name)) => {
                    return Err(ReferenceError::Unresolved {
                        reference: reference.to_string(),
                        segment: name.to_string(),
                        at: String::from("/"),
                    })
                }
                Some(Step::Up) => return Err(above_root()),
                None => root,
            }
        } else {
            self.link_owner(link).ok_or_else(above_root)?
        };

        for step in steps {
            at = match step {
                Step::Up => self.try_node(at).and_then(|n| n.parent).ok_or_else(above_root)?,
                Step::Down(name) => self.descend(at, name).ok_or_else(|| unresolved(*name, at))?,
            };
        }

        if let Some(kind) = required {
            let registry = self.registry();
            let actual = self.try_node(at).map(|n| n.kind);
            if !actual.is_some_and(|k| registry.ancestors(k).any(|a| a == kind)) {
                return Err(ReferenceError::WrongTargetKind {
                    reference: reference.to_string(),
                    target: self.path_or_id(at),
                    expected: registry.kind(kind).name().to_string(),
                });
            }
        }
        Ok(at)
    }

    /// Child by name, or by position when `at` is a collection and `segment`
    /// is numeric.
    fn descend(&self, at: NodeId, segment: &str) -> Option<NodeId> {
        let node = self.try_node(at)?;
        if let Some(child) = node.child(segment) {
            return Some(child);
        }
        if !node.shape().is_collection() {
            return None;
        }
        let index = segment.parse::<usize>().ok()?;
        node.children().nth(index)
    }

    /// Point `link` at `target`, keeping back-references in step.
    fn retarget(&mut self, link: NodeId, target: Option<NodeId>) -> Result<()> {
        let previous = self.link_state(link)?.target;
        if previous != target {
            if let Some(old) = previous.and_then(|p| self.try_node_mut(p)) {
                old.back_refs.retain(|l| *l != link);
            }
        }
        if let Some(t) = target {
            let node = self.node_mut(t)?;
            if !node.back_refs.contains(&link) {
                node.back_refs.push(link);
            }
        }
        self.link_state_mut(link)?.target = target;
        Ok(())
    }

    pub(crate) fn deserialize_link(&mut self, link: NodeId, raw: &Value) -> Result<()> {
        match raw {
            Value::Null => {
                self.set_reference(link, "")?;
                self.set_strength(link, None)
            }
            Value::String(reference) => self.set_reference(link, reference),
            Value::Number(n) => self.set_strength(link, n.as_f64()),
            Value::Object(map) => {
                match map.get(REFERENCE_KEY) {
                    Some(Value::String(reference)) => self.set_reference(link, reference)?,
                    Some(other) => return Err(mismatch("reference string", other)),
                    None => {}
                }
                match map.get(STRENGTH_KEY) {
                    Some(Value::Number(n)) => self.set_strength(link, n.as_f64())?,
                    Some(other) => return Err(mismatch("strength number", other)),
                    None => {}
                }
                for (key, value) in map {
                    if key == REFERENCE_KEY || key == STRENGTH_KEY || self.take_reserved(link, key, value)? {
                        continue;
                    }
                    self.diagnostics.report(Diagnostic::UnknownKey {
                        path: self.path_or_id(link),
                        key: key.clone(),
                    });
                }
                Ok(())
            }
            other => Err(mismatch("link reference", other)),
        }
    }

    pub(crate) fn serialize_link(&self, link: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let state = self.link_state(link)?;
        let value = match (state.reference.is_empty(), state.strength) {
            (true, None) => {
                return Ok(if options.optimize { None } else { Some(Value::Null) });
            }
            (false, None) => Value::String(state.reference.clone()),
            (true, Some(strength)) => number_value(strength),
            (false, Some(strength)) => {
                let mut map = Map::new();
                map.insert(REFERENCE_KEY.to_string(), Value::String(state.reference.clone()));
                map.insert(STRENGTH_KEY.to_string(), number_value(strength));
                Value::Object(map)
            }
        };
        Ok(Some(value))
    }
}

fn mismatch(expected: &'static str, raw: &Value) -> GraphError {
    ValidationError::TypeMismatch {
        expected,
        found: describe(raw),
    }
    .into()
}
