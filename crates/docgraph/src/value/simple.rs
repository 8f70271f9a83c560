//! Boolean, number and string nodes.

use serde_json::Value;

use super::{number_value, NumberSpec, NumberState, Simple, StringState};
use crate::constants::kinds;
use crate::error::{describe, GraphError, Result, ValidationError};
use crate::graph::{Graph, NodeId, Payload, SerializeOptions, Shape};

impl Graph {
    pub fn add_boolean(&mut self, parent: NodeId, name: &str, default: Option<bool>) -> Result<NodeId> {
        let id = self.construct(kinds::BOOLEAN, name, Some(parent), None)?;
        *self.payload_mut(id, Shape::Boolean, Payload::as_boolean_mut)? = Simple::new(default);
        Ok(id)
    }

    pub fn add_number(&mut self, parent: NodeId, name: &str, spec: NumberSpec) -> Result<NodeId> {
        let id = self.construct(kinds::NUMBER, name, Some(parent), None)?;
        *self.payload_mut(id, Shape::Number, Payload::as_number_mut)? = NumberState::from_spec(spec);
        Ok(id)
    }

    /// A string child. A non-empty `valid_values` restricts what it accepts.
    pub fn add_string(
        &mut self,
        parent: NodeId,
        name: &str,
        default: Option<&str>,
        valid_values: &[&str],
    ) -> Result<NodeId> {
        let id = self.construct(kinds::STRING, name, Some(parent), None)?;
        *self.payload_mut(id, Shape::String, Payload::as_string_mut)? = StringState {
            simple: Simple::new(default.map(str::to_string)),
            valid_values: valid_values.iter().map(|v| v.to_string()).collect(),
        };
        Ok(id)
    }

    pub fn boolean(&self, id: NodeId) -> Result<Option<bool>> {
        Ok(self.payload(id, "boolean", Payload::as_boolean)?.get().copied())
    }

    pub fn number(&self, id: NodeId) -> Result<Option<f64>> {
        Ok(self.payload(id, "number", Payload::as_number)?.simple.get().copied())
    }

    pub fn string(&self, id: NodeId) -> Result<Option<&str>> {
        Ok(self
            .payload(id, "string", Payload::as_string)?
            .simple
            .get()
            .map(String::as_str))
    }

    pub fn set_boolean(&mut self, id: NodeId, value: bool) -> Result<()> {
        let state = self.payload_mut(id, Shape::Boolean, Payload::as_boolean_mut)?;
        let before = state.get().copied();
        state.value = Some(value);
        self.dirty_if(id, before != Some(value));
        Ok(())
    }

    /// Assign a number. NaN and out-of-range values are rejected and the
    /// previous value is kept.
    pub fn set_number(&mut self, id: NodeId, value: f64) -> Result<()> {
        let state = self.payload_mut(id, Shape::Number, Payload::as_number_mut)?;
        state.check(value)?;
        let before = state.simple.get().copied();
        state.simple.value = Some(value);
        self.dirty_if(id, before != Some(value));
        Ok(())
    }

    pub fn set_string(&mut self, id: NodeId, value: &str) -> Result<()> {
        let state = self.payload_mut(id, Shape::String, Payload::as_string_mut)?;
        state.check(value)?;
        let changed = state.simple.get().map(String::as_str) != Some(value);
        state.simple.value = Some(value.to_string());
        self.dirty_if(id, changed);
        Ok(())
    }

    /// Drop the assigned value so reads fall back to the default.
    pub fn clear_value(&mut self, id: NodeId) -> Result<()> {
        let changed = match &mut self.node_mut(id)?.payload {
            Payload::Boolean(s) => Some(clear(s)),
            Payload::Number(n) => Some(clear(&mut n.simple)),
            Payload::String(s) => Some(clear(&mut s.simple)),
            _ => None,
        };
        let Some(changed) = changed else {
            return Err(self.wrong_kind(id, "simple value"));
        };
        self.dirty_if(id, changed);
        Ok(())
    }

    /// Replace the accepted range. The current value is not re-checked.
    pub fn set_bounds(&mut self, id: NodeId, min: Option<f64>, max: Option<f64>) -> Result<()> {
        let state = self.payload_mut(id, Shape::Number, Payload::as_number_mut)?;
        state.min = min;
        state.max = max;
        Ok(())
    }

    pub fn set_valid_values(&mut self, id: NodeId, valid_values: &[&str]) -> Result<()> {
        let state = self.payload_mut(id, Shape::String, Payload::as_string_mut)?;
        state.valid_values = valid_values.iter().map(|v| v.to_string()).collect();
        Ok(())
    }

    pub(crate) fn deserialize_simple(&mut self, id: NodeId, raw: &Value) -> Result<()> {
        if raw.is_null() {
            return self.clear_value(id);
        }
        match (self.shape(id)?, raw) {
            (Shape::Boolean, Value::Bool(b)) => self.set_boolean(id, *b),
            (Shape::Number, Value::Number(n)) => match n.as_f64() {
                Some(v) => self.set_number(id, v),
                None => Err(mismatch("number", raw)),
            },
            (Shape::String, Value::String(s)) => self.set_string(id, s),
            (Shape::Boolean, _) => Err(mismatch("boolean", raw)),
            (Shape::Number, _) => Err(mismatch("number", raw)),
            _ => Err(mismatch("string", raw)),
        }
    }

    pub(crate) fn serialize_simple(&self, id: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let node = self.node(id)?;
        let (is_default, value) = match &node.payload {
            Payload::Boolean(s) => (s.is_default(), s.get().map(|b| Value::Bool(*b))),
            Payload::Number(n) => (n.simple.is_default(), n.simple.get().map(|v| number_value(*v))),
            Payload::String(s) => (s.simple.is_default(), s.simple.get().map(|v| Value::String(v.clone()))),
            _ => return Err(self.wrong_kind(id, "simple value")),
        };
        if options.optimize && is_default {
            return Ok(None);
        }
        Ok(value)
    }

    fn dirty_if(&mut self, id: NodeId, changed: bool) {
        if changed {
            self.mark_dirty(id);
        }
    }
}

fn clear<T: PartialEq>(simple: &mut Simple<T>) -> bool {
    let changed = simple.value.is_some() && simple.value != simple.default;
    simple.value = None;
    changed
}

fn mismatch(expected: &'static str, raw: &Value) -> GraphError {
    ValidationError::TypeMismatch {
        expected,
        found: describe(raw),
    }
    .into()
}
