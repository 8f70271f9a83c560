//! Vector and color composites.
//!
//! Both are fixed sets of number children. Input may be positional (an
//! array), named (an object) or a single number applied to every component.
//! Colors also accept hexadecimal literals; any other string is kept as the
//! color's `text`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::number_value;
use crate::constants::{kinds, COLOR_CHANNELS, COLOR_TEXT, VECTOR_COMPONENTS};
use crate::diagnostics::Diagnostic;
use crate::error::{describe, Result, ValidationError};
use crate::graph::{Graph, NodeId, Payload, SerializeOptions, Shape};

fn hex_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .unwrap_or_else(|e| panic!("hex color pattern: {e}"))
    })
}

/// Channels in 0..1 from a `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` literal.
fn parse_hex(text: &str) -> Option<Vec<f64>> {
    if !hex_pattern().is_match(text) {
        return None;
    }
    let digits = &text[1..];
    let width = if digits.len() <= 4 { 1 } else { 2 };
    (0..digits.len() / width)
        .map(|i| {
            let chunk = &digits[i * width..(i + 1) * width];
            let v = u8::from_str_radix(chunk, 16).ok()?;
            let v = if width == 1 { v * 17 } else { v };
            Some(f64::from(v) / 255.0)
        })
        .collect()
}

/// What one component receives from an assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Assign {
    Keep,
    Reset,
    Set(f64),
}

fn to_byte(channel: f64) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Graph {
    pub fn add_vector(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.construct(kinds::VECTOR, name, Some(parent), None)
    }

    pub fn add_color(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.construct(kinds::COLOR, name, Some(parent), None)
    }

    fn components(&self, id: NodeId) -> Result<(&'static str, &'static [&'static str])> {
        const VECTOR: &[&str] = &VECTOR_COMPONENTS;
        const COLOR: &[&str] = &COLOR_CHANNELS;
        match self.shape(id)? {
            Shape::Vector => Ok(("vector", VECTOR)),
            Shape::Color => Ok(("color", COLOR)),
            _ => Err(self.wrong_kind(id, "vector or color")),
        }
    }

    fn component(&self, id: NodeId, name: &str) -> Result<NodeId> {
        self.child(id, name)
            .ok_or_else(|| self.wrong_kind(id, "vector or color"))
    }

    /// Effective values of the numeric components, in declaration order.
    pub fn components_of(&self, id: NodeId) -> Result<Vec<f64>> {
        let (_, names) = self.components(id)?;
        names
            .iter()
            .map(|name| Ok(self.number(self.component(id, name)?)?.unwrap_or(0.0)))
            .collect()
    }

    /// `#rrggbb`, or `#rrggbbaa` when the color is not opaque.
    pub fn color_hex(&self, id: NodeId) -> Result<String> {
        if self.shape(id)? != Shape::Color {
            return Err(self.wrong_kind(id, "color"));
        }
        let channels = self.components_of(id)?;
        let mut out = String::from("#");
        for (i, channel) in channels.iter().enumerate() {
            if i == 3 && *channel == 1.0 {
                break;
            }
            out.push_str(&format!("{:02x}", to_byte(*channel)));
        }
        Ok(out)
    }

    pub(crate) fn deserialize_complex(&mut self, id: NodeId, raw: &Value) -> Result<()> {
        let (kind, names) = self.components(id)?;
        let is_color = kind == "color";

        // Named input only touches the components it mentions, and may carry
        // the color's text alongside the channels.
        let mut clear_text = false;
        let plan: Vec<Assign> = match raw {
            Value::Null => vec![Assign::Reset; names.len()],
            Value::Object(map) => {
                let mut plan = vec![Assign::Keep; names.len()];
                for (key, value) in map {
                    if let Some(slot) = names.iter().position(|name| *name == key.as_str()) {
                        plan[slot] = match value {
                            Value::Null => Assign::Reset,
                            other => Assign::Set(other.as_f64().ok_or_else(|| ValidationError::TypeMismatch {
                                expected: "number",
                                found: describe(other),
                            })?),
                        };
                    } else if is_color && key == COLOR_TEXT {
                        match value {
                            Value::Null => clear_text = true,
                            Value::String(_) => {}
                            other => {
                                return Err(ValidationError::TypeMismatch {
                                    expected: "string",
                                    found: describe(other),
                                }
                                .into())
                            }
                        }
                    }
                }
                plan
            }
            Value::Number(n) => vec![n.as_f64().map_or(Assign::Reset, Assign::Set); names.len()],
            Value::Array(items) => {
                if items.len() > names.len() {
                    return Err(ValidationError::Malformed {
                        kind,
                        reason: format!("expected at most {} components, found {}", names.len(), items.len()),
                    }
                    .into());
                }
                let mut plan = Vec::with_capacity(names.len());
                for item in items {
                    match item.as_f64() {
                        Some(v) => plan.push(Assign::Set(v)),
                        None => {
                            return Err(ValidationError::TypeMismatch {
                                expected: "number",
                                found: describe(item),
                            }
                            .into())
                        }
                    }
                }
                plan.resize(names.len(), Assign::Reset);
                plan
            }
            Value::String(text) if is_color => {
                if !text.starts_with('#') {
                    let text_id = self.component(id, COLOR_TEXT)?;
                    return self.set_string(text_id, text);
                }
                let mut channels = parse_hex(text).ok_or_else(|| ValidationError::Malformed {
                    kind,
                    reason: format!("`{text}` is not a hex color"),
                })?;
                channels.resize(names.len(), 1.0);
                channels.into_iter().map(Assign::Set).collect()
            }
            other => {
                return Err(ValidationError::TypeMismatch {
                    expected: if is_color { "color" } else { "vector" },
                    found: describe(other),
                }
                .into())
            }
        };

        let targets = names
            .iter()
            .map(|name| self.component(id, name))
            .collect::<Result<Vec<_>>>()?;
        // Validate everything first so a bad component leaves the whole value untouched.
        for (&target, assign) in targets.iter().zip(&plan) {
            if let Assign::Set(v) = assign {
                let state = self.payload(target, "number", Payload::as_number)?;
                state.check(*v)?;
            }
        }
        let touched = plan.iter().any(|assign| *assign != Assign::Keep);
        for (target, assign) in targets.into_iter().zip(plan) {
            match assign {
                Assign::Set(v) => self.set_number(target, v)?,
                Assign::Reset => self.clear_value(target)?,
                Assign::Keep => {}
            }
        }

        if let Value::Object(map) = raw {
            for (key, value) in map {
                let known = names.contains(&key.as_str()) || (is_color && key == COLOR_TEXT);
                if known || self.take_reserved(id, key, value)? {
                    continue;
                }
                self.diagnostics.report(Diagnostic::UnknownKey {
                    path: self.path_or_id(id),
                    key: key.clone(),
                });
            }
        }
        if is_color {
            let text_id = self.component(id, COLOR_TEXT)?;
            match raw.get(COLOR_TEXT).and_then(Value::as_str) {
                Some(given) => self.set_string(text_id, given)?,
                // Channels take over from a text color once they are assigned.
                None if clear_text || touched || !raw.is_object() => self.clear_value(text_id)?,
                None => {}
            }
        }
        Ok(())
    }

    pub(crate) fn serialize_complex(&self, id: NodeId, options: &SerializeOptions) -> Result<Option<Value>> {
        let (kind, _) = self.components(id)?;
        if kind == "color" {
            let text_id = self.component(id, COLOR_TEXT)?;
            if let Some(text) = self.string(text_id)?.filter(|t| !t.is_empty()) {
                return Ok(Some(Value::String(text.to_string())));
            }
        }
        if options.optimize && self.is_default(id)? {
            return Ok(None);
        }
        let mut values = self.components_of(id)?;
        if kind == "color" && values.get(3) == Some(&1.0) {
            values.truncate(3);
        }
        Ok(Some(Value::Array(values.into_iter().map(number_value).collect())))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::error::GraphError;
    use crate::registry::TypeRegistry;

    fn setup() -> (Graph, NodeId) {
        let mut g = Graph::new(Arc::new(TypeRegistry::new()));
        let root = g.construct(kinds::NODE, "root", None, None).unwrap();
        (g, root)
    }

    #[test]
    fn vector_forms() {
        let (mut g, root) = setup();
        let v = g.add_vector(root, "position").unwrap();
        g.deserialize(v, &json!([1, 2, 3])).unwrap();
        assert_eq!(g.components_of(v).unwrap(), vec![1.0, 2.0, 3.0]);
        g.deserialize(v, &json!({"y": 5})).unwrap();
        assert_eq!(g.components_of(v).unwrap(), vec![1.0, 5.0, 3.0]);
        // Positional input resets what it leaves out.
        g.deserialize(v, &json!([7])).unwrap();
        assert_eq!(g.components_of(v).unwrap(), vec![7.0, 0.0, 0.0]);
        g.deserialize(v, &json!(4)).unwrap();
        assert_eq!(g.components_of(v).unwrap(), vec![4.0, 4.0, 4.0]);
        assert_eq!(g.serialize(v, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!([4, 4, 4])));
    }

    #[test]
    fn vector_rejects_malformed_input() {
        let (mut g, root) = setup();
        let v = g.add_vector(root, "position").unwrap();
        assert!(matches!(
            g.deserialize(v, &json!([1, 2, 3, 4])),
            Err(GraphError::Validation(ValidationError::Malformed { kind: "vector", .. }))
        ));
        assert!(matches!(
            g.deserialize(v, &json!("up")),
            Err(GraphError::Validation(ValidationError::TypeMismatch { .. }))
        ));
        assert!(g.is_undefined(v).unwrap());
    }

    #[test]
    fn default_vector_is_absent_when_optimized() {
        let (mut g, root) = setup();
        let v = g.add_vector(root, "position").unwrap();
        assert_eq!(g.serialize(v, &SerializeOptions::OPTIMIZED).unwrap(), None);
        assert_eq!(g.serialize(v, &SerializeOptions::FULL).unwrap(), Some(json!([0, 0, 0])));
    }

    #[test]
    fn color_hex_literals() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!("#ff0000")).unwrap();
        assert_eq!(g.components_of(c).unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!([1, 0, 0])));

        g.deserialize(c, &json!("#F008")).unwrap();
        let channels = g.components_of(c).unwrap();
        assert_eq!(channels[0], 1.0);
        assert!((channels[3] - 136.0 / 255.0).abs() < 1e-9);
        assert_eq!(g.color_hex(c).unwrap(), "#ff000088");

        assert!(matches!(
            g.deserialize(c, &json!("#12345")),
            Err(GraphError::Validation(ValidationError::Malformed { kind: "color", .. }))
        ));
    }

    #[test]
    fn color_text_is_kept_verbatim() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!("steelblue")).unwrap();
        assert_eq!(g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!("steelblue")));
        g.deserialize(c, &json!([0, 0, 1])).unwrap();
        assert_eq!(g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!([0, 0, 1])));
    }

    #[test]
    fn color_channels_are_range_checked_as_a_whole() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!([0.5, 0.5, 0.5])).unwrap();
        assert!(g.deserialize(c, &json!([0.1, 0.2, 2.0])).is_err());
        assert_eq!(g.components_of(c).unwrap(), vec![0.5, 0.5, 0.5, 1.0]);
        assert_eq!(g.color_hex(c).unwrap(), "#808080");
    }

    #[test]
    fn named_channels_are_checked_before_any_is_stored() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!([0.5, 0.5, 0.5])).unwrap();
        assert!(matches!(
            g.deserialize(c, &json!({"r": 0.1, "g": 2.0})),
            Err(GraphError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(g.components_of(c).unwrap(), vec![0.5, 0.5, 0.5, 1.0]);

        let v = g.add_vector(root, "position").unwrap();
        g.deserialize(v, &json!([1, 2, 3])).unwrap();
        assert!(matches!(
            g.deserialize(v, &json!({"x": 9, "y": "bad"})),
            Err(GraphError::Validation(ValidationError::TypeMismatch { .. }))
        ));
        assert_eq!(g.components_of(v).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn named_channels_replace_color_text() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!("steelblue")).unwrap();
        g.deserialize(c, &json!({"r": 1})).unwrap();
        assert_eq!(g.components_of(c).unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
        assert_eq!(g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!([1, 0, 0])));

        // Text given alongside channels wins, and a debug-only object keeps it.
        g.deserialize(c, &json!({"g": 1, "text": "lime"})).unwrap();
        g.deserialize(c, &json!({"debug": true})).unwrap();
        assert_eq!(g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(), Some(json!("lime")));
    }

    #[test]
    fn unknown_component_keys_are_reported() {
        let (mut g, root) = setup();
        let v = g.add_vector(root, "position").unwrap();
        g.deserialize(v, &json!({"x": 1, "w": 4})).unwrap();
        assert_eq!(g.components_of(v).unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(g.diagnostics().len(), 1);
    }

    #[test]
    fn translucent_color_keeps_alpha() {
        let (mut g, root) = setup();
        let c = g.add_color(root, "fill").unwrap();
        g.deserialize(c, &json!([1, 1, 1, 0.5])).unwrap();
        assert_eq!(
            g.serialize(c, &SerializeOptions::OPTIMIZED).unwrap(),
            Some(json!([1, 1, 1, 0.5]))
        );
        assert_eq!(g.serialize(c, &SerializeOptions::FULL).unwrap(), Some(json!([1, 1, 1, 0.5])));
    }
}
