//! Width-aware pretty-printer.
//!
//! Every container is first rendered as a single-line candidate such as
//! `[ 1, 2 ]` or `{ "a": 1 }`. The candidate is kept when it fits in the
//! columns left on the current line and none of its items needed more than
//! one line; otherwise the container is broken into one item per line, one
//! indentation level deeper, and each item makes the same decision again.
//!
//! Comments are carried as [`Doc::Comment`] / [`Member::Comment`] items whose
//! text is emitted verbatim on a line of its own.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::constants::{DEFAULT_INDENT, DEFAULT_MAX_LINE_WIDTH};

/// Layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrettyOptions {
    pub max_line_width: usize,
    /// One level of indentation.
    pub indent: String,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

/// A printable document: JSON plus verbatim comments.
#[derive(Debug, Clone, PartialEq)]
pub enum Doc {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Doc>),
    Object(Vec<Member>),
    /// Comment text, including its `//` or `/* */` markers.
    Comment(String),
}

/// One entry of a [`Doc::Object`].
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(String, Doc),
    Comment(String),
}

impl From<&Value> for Doc {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Doc::Null,
            Value::Bool(b) => Doc::Bool(*b),
            Value::Number(n) => Doc::Number(n.clone()),
            Value::String(s) => Doc::String(s.clone()),
            Value::Array(items) => Doc::Array(items.iter().map(Doc::from).collect()),
            Value::Object(map) => Doc::Object(
                map.iter()
                    .map(|(k, v)| Member::Field(k.clone(), Doc::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Doc {
    fn from(value: Value) -> Self {
        Doc::from(&value)
    }
}

/// Render `doc` under the width budget in `options`.
pub fn pretty_print(doc: &Doc, options: &PrettyOptions) -> String {
    Printer { options }.render(doc, 0, 0).text
}

/// Convenience wrapper for plain JSON values.
pub fn pretty_print_value(value: &Value, options: &PrettyOptions) -> String {
    pretty_print(&Doc::from(value), options)
}

struct Rendered {
    text: String,
    multiline: bool,
}

impl Rendered {
    fn inline(text: String) -> Self {
        Self { text, multiline: false }
    }
}

struct Printer<'a> {
    options: &'a PrettyOptions,
}

impl Printer<'_> {
    fn indent(&self, level: usize) -> String {
        self.options.indent.repeat(level)
    }

    fn indent_width(&self, level: usize) -> usize {
        self.options.indent.chars().count() * level
    }

    fn fits(&self, used: usize, candidate: &str) -> bool {
        used + candidate.chars().count() <= self.options.max_line_width
    }

    /// `used` is the number of columns already taken on the line this value
    /// starts on.
    fn render(&self, doc: &Doc, level: usize, used: usize) -> Rendered {
        match doc {
            Doc::Null => Rendered::inline("null".to_string()),
            Doc::Bool(b) => Rendered::inline(b.to_string()),
            Doc::Number(n) => Rendered::inline(n.to_string()),
            Doc::String(s) => Rendered::inline(quote(s)),
            Doc::Comment(text) => Rendered {
                text: text.clone(),
                multiline: true,
            },
            Doc::Array(items) => self.render_array(items, level, used),
            Doc::Object(members) => self.render_object(members, level, used),
        }
    }

    fn render_array(&self, items: &[Doc], level: usize, used: usize) -> Rendered {
        if items.is_empty() {
            return Rendered::inline("[]".to_string());
        }
        let item_used = self.indent_width(level + 1);
        let rendered: Vec<(bool, Rendered)> = items
            .iter()
            .map(|item| (matches!(item, Doc::Comment(_)), self.render(item, level + 1, item_used)))
            .collect();

        if !rendered.iter().any(|(_, r)| r.multiline) {
            let parts: Vec<&str> = rendered.iter().map(|(_, r)| r.text.as_str()).collect();
            let candidate = format!("[ {} ]", parts.join(", "));
            if self.fits(used, &candidate) {
                return Rendered::inline(candidate);
            }
        }

        let lines: Vec<(bool, String)> = rendered.into_iter().map(|(c, r)| (c, r.text)).collect();
        Rendered {
            text: self.block('[', ']', &lines, level),
            multiline: true,
        }
    }

    fn render_object(&self, members: &[Member], level: usize, used: usize) -> Rendered {
        if members.is_empty() {
            return Rendered::inline("{}".to_string());
        }
        let base = self.indent_width(level + 1);
        let rendered: Vec<(bool, Rendered)> = members
            .iter()
            .map(|member| match member {
                Member::Field(key, value) => {
                    let prefix = format!("{}: ", quote(key));
                    let value = self.render(value, level + 1, base + prefix.chars().count());
                    (
                        false,
                        Rendered {
                            text: format!("{prefix}{}", value.text),
                            multiline: value.multiline,
                        },
                    )
                }
                Member::Comment(text) => (
                    true,
                    Rendered {
                        text: text.clone(),
                        multiline: true,
                    },
                ),
            })
            .collect();

        if !rendered.iter().any(|(_, r)| r.multiline) {
            let parts: Vec<&str> = rendered.iter().map(|(_, r)| r.text.as_str()).collect();
            let candidate = format!("{{ {} }}", parts.join(", "));
            if self.fits(used, &candidate) {
                return Rendered::inline(candidate);
            }
        }

        let lines: Vec<(bool, String)> = rendered.into_iter().map(|(c, r)| (c, r.text)).collect();
        Rendered {
            text: self.block('{', '}', &lines, level),
            multiline: true,
        }
    }

    /// One item per line. Items are `(is_comment, text)`; a comma follows an
    /// item only when a non-comment item comes after it.
    fn block(&self, open: char, close: char, items: &[(bool, String)], level: usize) -> String {
        let inner = self.indent(level + 1);
        let last_value = items.iter().rposition(|(is_comment, _)| !is_comment);

        let mut out = String::new();
        out.push(open);
        out.push('\n');
        for (i, (is_comment, text)) in items.iter().enumerate() {
            out.push_str(&inner);
            out.push_str(text);
            if !is_comment && Some(i) != last_value {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str(&self.indent(level));
        out.push(close);
        out
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
