//! Text layer for docgraph documents.
//!
//! Documents are authored as JSON with comments: `//` line comments,
//! `/* */` block comments and trailing commas before `}` or `]` are all
//! accepted. [`parse`] strips those extensions and hands the rest to
//! `serde_json`. [`pretty_print`] goes the other way and lays a value out
//! under a line-width budget, keeping small containers on one line.
//!
//! # Example
//!
//! ```
//! use docgraph_jsonc::{parse, pretty_print_value, PrettyOptions};
//!
//! let value = parse(r#"{
//!     // line comment
//!     "a": 1, /* block */ "b": [2, 3,],
//! }"#).unwrap();
//!
//! let text = pretty_print_value(&value, &PrettyOptions::default());
//! assert_eq!(text, r#"{ "a": 1, "b": [ 2, 3 ] }"#);
//! ```

pub mod constants;
pub mod parse;
pub mod pretty;

pub use parse::{parse, strip_extensions, ParseError};
pub use pretty::{pretty_print, pretty_print_value, Doc, Member, PrettyOptions};
