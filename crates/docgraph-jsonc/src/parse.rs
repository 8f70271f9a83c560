//! Lenient JSON-with-comments parsing.
//!
//! The input is rewritten in two string-aware passes before it reaches
//! `serde_json`:
//!
//! 1. comments are blanked out (newlines inside them are kept so that
//!    `serde_json` error positions still point at the right line);
//! 2. commas whose next significant character is `}` or `]` are dropped.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unterminated block comment starting at line {line}")]
    UnterminatedComment { line: usize },

    #[error("unterminated string starting at line {line}")]
    UnterminatedString { line: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Parse a JSONC document into a JSON value.
///
/// # Example
///
/// ```
/// use docgraph_jsonc::parse;
/// use serde_json::json;
///
/// let v = parse("[1, 2, /* three */ 3,]").unwrap();
/// assert_eq!(v, json!([1, 2, 3]));
///
/// // Comment markers inside strings are data.
/// let v = parse(r#"{"url": "http://example.com"}"#).unwrap();
/// assert_eq!(v["url"], "http://example.com");
/// ```
pub fn parse(text: &str) -> Result<Value, ParseError> {
    let plain = strip_extensions(text)?;
    Ok(serde_json::from_str(&plain)?)
}

/// Remove comments and trailing commas, leaving plain JSON text.
pub fn strip_extensions(text: &str) -> Result<String, ParseError> {
    let without_comments = strip_comments(text)?;
    Ok(strip_trailing_commas(&without_comments))
}

fn strip_comments(text: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                let start = line;
                out.push(ch);
                copy_string(&mut chars, &mut out, &mut line)
                    .ok_or(ParseError::UnterminatedString { line: start })?;
            }
            '/' if chars.peek() == Some(&'/') => {
                chars.next();
                // Line comment: drop everything up to (not including) the newline.
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let start = line;
                chars.next();
                let mut closed = false;
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        closed = true;
                        break;
                    }
                    prev = next;
                }
                if !closed {
                    return Err(ParseError::UnterminatedComment { line: start });
                }
                out.push(' ');
            }
            '\n' => {
                line += 1;
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Copy the rest of a string literal (opening quote already consumed).
/// Returns `None` when the input ends before the closing quote.
fn copy_string<I>(chars: &mut std::iter::Peekable<I>, out: &mut String, line: &mut usize) -> Option<()>
where
    I: Iterator<Item = char>,
{
    while let Some(ch) = chars.next() {
        out.push(ch);
        match ch {
            '\\' => out.push(chars.next()?),
            '"' => return Some(()),
            '\n' => *line += 1,
            _ => {}
        }
    }
    None
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            if ch == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
            out.push(ch);
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(ch);
            }
        } else {
            out.push(ch);
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_comments_are_removed() {
        let v = parse("{\n  // comment\n  \"a\": 1 // trailing\n}").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn block_comments_are_removed() {
        let v = parse("/* head */ {\"a\": /* inline */ 1}").unwrap();
        assert_eq!(v, json!({"a": 1}));
    }

    #[test]
    fn multiline_block_comment_keeps_line_numbers() {
        let text = "/*\n\n*/ {\"a\": }";
        let err = parse(text).unwrap_err();
        match err {
            ParseError::Json(e) => assert_eq!(e.line(), 3),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn trailing_commas_are_removed() {
        let v = parse("{\"a\": [1, 2,], \"b\": {\"c\": 3,},}").unwrap();
        assert_eq!(v, json!({"a": [1, 2], "b": {"c": 3}}));
    }

    #[test]
    fn trailing_comma_before_comment_and_bracket() {
        let v = parse("[1, // last\n]").unwrap();
        assert_eq!(v, json!([1]));
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let v = parse(r#"{"a": "// not a comment", "b": "/* nor */ this", "c": ",]"}"#).unwrap();
        assert_eq!(v["a"], "// not a comment");
        assert_eq!(v["b"], "/* nor */ this");
        assert_eq!(v["c"], ",]");
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let v = parse(r#"{"a": "say \"hi\" // still string"}"#).unwrap();
        assert_eq!(v["a"], "say \"hi\" // still string");
    }

    #[test]
    fn unterminated_block_comment() {
        let err = parse("{\n\"a\": 1 /* open").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { line: 2 }));
    }

    #[test]
    fn unterminated_string() {
        let err = parse("{\"a\": \"open}").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn plain_json_is_untouched() {
        let text = r#"{"a":[1,2,{"b":null}],"c":"d"}"#;
        assert_eq!(strip_extensions(text).unwrap(), text);
    }
}
