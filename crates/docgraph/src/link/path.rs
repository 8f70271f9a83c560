//! Reference paths.
//!
//! A reference reads like a relative filesystem path: `..` climbs one level,
//! `.` and empty segments are ignored and anything else names a child. A
//! leading `/` makes the path absolute, its first segment naming the root.

use crate::constants::{CURRENT_SEGMENT, PARENT_SEGMENT, PATH_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step<'a> {
    Up,
    Down(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route<'a> {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step<'a>>,
}

/// Join a link's origin and reference.
pub(crate) fn compose(origin: &str, reference: &str) -> String {
    if origin.is_empty() || reference.starts_with(PATH_SEPARATOR) {
        return reference.to_string();
    }
    if origin.ends_with(PATH_SEPARATOR) {
        return format!("{origin}{reference}");
    }
    format!("{origin}{PATH_SEPARATOR}{reference}")
}

pub(crate) fn parse(path: &str) -> Route<'_> {
    let steps = path
        .split(PATH_SEPARATOR)
        .filter(|s| !s.is_empty() && *s != CURRENT_SEGMENT)
        .map(|s| if s == PARENT_SEGMENT { Step::Up } else { Step::Down(s) })
        .collect();
    Route {
        absolute: path.starts_with(PATH_SEPARATOR),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_joins_with_one_separator() {
        assert_eq!(compose("", "a/b"), "a/b");
        assert_eq!(compose("../../classes/", "Foo"), "../../classes/Foo");
        assert_eq!(compose("../classes", "Foo"), "../classes/Foo");
        assert_eq!(compose("../classes", "/Model/x"), "/Model/x");
    }

    #[test]
    fn parse_skips_noise() {
        let route = parse("./..//domains/./Bar/");
        assert!(!route.absolute);
        assert_eq!(route.steps, vec![Step::Up, Step::Down("domains"), Step::Down("Bar")]);
        let route = parse("/Model/classes");
        assert!(route.absolute);
        assert_eq!(route.steps, vec![Step::Down("Model"), Step::Down("classes")]);
    }
}
