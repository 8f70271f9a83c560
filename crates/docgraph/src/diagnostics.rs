//! Recoverable problems found while building or updating a graph.
//!
//! Every diagnostic is logged through `tracing` at `warn` level when it is
//! reported and kept in a buffer on the graph so hosts can inspect or drain
//! it.

use std::cell::RefCell;
use std::fmt;

use tracing::warn;

use crate::error::ReferenceError;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A document key with no matching child. The value is dropped.
    UnknownKey { path: String, key: String },
    /// A set lookup that found nothing.
    InvalidAccess { path: String, key: String },
    /// A link that could not be resolved.
    Reference { link: String, error: ReferenceError },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownKey { path, key } => {
                write!(f, "{path}: unknown key `{key}` ignored")
            }
            Diagnostic::InvalidAccess { path, key } => {
                write!(f, "{path}: no item `{key}`")
            }
            Diagnostic::Reference { link, error } => write!(f, "{link}: {error}"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "document diagnostic");
        self.entries.borrow_mut().push(diagnostic);
    }

    pub(crate) fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub(crate) fn take(&self) -> Vec<Diagnostic> {
        self.entries.take()
    }
}
