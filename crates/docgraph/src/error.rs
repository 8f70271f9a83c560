use thiserror::Error;

/// Registry set-up mistakes. Raised while kinds are registered or first
/// instantiated; they indicate a broken schema, not bad document data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("kind `{0}` is already registered")]
    DuplicateKind(String),

    #[error("tag `{tag}` is already used by a sub-kind of `{parent}`")]
    DuplicateTag { parent: String, tag: String },

    #[error("unknown parent kind `{0}`")]
    UnknownParent(String),

    #[error("kind `{0}` is abstract and has no builder")]
    MissingBuilder(String),
}

/// Tree-shape violations. Abort construction of the offending sub-tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructuralError {
    #[error("invalid node name `{0}`")]
    InvalidName(String),

    #[error("`{parent}` already has a child named `{name}`")]
    NameConflict { parent: String, name: String },

    #[error("graph already has root `{0}`")]
    RootExists(String),

    #[error("unknown kind `{0}`")]
    UnknownKind(String),

    #[error("tag `{tag}` is not a registered sub-kind of `{base}`")]
    UnknownTag { base: String, tag: String },

    #[error("node #{0} does not exist")]
    NoSuchNode(usize),

    #[error("`{path}` is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    #[error("`{path}` is {actual} and cannot take {requested} items")]
    ShapeMismatch {
        path: String,
        actual: &'static str,
        requested: &'static str,
    },

    #[error("`{path}` has no entry `{key}`")]
    MissingEntry { path: String, key: String },
}

/// A rejected assignment. The node keeps its previous value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{value} is outside [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("`{value}` is not one of {valid:?}")]
    InvalidValue { value: String, valid: Vec<String> },

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

/// A link path that did not lead to a usable node. Recoverable: the link stays
/// unresolved and is retried on the next update.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("`{reference}`: no `{segment}` under `{at}`")]
    Unresolved {
        reference: String,
        segment: String,
        at: String,
    },

    #[error("`{reference}` climbs above the root")]
    AboveRoot { reference: String },

    #[error("`{reference}` resolved to `{target}`, which is not a {expected}")]
    WrongTargetKind {
        reference: String,
        target: String,
        expected: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("document text: {0}")]
    Parse(String),
}

impl From<docgraph_jsonc::ParseError> for GraphError {
    fn from(e: docgraph_jsonc::ParseError) -> Self {
        GraphError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Short JSON type description used in `TypeMismatch` messages.
pub(crate) fn describe(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(a) => format!("array of {}", a.len()),
        Value::Object(_) => "object".to_string(),
    }
}
