//! Names and keys with fixed meaning in documents and paths.

/// Object keys never treated as child data during deserialization.
pub const RESERVED_KEYS: [&str; 3] = [NAME_KEY, DEBUG_KEY, TYPE_KEY];

/// Explicit item name inside an indexed set element.
pub const NAME_KEY: &str = "name";

/// Enables per-node trace output when `true`.
pub const DEBUG_KEY: &str = "debug";

/// Polymorphic item discriminator.
pub const TYPE_KEY: &str = "type";

pub const PATH_SEPARATOR: char = '/';
pub const PARENT_SEGMENT: &str = "..";
pub const CURRENT_SEGMENT: &str = ".";

/// Keys of the object form of a single link.
pub const REFERENCE_KEY: &str = "reference";
pub const STRENGTH_KEY: &str = "strength";

/// Built-in kind names, registered by [`crate::TypeRegistry::new`].
pub mod kinds {
    pub const NODE: &str = "Node";
    pub const NODE_SET: &str = "NodeSet";
    pub const NODE_LINK: &str = "NodeLink";
    pub const NODE_LINK_SET: &str = "NodeLinkSet";
    pub const SIMPLE: &str = "Simple";
    pub const BOOLEAN: &str = "Boolean";
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
    pub const COMPLEX: &str = "Complex";
    pub const VECTOR: &str = "Vector";
    pub const COLOR: &str = "Color";
}

pub const VECTOR_COMPONENTS: [&str; 3] = ["x", "y", "z"];
pub const COLOR_CHANNELS: [&str; 4] = ["r", "g", "b", "a"];
pub const COLOR_TEXT: &str = "text";
