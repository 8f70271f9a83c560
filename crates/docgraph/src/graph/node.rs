use std::fmt;
use std::time::Instant;

use indexmap::IndexMap;

use crate::link::{LinkSetState, LinkState};
use crate::registry::KindId;
use crate::set::SetState;
use crate::value::{NumberState, Simple, StringState};

/// Stable handle of a node inside its [`crate::Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind-specific state carried by a node.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// A composite whose data lives entirely in its children.
    #[default]
    Plain,
    Set(SetState),
    Link(LinkState),
    LinkSet(LinkSetState),
    Boolean(Simple<bool>),
    Number(NumberState),
    String(StringState),
    /// Composite of `x`, `y`, `z` number children.
    Vector,
    /// Composite of `r`, `g`, `b`, `a` number children and a `text` string.
    Color,
}

/// Payload discriminant, used to dispatch without holding a borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Plain,
    Set,
    Link,
    LinkSet,
    Boolean,
    Number,
    String,
    Vector,
    Color,
}

impl Shape {
    pub fn label(self) -> &'static str {
        match self {
            Shape::Plain => "node",
            Shape::Set => "set",
            Shape::Link => "link",
            Shape::LinkSet => "link set",
            Shape::Boolean => "boolean",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Vector => "vector",
            Shape::Color => "color",
        }
    }

    pub fn is_simple(self) -> bool {
        matches!(self, Shape::Boolean | Shape::Number | Shape::String)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Shape::Vector | Shape::Color)
    }

    pub fn is_collection(self) -> bool {
        matches!(self, Shape::Set | Shape::LinkSet)
    }

    pub fn is_link(self) -> bool {
        matches!(self, Shape::Link | Shape::LinkSet)
    }
}

impl Payload {
    pub fn shape(&self) -> Shape {
        match self {
            Payload::Plain => Shape::Plain,
            Payload::Set(_) => Shape::Set,
            Payload::Link(_) => Shape::Link,
            Payload::LinkSet(_) => Shape::LinkSet,
            Payload::Boolean(_) => Shape::Boolean,
            Payload::Number(_) => Shape::Number,
            Payload::String(_) => Shape::String,
            Payload::Vector => Shape::Vector,
            Payload::Color => Shape::Color,
        }
    }

    pub(crate) fn as_set(&self) -> Option<&SetState> {
        match self {
            Payload::Set(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_set_mut(&mut self) -> Option<&mut SetState> {
        match self {
            Payload::Set(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_link(&self) -> Option<&LinkState> {
        match self {
            Payload::Link(l) => Some(l),
            _ => None,
        }
    }

    pub(crate) fn as_link_mut(&mut self) -> Option<&mut LinkState> {
        match self {
            Payload::Link(l) => Some(l),
            _ => None,
        }
    }

    pub(crate) fn as_link_set(&self) -> Option<&LinkSetState> {
        match self {
            Payload::LinkSet(l) => Some(l),
            _ => None,
        }
    }

    pub(crate) fn as_link_set_mut(&mut self) -> Option<&mut LinkSetState> {
        match self {
            Payload::LinkSet(l) => Some(l),
            _ => None,
        }
    }

    pub(crate) fn as_boolean(&self) -> Option<&Simple<bool>> {
        match self {
            Payload::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn as_boolean_mut(&mut self) -> Option<&mut Simple<bool>> {
        match self {
            Payload::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn as_number(&self) -> Option<&NumberState> {
        match self {
            Payload::Number(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn as_number_mut(&mut self) -> Option<&mut NumberState> {
        match self {
            Payload::Number(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn as_string(&self) -> Option<&StringState> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_string_mut(&mut self) -> Option<&mut StringState> {
        match self {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }
}

/// One element of the document tree.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) kind: KindId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) dirty: bool,
    pub(crate) debug: bool,
    /// Name was generated from the item position rather than given.
    pub(crate) generated_name: bool,
    pub(crate) last_update: Option<Instant>,
    /// Links currently resolved to this node.
    pub(crate) back_refs: Vec<NodeId>,
    pub(crate) payload: Payload,
}

impl Node {
    pub(crate) fn new(name: &str, kind: KindId, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent,
            children: IndexMap::new(),
            dirty: true,
            debug: false,
            generated_name: false,
            last_update: None,
            back_refs: Vec::new(),
            payload: Payload::Plain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.get(name).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn has_generated_name(&self) -> bool {
        self.generated_name
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    pub fn back_refs(&self) -> &[NodeId] {
        &self.back_refs
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn shape(&self) -> Shape {
        self.payload.shape()
    }
}
