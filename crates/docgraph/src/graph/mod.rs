//! The node arena.
//!
//! [`Graph`] owns every node of one document tree in a flat `Vec`, addressed
//! by [`NodeId`]. Parent, children and link back-references are all ids, so
//! the tree can be mutated through `&mut Graph` without shared ownership.
//! Removed slots are never reused; a stale id yields
//! [`StructuralError::NoSuchNode`].

pub(crate) mod builtins;
mod codec;
mod node;
mod update;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::constants::{CURRENT_SEGMENT, PARENT_SEGMENT, PATH_SEPARATOR, RESERVED_KEYS};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{GraphError, Result, StructuralError};
use crate::registry::{KindId, TypeRegistry};

pub use codec::SerializeOptions;
pub use node::{Node, NodeId, Payload, Shape};

/// One document tree plus the registry its kinds come from.
#[derive(Debug)]
pub struct Graph {
    registry: Arc<TypeRegistry>,
    nodes: Vec<Option<Node>>,
    root: Option<NodeId>,
    pub(crate) diagnostics: Diagnostics,
}

impl Graph {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            nodes: Vec::new(),
            root: None,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Create a node of the kind registered as `kind`.
    ///
    /// The node is attached under `parent` (or becomes the root), its kind's
    /// builders run root-most first, and `raw` is deserialized into it when
    /// given. If any step fails the partially built sub-tree is removed again.
    pub fn construct(
        &mut self,
        kind: &str,
        name: &str,
        parent: Option<NodeId>,
        raw: Option<&Value>,
    ) -> Result<NodeId> {
        let kind = self.registry.require(kind)?;
        self.construct_kind(kind, name, parent, raw)
    }

    pub(crate) fn construct_kind(
        &mut self,
        kind: KindId,
        name: &str,
        parent: Option<NodeId>,
        raw: Option<&Value>,
    ) -> Result<NodeId> {
        validate_name(name)?;
        let registry = Arc::clone(&self.registry);
        let chain = registry.builder_chain(kind)?;

        match parent {
            Some(pid) => {
                if self.node(pid)?.children.contains_key(name) {
                    return Err(StructuralError::NameConflict {
                        parent: self.path_or_id(pid),
                        name: name.to_string(),
                    }
                    .into());
                }
            }
            None => {
                if let Some(root) = self.root {
                    return Err(StructuralError::RootExists(self.path_or_id(root)).into());
                }
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(name, kind, parent)));
        match parent {
            Some(pid) => {
                self.node_mut(pid)?.children.insert(name.to_string(), id);
                self.mark_dirty(pid);
            }
            None => self.root = Some(id),
        }
        debug!(node = %id, kind = registry.kind(kind).name(), name, "constructing node");

        let mut built = chain.iter().try_for_each(|builder| (**builder)(self, id));
        if let (true, Some(raw)) = (built.is_ok(), raw) {
            built = self.deserialize(id, raw);
        }
        if let Err(e) = built {
            debug!(node = %id, error = %e, "construction failed, discarding");
            self.discard(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Plain composite child of kind `kind`, for use inside builders.
    pub fn add_node(&mut self, parent: NodeId, name: &str, kind: &str) -> Result<NodeId> {
        self.construct(kind, name, Some(parent), None)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.try_node(id)
            .ok_or_else(|| StructuralError::NoSuchNode(id.0).into())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.try_node_mut(id)
            .ok_or_else(|| StructuralError::NoSuchNode(id.0).into())
    }

    pub(crate) fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn try_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.try_node(id).is_some()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.children().collect())
    }

    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.try_node(id).and_then(|n| n.child(name))
    }

    pub fn shape(&self, id: NodeId) -> Result<Shape> {
        Ok(self.node(id)?.shape())
    }

    /// Slash-separated names from the root down, e.g. `/Model/classes/Foo`.
    pub fn path(&self, id: NodeId) -> Result<String> {
        let mut names = Vec::new();
        let mut at = Some(id);
        while let Some(current) = at {
            let node = self.node(current)?;
            names.push(node.name.as_str());
            at = node.parent;
        }
        names.reverse();
        let mut path = String::new();
        for name in names {
            path.push(PATH_SEPARATOR);
            path.push_str(name);
        }
        Ok(path)
    }

    pub(crate) fn path_or_id(&self, id: NodeId) -> String {
        self.path(id).unwrap_or_else(|_| id.to_string())
    }

    /// Look up a node by absolute path. The first segment names the root.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut segments = path
            .split(PATH_SEPARATOR)
            .filter(|s| !s.is_empty() && *s != CURRENT_SEGMENT);
        let root = self.root?;
        if segments.next()? != self.try_node(root)?.name {
            return None;
        }
        segments.try_fold(root, |at, segment| {
            if segment == PARENT_SEGMENT {
                self.try_node(at)?.parent
            } else {
                self.child(at, segment)
            }
        })
    }

    /// Nearest proper ancestor whose kind is `kind` or derives from it.
    pub fn ancestor_of_kind(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        let mut at = self.try_node(id)?.parent;
        while let Some(current) = at {
            let node = self.try_node(current)?;
            if self.registry.is_kind_of(node.kind, kind) {
                return Some(current);
            }
            at = node.parent;
        }
        None
    }

    pub fn is_kind_of(&self, id: NodeId, kind: &str) -> Result<bool> {
        Ok(self.registry.is_kind_of(self.node(id)?.kind, kind))
    }

    pub fn kind_name(&self, id: NodeId) -> Result<&str> {
        Ok(self.registry.kind(self.node(id)?.kind).name())
    }

    /// Depth-first pre-order traversal of the sub-tree rooted at `id`.
    pub fn walk<F>(&self, id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId, &Node),
    {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            visit(current, node);
            let mark = stack.len();
            stack.extend(node.children());
            stack[mark..].reverse();
        }
        Ok(())
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Remove `id` and its sub-tree.
    ///
    /// Links inside the sub-tree are unregistered from their targets. Links
    /// outside it that pointed into it lose their target and are dirtied, as
    /// is the former parent.
    pub(crate) fn discard(&mut self, id: NodeId) {
        let Some(top) = self.try_node(id) else {
            return;
        };
        let parent = top.parent;
        let name = top.name.clone();

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.try_node(current) {
                removed.push(current);
                stack.extend(node.children());
            }
        }
        let removed_set: HashSet<NodeId> = removed.iter().copied().collect();

        let mut orphaned = Vec::new();
        for current in &removed {
            let Some(node) = self.nodes[current.0].take() else {
                continue;
            };
            if let Some(target) = node.payload.as_link().and_then(|l| l.target) {
                if !removed_set.contains(&target) {
                    if let Some(t) = self.nodes.get_mut(target.0).and_then(Option::as_mut) {
                        t.back_refs.retain(|l| l != current);
                    }
                }
            }
            orphaned.extend(node.back_refs.into_iter().filter(|l| !removed_set.contains(l)));
        }

        match parent {
            Some(pid) => {
                if let Some(p) = self.nodes.get_mut(pid.0).and_then(Option::as_mut) {
                    p.children.shift_remove(&name);
                }
                self.mark_dirty(pid);
            }
            None => self.root = None,
        }
        for link in orphaned {
            if let Some(state) = self
                .nodes
                .get_mut(link.0)
                .and_then(Option::as_mut)
                .and_then(|n| n.payload.as_link_mut())
            {
                state.target = None;
            }
            self.mark_dirty(link);
        }
        debug!(node = %id, removed = removed.len(), "discarded sub-tree");
    }

    pub(crate) fn wrong_kind(&self, id: NodeId, expected: &'static str) -> GraphError {
        StructuralError::WrongKind {
            path: self.path_or_id(id),
            expected,
        }
        .into()
    }

    /// Borrow the payload of `id` as `T`, or fail with `WrongKind`.
    pub(crate) fn payload<T>(
        &self,
        id: NodeId,
        expected: &'static str,
        pick: fn(&Payload) -> Option<&T>,
    ) -> Result<&T> {
        pick(&self.node(id)?.payload).ok_or_else(|| self.wrong_kind(id, expected))
    }

    /// Mutable counterpart of [`Graph::payload`]. `pick` must select the
    /// payload variant of `shape`.
    pub(crate) fn payload_mut<T>(
        &mut self,
        id: NodeId,
        shape: Shape,
        pick: fn(&mut Payload) -> Option<&mut T>,
    ) -> Result<&mut T> {
        if self.node(id)?.shape() != shape {
            return Err(self.wrong_kind(id, shape.label()));
        }
        pick(&mut self.node_mut(id)?.payload).ok_or_else(|| {
            StructuralError::WrongKind {
                path: id.to_string(),
                expected: shape.label(),
            }
            .into()
        })
    }
}

fn validate_name(name: &str) -> std::result::Result<(), StructuralError> {
    let invalid = name.is_empty()
        || name == CURRENT_SEGMENT
        || name == PARENT_SEGMENT
        || name.contains(PATH_SEPARATOR)
        || RESERVED_KEYS.contains(&name);
    if invalid {
        return Err(StructuralError::InvalidName(name.to_string()));
    }
    Ok(())
}
