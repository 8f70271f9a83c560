//! Node kinds and the registry that links them into a hierarchy.
//!
//! A kind has a display name, a short tag used as the `type` discriminator in
//! documents, an optional parent kind and an optional builder. Instantiating
//! a kind runs the builders of its whole ancestor chain, root first, so a
//! sub-kind only declares what it adds. Kinds without a builder are abstract.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{ConfigurationError, Result, StructuralError};
use crate::graph::{Graph, NodeId};

/// Declares the children and payload of a freshly created node.
pub type Builder = Arc<dyn Fn(&mut Graph, NodeId) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(usize);

pub struct NodeKind {
    id: KindId,
    name: String,
    tag: String,
    parent: Option<KindId>,
    /// Direct sub-kinds by tag.
    children: IndexMap<String, KindId>,
    builder: Option<Builder>,
}

impl NodeKind {
    pub fn id(&self) -> KindId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn parent(&self) -> Option<KindId> {
        self.parent
    }

    pub fn sub_kinds(&self) -> impl Iterator<Item = KindId> + '_ {
        self.children.values().copied()
    }

    pub fn is_abstract(&self) -> bool {
        self.builder.is_none()
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKind")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("parent", &self.parent)
            .field("sub_kinds", &self.children.keys().collect::<Vec<_>>())
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

/// Process-wide kind metadata. Populate it once at start-up, then share it
/// with every [`Graph`] through an `Arc`.
#[derive(Debug)]
pub struct TypeRegistry {
    kinds: Vec<NodeKind>,
    by_name: HashMap<String, KindId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry holding the built-in kinds.
    pub fn new() -> Self {
        let mut registry = Self {
            kinds: Vec::new(),
            by_name: HashMap::new(),
        };
        crate::graph::builtins::install(&mut registry);
        registry
    }

    /// Register a concrete kind. `tag` defaults to the lower-cased name.
    pub fn register<F>(
        &mut self,
        name: &str,
        tag: Option<&str>,
        parent: Option<&str>,
        builder: F,
    ) -> std::result::Result<KindId, ConfigurationError>
    where
        F: Fn(&mut Graph, NodeId) -> Result<()> + Send + Sync + 'static,
    {
        self.add(name, tag, parent, Some(Arc::new(builder)))
    }

    /// Register a kind that can be inherited from but not instantiated.
    pub fn register_abstract(
        &mut self,
        name: &str,
        tag: Option<&str>,
        parent: Option<&str>,
    ) -> std::result::Result<KindId, ConfigurationError> {
        self.add(name, tag, parent, None)
    }

    fn add(
        &mut self,
        name: &str,
        tag: Option<&str>,
        parent: Option<&str>,
        builder: Option<Builder>,
    ) -> std::result::Result<KindId, ConfigurationError> {
        if self.by_name.contains_key(name) {
            return Err(ConfigurationError::DuplicateKind(name.to_string()));
        }
        let tag = tag.map(str::to_string).unwrap_or_else(|| name.to_lowercase());
        let parent = match parent {
            Some(parent_name) => {
                let pid = self
                    .lookup(parent_name)
                    .ok_or_else(|| ConfigurationError::UnknownParent(parent_name.to_string()))?;
                if self.kinds[pid.0].children.contains_key(&tag) {
                    return Err(ConfigurationError::DuplicateTag {
                        parent: parent_name.to_string(),
                        tag,
                    });
                }
                Some(pid)
            }
            None => None,
        };

        Ok(self.insert(name, tag, parent, builder))
    }

    /// Append a kind without checking names or tags.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        tag: String,
        parent: Option<KindId>,
        builder: Option<Builder>,
    ) -> KindId {
        let id = KindId(self.kinds.len());
        if let Some(pid) = parent {
            self.kinds[pid.0].children.insert(tag.clone(), id);
        }
        self.kinds.push(NodeKind {
            id,
            name: name.to_string(),
            tag,
            parent,
            children: IndexMap::new(),
            builder,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Metadata for `id`. Ids are only minted by this registry.
    pub fn kind(&self, id: KindId) -> &NodeKind {
        &self.kinds[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn require(&self, name: &str) -> std::result::Result<KindId, StructuralError> {
        self.lookup(name)
            .ok_or_else(|| StructuralError::UnknownKind(name.to_string()))
    }

    /// `kind` itself followed by its ancestors, nearest first.
    pub fn ancestors(&self, kind: KindId) -> impl Iterator<Item = KindId> + '_ {
        std::iter::successors(Some(kind), move |k| self.kinds[k.0].parent)
    }

    /// True when `kind` or one of its ancestors is named `target`.
    pub fn is_kind_of(&self, kind: KindId, target: &str) -> bool {
        self.ancestors(kind).any(|k| self.kinds[k.0].name == target)
    }

    /// Resolve a `type` tag against `base`: the base's own tag, then its
    /// direct sub-kinds, then deeper descendants breadth-first.
    pub fn resolve_tag(&self, base: KindId, tag: &str) -> Option<KindId> {
        if self.kinds[base.0].tag == tag {
            return Some(base);
        }
        let mut frontier = vec![base];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for k in frontier {
                let kind = &self.kinds[k.0];
                if let Some(found) = kind.children.get(tag) {
                    return Some(*found);
                }
                next.extend(kind.children.values().copied());
            }
            frontier = next;
        }
        None
    }

    /// Builders to run for a new node of `kind`, root-most first.
    pub(crate) fn builder_chain(
        &self,
        kind: KindId,
    ) -> std::result::Result<Vec<Builder>, ConfigurationError> {
        let concrete = &self.kinds[kind.0];
        if concrete.builder.is_none() {
            return Err(ConfigurationError::MissingBuilder(concrete.name.clone()));
        }
        let mut chain: Vec<Builder> = self
            .ancestors(kind)
            .filter_map(|k| self.kinds[k.0].builder.clone())
            .collect();
        chain.reverse();
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::kinds;

    fn noop(_: &mut Graph, _: NodeId) -> Result<()> {
        Ok(())
    }

    #[test]
    fn builtins_are_registered() {
        let r = TypeRegistry::new();
        for name in [
            kinds::NODE,
            kinds::NODE_SET,
            kinds::NODE_LINK,
            kinds::NODE_LINK_SET,
            kinds::SIMPLE,
            kinds::BOOLEAN,
            kinds::NUMBER,
            kinds::STRING,
            kinds::COMPLEX,
            kinds::VECTOR,
            kinds::COLOR,
        ] {
            assert!(r.lookup(name).is_some(), "{name}");
        }
        let simple = r.lookup(kinds::SIMPLE).unwrap();
        assert!(r.kind(simple).is_abstract());
    }

    #[test]
    fn tag_defaults_to_lowercase_name() {
        let mut r = TypeRegistry::new();
        let id = r.register("Domain", None, Some("Node"), noop).unwrap();
        assert_eq!(r.kind(id).tag(), "domain");
        let id = r.register("Interface", Some("iface"), Some("Node"), noop).unwrap();
        assert_eq!(r.kind(id).tag(), "iface");
    }

    #[test]
    fn is_kind_of_walks_ancestors() {
        let mut r = TypeRegistry::new();
        r.register("Class", None, Some("Node"), noop).unwrap();
        let iface = r.register("Interface", None, Some("Class"), noop).unwrap();
        assert!(r.is_kind_of(iface, "Interface"));
        assert!(r.is_kind_of(iface, "Class"));
        assert!(r.is_kind_of(iface, "Node"));
        assert!(!r.is_kind_of(iface, "NodeSet"));
    }

    #[test]
    fn duplicate_sibling_tag_is_rejected() {
        let mut r = TypeRegistry::new();
        r.register("Entry", None, Some("Node"), noop).unwrap();
        r.register("Alpha", Some("a"), Some("Entry"), noop).unwrap();
        let err = r.register("Other", Some("a"), Some("Entry"), noop).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateTag {
                parent: "Entry".to_string(),
                tag: "a".to_string()
            }
        );
        // Same tag under a different parent is fine.
        r.register("Beta", Some("a"), Some("Alpha"), noop).unwrap();
    }

    #[test]
    fn duplicate_name_and_unknown_parent() {
        let mut r = TypeRegistry::new();
        assert_eq!(
            r.register("Node", Some("n2"), None, noop).unwrap_err(),
            ConfigurationError::DuplicateKind("Node".to_string())
        );
        assert_eq!(
            r.register("Orphan", None, Some("Missing"), noop).unwrap_err(),
            ConfigurationError::UnknownParent("Missing".to_string())
        );
    }

    #[test]
    fn resolve_tag_searches_descendants() {
        let mut r = TypeRegistry::new();
        let entry = r.register("Entry", None, Some("Node"), noop).unwrap();
        let alpha = r.register("Alpha", None, Some("Entry"), noop).unwrap();
        let deep = r.register("Deep", None, Some("Alpha"), noop).unwrap();
        assert_eq!(r.resolve_tag(entry, "entry"), Some(entry));
        assert_eq!(r.resolve_tag(entry, "alpha"), Some(alpha));
        assert_eq!(r.resolve_tag(entry, "deep"), Some(deep));
        assert_eq!(r.resolve_tag(alpha, "entry"), None);
        assert_eq!(r.resolve_tag(entry, "missing"), None);
    }

    #[test]
    fn abstract_kinds_have_no_builder_chain() {
        let mut r = TypeRegistry::new();
        let shape = r.register_abstract("Shape", None, Some("Node")).unwrap();
        assert_eq!(
            r.builder_chain(shape).err(),
            Some(ConfigurationError::MissingBuilder("Shape".to_string()))
        );
        let circle = r.register("Circle", None, Some("Shape"), noop).unwrap();
        // Node's builder plus Circle's own.
        assert_eq!(r.builder_chain(circle).unwrap().len(), 2);
    }
}
