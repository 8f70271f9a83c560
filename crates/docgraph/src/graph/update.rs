//! Dirty propagation and the update pass.

use std::collections::HashSet;
use std::time::Instant;

use tracing::trace;

use crate::error::Result;
use crate::graph::{Graph, NodeId, Shape};

impl Graph {
    /// Mark `id` dirty or clean.
    ///
    /// Dirtying reaches every ancestor and every link resolved to `id` (and,
    /// through those links, their ancestors and referrers) before this
    /// returns. Cleaning only touches `id` itself.
    pub fn set_dirty(&mut self, id: NodeId, dirty: bool) -> Result<()> {
        if dirty {
            self.node(id)?;
            self.mark_dirty(id);
        } else {
            self.node_mut(id)?.dirty = false;
        }
        Ok(())
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.dirty)
    }

    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        let mut visited = HashSet::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(current.0).and_then(Option::as_mut) else {
                continue;
            };
            node.dirty = true;
            if node.debug {
                trace!(node = %current, name = %node.name, "marked dirty");
            }
            pending.extend(node.parent);
            pending.extend(node.back_refs.iter().copied());
        }
    }

    /// Bring the sub-tree at `id` up to date and report whether it is clean.
    ///
    /// A clean node returns `true` at once unless `forced`. Otherwise every
    /// child is updated, including after one of them stays dirty, and links
    /// re-resolve their reference. The node ends clean only when all of that
    /// succeeded.
    pub fn update(&mut self, id: NodeId, forced: bool) -> Result<bool> {
        let node = self.node(id)?;
        if !node.dirty && !forced {
            return Ok(true);
        }
        let children: Vec<NodeId> = node.children().collect();

        let mut clean = true;
        for child in children {
            clean &= self.update(child, forced)?;
        }
        if self.shape(id)? == Shape::Link {
            clean &= self.resolve_link(id)?;
        }

        let node = self.node_mut(id)?;
        node.dirty = !clean;
        node.last_update = Some(Instant::now());
        if node.debug {
            trace!(node = %id, name = %node.name, clean, "updated");
        }
        Ok(clean)
    }
}
