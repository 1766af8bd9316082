use tracing::{debug, trace};

use super::{Handle, LayoutTree, NodeKind};
use crate::model::tree::NodeId;

impl LayoutTree {
    /// Removes `handle` wherever it is. Returns whether anything was removed.
    pub fn remove_handle(&mut self, handle: Handle) -> bool {
        let removed = self.remove_handle_at(self.root(), handle);
        if !removed {
            trace!(%handle, "handle not in tree");
        }
        removed
    }

    fn remove_handle_at(&mut self, node: NodeId, handle: Handle) -> bool {
        if self.kind(node).is_branch() {
            for child in self.children(node) {
                if self.remove_handle_at(child, handle) {
                    if self.can_prune(node, child) {
                        trace!(?child, "pruning empty temporal node");
                        child.detach(&mut self.tree).remove();
                    }
                    return true;
                }
            }
            return false;
        }

        match &mut self.info_mut(node).kind {
            NodeKind::Leaf { handle: slot } if *slot == Some(handle) => {
                *slot = None;
                true
            }
            NodeKind::Fallback { handles, active } => {
                let Some(pos) = handles.iter().position(|&h| h == handle) else {
                    return false;
                };
                handles.remove(pos);
                if *active == Some(handle) {
                    *active = handles.first().copied();
                }
                true
            }
            _ => false,
        }
    }

    /// An empty temporal leaf or fallback goes away, unless it is the only
    /// child left.
    fn can_prune(&self, parent: NodeId, child: NodeId) -> bool {
        let info = self.info(child);
        info.is_temporal()
            && !info.kind.is_branch()
            && self.is_empty(child)
            && parent.child_count(self.map()) > 1
    }

    /// Empties the whole tree and drops temporal structure. Returns the
    /// handles that were held, depth first in ascending priority.
    pub fn clear(&mut self) -> Vec<Handle> {
        let mut handles = Vec::new();
        self.clear_at(self.root(), &mut handles);
        handles
    }

    fn clear_at(&mut self, node: NodeId, out: &mut Vec<Handle>) {
        match &mut self.info_mut(node).kind {
            NodeKind::Leaf { handle } => out.extend(handle.take()),
            NodeKind::Fallback { handles, active } => {
                out.append(handles);
                *active = None;
            }
            NodeKind::Branch(_) => {
                for child in self.children_by_priority(node) {
                    self.clear_at(child, out);
                }
                let mut children = self.children(node);
                if children.iter().all(|&c| self.info(c).is_temporal()) {
                    children.remove(0);
                }
                for child in children {
                    if self.info(child).is_temporal() {
                        child.detach(&mut self.tree).remove();
                    }
                }
            }
        }
    }

    /// Clears the tree and places every handle again from scratch. Returns
    /// the handles that no longer fit.
    pub fn reindex(&mut self) -> Vec<Handle> {
        let handles = self.clear();
        let count = handles.len();
        let overflow: Vec<_> =
            handles.into_iter().filter(|&h| self.add_handle(h).is_err()).collect();
        debug!(count, overflow = overflow.len(), "reindexed tree");
        overflow
    }
}
