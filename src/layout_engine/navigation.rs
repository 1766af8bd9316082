use tracing::trace;

use super::{Direction, Handle, LayoutError, LayoutTree};
use crate::model::tree::NodeId;

impl LayoutTree {
    /// Path from the root down to `target`, both included. Empty if `target`
    /// is not part of this tree.
    pub fn trace(&self, target: NodeId) -> Vec<NodeId> {
        if !self.map().contains(target) {
            return Vec::new();
        }
        let mut path: Vec<_> = target.ancestors(self.map()).collect();
        if path.last() != Some(&self.root()) {
            return Vec::new();
        }
        path.reverse();
        path
    }

    /// Finds the neighbor of `from` in `direction`: the adjacent sibling
    /// under the deepest branch along that axis with at least two occupied
    /// children.
    pub fn node_at_side(&self, from: Handle, direction: Direction) -> Option<NodeId> {
        let target = self.node_containing(from)?;
        let orientation = direction.orientation();
        let path = self.trace(target);
        let (branch, child) = path.windows(2).rev().find_map(|pair| {
            let (branch, child) = (pair[0], pair[1]);
            (self.kind(branch).orientation() == Some(orientation)
                && self.non_empty_children(branch).len() >= 2)
                .then_some((branch, child))
        })?;
        let index = child.index_in_parent(self.map())?;
        let next = direction.step(index, branch.child_count(self.map()));
        trace!(%from, ?direction, index, ?next, "stepping to sibling");
        self.leaf_by_priority(branch.child_at(self.map(), next?)?)
    }

    /// The handle focus would move to, or a dead end.
    pub fn handle_at_side(&self, from: Handle, direction: Direction) -> Result<Handle, LayoutError> {
        if !self.contains(from) {
            return Err(LayoutError::NotFound(from));
        }
        self.node_at_side(from, direction)
            .and_then(|node| self.kind(node).visible())
            .ok_or(LayoutError::NavigationDeadEnd { from, direction })
    }

    /// The first occupied leaf or fallback under `node`, following ascending
    /// priority.
    pub fn leaf_by_priority(&self, node: NodeId) -> Option<NodeId> {
        if !self.kind(node).is_branch() {
            return (!self.is_empty(node)).then_some(node);
        }
        self.children_by_priority(node)
            .into_iter()
            .find(|&c| !self.is_empty(c))
            .and_then(|c| self.leaf_by_priority(c))
    }
}
