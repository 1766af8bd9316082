use tracing::debug;

use super::{Axis, Handle, LayoutTree, ResizeDirection};

/// Smallest grow factor a shrink may leave behind.
pub const MIN_GROW_FACTOR: f64 = 0.1;

const PRECISION: f64 = 10_000.0;

impl LayoutTree {
    pub fn reset_grow_factor(&mut self) {
        let nodes: Vec<_> = self.root().traverse_preorder(self.map()).collect();
        for node in nodes {
            self.info_mut(node).grow_factor = 1.0;
        }
    }

    /// Grows or shrinks the window `handle` along `axis` by `delta` of the
    /// enclosing branch's total weight. Returns whether anything changed.
    pub fn update_grow_factor(
        &mut self,
        handle: Handle,
        axis: Axis,
        direction: ResizeDirection,
        delta: f64,
    ) -> bool {
        let Some(target) = self.node_containing(handle) else {
            debug!(%handle, "resize of unknown handle");
            return false;
        };
        let orientation = axis.orientation();
        let path = self.trace(target);
        let found = path.windows(2).rev().find_map(|pair| {
            let (branch, child) = (pair[0], pair[1]);
            let siblings = self.non_empty_children(branch);
            (self.kind(branch).orientation() == Some(orientation) && siblings.len() >= 2)
                .then_some((child, siblings))
        });
        let Some((child, siblings)) = found else {
            debug!(%handle, ?axis, "cannot resize root");
            return false;
        };

        let total: f64 = siblings.iter().map(|&s| self.info(s).grow_factor).sum();
        let grow_factor = self.info(child).grow_factor + direction.sign() * total * delta;
        if grow_factor < MIN_GROW_FACTOR {
            debug!(%handle, grow_factor, "refusing to shrink below minimum");
            return false;
        }
        self.info_mut(child).grow_factor = grow_factor;
        true
    }

    /// Rescales the non-empty children of every branch so the smallest
    /// factor is 1.
    pub fn reindex_grow_factor(&mut self) {
        let branches: Vec<_> = self
            .root()
            .traverse_preorder(self.map())
            .filter(|&n| self.kind(n).is_branch())
            .collect();
        for branch in branches {
            let children = self.non_empty_children(branch);
            let min = children
                .iter()
                .map(|&c| self.info(c).grow_factor)
                .fold(f64::INFINITY, f64::min);
            if !min.is_finite() || min <= 0.0 {
                continue;
            }
            for child in children {
                let info = self.info_mut(child);
                info.grow_factor = (info.grow_factor / min * PRECISION).round() / PRECISION;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::{NodeTemplate, Orientation};

    fn h(id: isize) -> Handle { Handle(id) }

    fn side_by_side() -> LayoutTree {
        LayoutTree::from_template(&NodeTemplate::branch(Orientation::Horizontal, 1, vec![
            NodeTemplate::leaf(1),
            NodeTemplate::leaf(2),
            NodeTemplate::leaf(3),
        ]))
        .unwrap()
    }

    #[test]
    fn wrong_axis_is_a_no_op() {
        let mut tree = side_by_side();
        tree.add_handle(h(1)).unwrap();
        tree.add_handle(h(2)).unwrap();
        assert!(!tree.update_grow_factor(h(1), Axis::Y, ResizeDirection::Grow, 0.1));
    }

    #[test]
    fn lone_window_cannot_resize() {
        let mut tree = side_by_side();
        tree.add_handle(h(1)).unwrap();
        assert!(!tree.update_grow_factor(h(1), Axis::X, ResizeDirection::Grow, 0.1));
        assert!(!tree.update_grow_factor(h(9), Axis::X, ResizeDirection::Grow, 0.1));
    }

    #[test]
    fn empty_siblings_are_excluded_from_total() {
        let mut tree = side_by_side();
        tree.add_handle(h(1)).unwrap();
        tree.add_handle(h(2)).unwrap();
        assert!(tree.update_grow_factor(h(2), Axis::X, ResizeDirection::Shrink, 0.1));
        let node = tree.node_containing(h(2)).unwrap();
        assert!((tree.info(node).grow_factor - 0.8).abs() < 1e-9);
    }

    #[test]
    fn shrink_stops_at_minimum() {
        let mut tree = side_by_side();
        tree.add_handle(h(1)).unwrap();
        tree.add_handle(h(2)).unwrap();
        assert!(!tree.update_grow_factor(h(1), Axis::X, ResizeDirection::Shrink, 0.5));
        let node = tree.node_containing(h(1)).unwrap();
        assert_eq!(tree.info(node).grow_factor, 1.0);
    }

    #[test]
    fn reindex_rounds_and_skips_empty_children() {
        let mut tree = side_by_side();
        tree.add_handle(h(1)).unwrap();
        tree.add_handle(h(2)).unwrap();
        let children = tree.children(tree.root());
        tree.info_mut(children[0]).grow_factor = 3.0;
        tree.info_mut(children[1]).grow_factor = 0.9;
        tree.info_mut(children[2]).grow_factor = 0.5;
        tree.reindex_grow_factor();
        assert_eq!(tree.info(children[0]).grow_factor, 3.3333);
        assert_eq!(tree.info(children[1]).grow_factor, 1.0);
        assert_eq!(tree.info(children[2]).grow_factor, 0.5);

        tree.reset_grow_factor();
        assert!(children.iter().all(|&c| tree.info(c).grow_factor == 1.0));
    }
}
