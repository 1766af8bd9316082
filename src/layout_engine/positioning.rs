use serde::{Deserialize, Serialize};

use super::{Handle, LayoutTree, NodeKind, Orientation};
use crate::common::config::GapSettings;
use crate::common::geometry::Rect;
use crate::model::tree::NodeId;

/// A window and the rectangle it should occupy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub handle: Handle,
    pub rect: Rect,
    /// Weight of the slot among its siblings, for flex-style containers.
    pub grow_factor: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    pub placements: Vec<Placement>,
    /// Fallback members that are covered by their stack's active window.
    pub hidden: Vec<Handle>,
}

impl LayoutTree {
    /// Computes where every visible window goes inside `screen`.
    pub fn calculate_layout(&self, screen: Rect, gaps: &GapSettings) -> Arrangement {
        let area = screen.inset(gaps.outer.top, gaps.outer.left, gaps.outer.bottom, gaps.outer.right);
        let mut out = Arrangement::default();
        self.arrange(self.root(), area, gaps, &mut out);
        out
    }

    fn arrange(&self, node: NodeId, rect: Rect, gaps: &GapSettings, out: &mut Arrangement) {
        let info = self.info(node);
        match &info.kind {
            NodeKind::Leaf { handle: None } => {}
            NodeKind::Leaf { handle: Some(handle) } => out.placements.push(Placement {
                handle: *handle,
                rect,
                grow_factor: info.grow_factor,
            }),
            NodeKind::Fallback { handles, active } => {
                if let Some(active) = active {
                    out.placements.push(Placement {
                        handle: *active,
                        rect,
                        grow_factor: info.grow_factor,
                    });
                }
                out.hidden.extend(handles.iter().filter(|&h| Some(*h) != *active));
            }
            NodeKind::Branch(orientation) => {
                let children = self.non_empty_children(node);
                let weights: Vec<f64> =
                    children.iter().map(|&c| self.info(c).grow_factor).collect();
                let gap = match orientation {
                    Orientation::Horizontal => gaps.inner.horizontal,
                    Orientation::Vertical => gaps.inner.vertical,
                };
                for (child, rect) in children.into_iter().zip(rect.split(*orientation, &weights, gap))
                {
                    self.arrange(child, rect, gaps, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::{InnerGaps, OuterGaps};
    use crate::layout_engine::NodeTemplate;

    fn h(id: isize) -> Handle { Handle(id) }

    fn rect_of(arrangement: &Arrangement, handle: Handle) -> Rect {
        arrangement.placements.iter().find(|p| p.handle == handle).unwrap().rect
    }

    #[test]
    fn single_window_fills_screen() {
        let mut tree = LayoutTree::from_template(&NodeTemplate::fibonacci()).unwrap();
        tree.add_handle(h(1)).unwrap();
        let screen = Rect::from_size(0, 0, 1000, 800);
        let arrangement = tree.calculate_layout(screen, &GapSettings::default());
        assert_eq!(arrangement.placements, vec![Placement {
            handle: h(1),
            rect: screen,
            grow_factor: 1.0,
        }]);
    }

    #[test]
    fn fibonacci_spiral() {
        let mut tree = LayoutTree::from_template(&NodeTemplate::fibonacci()).unwrap();
        for id in 1..=5 {
            tree.add_handle(h(id)).unwrap();
        }
        let arrangement = tree.calculate_layout(Rect::from_size(0, 0, 1000, 800), &GapSettings::default());
        assert_eq!(rect_of(&arrangement, h(1)), Rect::new(0, 0, 500, 800));
        assert_eq!(rect_of(&arrangement, h(2)), Rect::new(500, 0, 1000, 400));
        assert_eq!(rect_of(&arrangement, h(3)), Rect::new(500, 400, 750, 800));
        assert_eq!(rect_of(&arrangement, h(5)), Rect::new(750, 400, 1000, 800));
        assert_eq!(arrangement.hidden, vec![h(4)]);
        assert_eq!(arrangement.placements.len(), 4);
    }

    #[test]
    fn gaps_and_grow_factors() {
        let mut tree = LayoutTree::from_template(&NodeTemplate::fibonacci()).unwrap();
        tree.add_handle(h(1)).unwrap();
        tree.add_handle(h(2)).unwrap();
        let first = tree.node_containing(h(1)).unwrap();
        tree.info_mut(first).grow_factor = 3.0;
        let gaps = GapSettings {
            outer: OuterGaps { top: 10, left: 10, bottom: 10, right: 10 },
            inner: InnerGaps { horizontal: 20, vertical: 0 },
        };
        let arrangement = tree.calculate_layout(Rect::from_size(0, 0, 420, 220), &gaps);
        assert_eq!(rect_of(&arrangement, h(1)), Rect::new(10, 10, 295, 210));
        assert_eq!(rect_of(&arrangement, h(2)), Rect::new(315, 10, 410, 210));
    }
}
