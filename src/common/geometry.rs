//! Integer screen rectangles handed to the positioning collaborator.

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;

/// A rectangle in screen coordinates. `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Rect { left, top, right, bottom }
    }

    pub const fn from_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Rect {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 { (self.right - self.left).max(0) }

    pub fn height(&self) -> i32 { (self.bottom - self.top).max(0) }

    pub fn is_empty(&self) -> bool { self.width() == 0 || self.height() == 0 }

    /// Shrinks the rectangle by the given edge amounts, never past zero size.
    pub fn inset(&self, top: i32, left: i32, bottom: i32, right: i32) -> Rect {
        let new_left = (self.left + left).min(self.right);
        let new_top = (self.top + top).min(self.bottom);
        Rect {
            left: new_left,
            top: new_top,
            right: (self.right - right).max(new_left),
            bottom: (self.bottom - bottom).max(new_top),
        }
    }

    /// A rectangle of the requested size centered in `self`, clamped to fit.
    pub fn centered(&self, width: i32, height: i32) -> Rect {
        let width = width.clamp(0, self.width());
        let height = height.clamp(0, self.height());
        let left = self.left + (self.width() - width) / 2;
        let top = self.top + (self.height() - height) / 2;
        Rect::from_size(left, top, width, height)
    }

    /// Splits the rectangle along `orientation` into one slice per weight.
    ///
    /// Boundaries are rounded from the cumulative weight so the slices (plus
    /// `gap` between each pair) always cover the full extent.
    pub fn split(&self, orientation: Orientation, weights: &[f64], gap: i32) -> Vec<Rect> {
        if weights.is_empty() {
            return Vec::new();
        }
        let (start, extent) = match orientation {
            Orientation::Horizontal => (self.left, self.width()),
            Orientation::Vertical => (self.top, self.height()),
        };
        let end = start + extent;
        let gaps = gap.max(0) * (weights.len() as i32 - 1);
        let usable = f64::from((extent - gaps).max(0));
        let total: f64 = weights.iter().sum();

        let mut out = Vec::with_capacity(weights.len());
        let mut cumulative = 0.0;
        let mut from = start;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight;
            let offset = if total > 0.0 {
                (usable * cumulative / total).round() as i32
            } else {
                0
            };
            // Gaps wider than the extent collapse the trailing slices at `end`.
            let to = (start + offset + gap.max(0) * i as i32).min(end);
            out.push(match orientation {
                Orientation::Horizontal => Rect::new(from, self.top, to, self.bottom),
                Orientation::Vertical => Rect::new(self.left, from, self.right, to),
            });
            from = (to + gap.max(0)).min(end);
        }
        out
    }
}
