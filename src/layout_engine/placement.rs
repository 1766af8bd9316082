use tracing::{debug, error, trace, warn};

use super::{Handle, LayoutError, LayoutTree, NodeInfo, NodeKind, Orientation, Reservation};
use crate::model::tree::NodeId;

impl LayoutTree {
    /// Places `handle` in the first node that accepts it, searching depth
    /// first in ascending priority.
    pub fn add_handle(&mut self, handle: Handle) -> Result<NodeId, LayoutError> {
        if let Some(node) = self.node_containing(handle) {
            warn!(%handle, "handle is already in the tree");
            return Ok(node);
        }
        match self.add_handle_at(self.root(), handle) {
            Some(node) => {
                trace!(%handle, ?node, "placed handle");
                Ok(node)
            }
            None => {
                debug!(%handle, "no node accepted handle");
                Err(LayoutError::CapacityExhausted(handle))
            }
        }
    }

    /// Tries to place `handle` at or below `node`. Returns the node that took it.
    pub fn add_handle_at(&mut self, node: NodeId, handle: Handle) -> Option<NodeId> {
        if let Some(condition) = &self.info(node).condition
            && !condition.evaluate(self.length(node) + 1)
        {
            trace!(?node, %condition, "condition rejected handle");
            return None;
        }

        if self.kind(node).is_branch() {
            for child in self.children_by_priority(node) {
                if !self.is_full(child)
                    && let Some(placed) = self.add_handle_at(child, handle)
                {
                    return Some(placed);
                }
            }
            return None;
        }

        match &mut self.info_mut(node).kind {
            NodeKind::Leaf { handle: slot } if slot.is_none() => *slot = Some(handle),
            NodeKind::Fallback { handles, active } => {
                handles.push(handle);
                *active = Some(handle);
            }
            _ => return None,
        }
        Some(node)
    }

    /// Places `handle` relative to the node holding `anchor`.
    ///
    /// Returns `Ok(None)` for [`Reservation::Float`], which never enters the
    /// tree. On error the tree is unchanged.
    pub fn apply_reservation(
        &mut self,
        reservation: Reservation,
        anchor: Handle,
        handle: Handle,
    ) -> Result<Option<NodeId>, LayoutError> {
        if reservation == Reservation::Float {
            return Ok(None);
        }
        let Some(node) = self.node_containing(anchor) else {
            warn!(%anchor, %reservation, "reservation anchor is not in the tree");
            return Err(LayoutError::NotFound(anchor));
        };
        if self.contains(handle) {
            return Err(self.violation(format!("handle {handle} is already in the tree")));
        }

        match reservation.orientation() {
            None => self.stack_onto(node, handle).map(Some),
            Some(orientation) => {
                self.split(node, orientation, reservation.is_leading(), handle).map(Some)
            }
        }
    }

    /// Turns `node` into (or extends) a fallback holding `handle`.
    ///
    /// Unlike [`add_handle`](Self::add_handle), the active member is left as
    /// it was.
    fn stack_onto(&mut self, node: NodeId, handle: Handle) -> Result<NodeId, LayoutError> {
        let kind = match self.kind(node) {
            NodeKind::Fallback { handles, active } => NodeKind::Fallback {
                handles: handles.iter().copied().chain([handle]).collect(),
                active: *active,
            },
            NodeKind::Leaf { handle: existing } => NodeKind::Fallback {
                handles: existing.iter().copied().chain([handle]).collect(),
                active: *existing,
            },
            NodeKind::Branch(_) => {
                return Err(self.violation(format!("cannot turn branch {node:?} into a fallback")));
            }
        };
        self.info_mut(node).kind = kind;
        Ok(node)
    }

    /// Turns `node` into a branch holding a copy of itself and a new temporal
    /// leaf for `handle`. Returns the new leaf.
    fn split(
        &mut self,
        node: NodeId,
        orientation: Orientation,
        leading: bool,
        handle: Handle,
    ) -> Result<NodeId, LayoutError> {
        if self.kind(node).is_branch() {
            return Err(self.violation(format!("cannot turn branch {node:?} into a branch")));
        }

        node.deep_copy(&mut self.tree).push_back(node);
        self.info_mut(node).kind = NodeKind::Branch(orientation);

        let priority = self.children(node).first().map_or(1, |&c| self.info(c).priority);
        let leaf = self.tree.mk_node();
        let leaf = if leading { leaf.push_front(node) } else { leaf.push_back(node) };
        *self.info_mut(leaf) = NodeInfo::temporal_leaf(handle, priority);

        debug!(?node, %orientation, %handle, "split node for reservation");
        Ok(leaf)
    }

    /// Makes `handle` the active member of its fallback. Returns whether the
    /// tree changed.
    pub fn activate(&mut self, handle: Handle) -> bool {
        let Some(node) = self.node_containing(handle) else {
            return false;
        };
        match &mut self.info_mut(node).kind {
            NodeKind::Fallback { active, .. } if *active != Some(handle) => {
                *active = Some(handle);
                true
            }
            _ => false,
        }
    }

    /// Rotates the active member of the fallback holding `handle`, wrapping at
    /// either end. Returns the new active handle.
    pub fn cycle_stack(&mut self, handle: Handle, forward: bool) -> Option<Handle> {
        let node = self.node_containing(handle)?;
        let NodeKind::Fallback { handles, active } = &mut self.info_mut(node).kind else {
            return None;
        };
        let len = handles.len();
        let current = active.and_then(|a| handles.iter().position(|&h| h == a)).unwrap_or(0);
        let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
        *active = Some(handles[next]);
        *active
    }

    pub(super) fn violation(&self, message: String) -> LayoutError {
        error!("{message}");
        LayoutError::StructuralViolation(message)
    }
}
