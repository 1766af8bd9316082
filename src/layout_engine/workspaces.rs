use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FloatingManager, Handle, LayoutError, LayoutTree, NoFallbackBehavior, Reservation};
use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::Config;
use crate::common::log::trace_misc;
use crate::model::tree::NodeId;

/// Identifier of a workspace (virtual desktop) as reported by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self { WorkspaceId(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for WorkspaceId {
    fn from(value: &str) -> Self { WorkspaceId(value.to_owned()) }
}

impl From<String> for WorkspaceId {
    fn from(value: String) -> Self { WorkspaceId(value) }
}

pub struct Workspace {
    pub name: String,
    pub tree: LayoutTree,
    pub no_fallback_behavior: NoFallbackBehavior,
    pub(crate) floating: FloatingManager,
}

impl Workspace {
    fn new(name: String, tree: LayoutTree, no_fallback_behavior: NoFallbackBehavior) -> Self {
        Self {
            name,
            tree,
            no_fallback_behavior,
            floating: FloatingManager::new(),
        }
    }

    #[inline]
    pub fn is_floating(&self, handle: Handle) -> bool { self.floating.is_floating(handle) }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.tree.contains(handle) || self.floating.contains(handle)
    }

    /// Applies the fallback behavior to a window the tree refused.
    fn admit_outside_tree(&mut self, handle: Handle) -> Admission {
        match self.no_fallback_behavior {
            NoFallbackBehavior::Float => {
                self.floating.add_floating(handle);
                Admission::Floating
            }
            NoFallbackBehavior::Unmanaged => {
                self.floating.add_unmanaged(handle);
                Admission::Unmanaged
            }
        }
    }
}

/// Where a window ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Tiled(NodeId),
    Floating,
    Unmanaged,
}

/// Owns every workspace tree and knows which workspace holds each window.
pub struct Registry {
    config: Config,
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    handles: HashMap<Handle, WorkspaceId>,
    active: WorkspaceId,
}

impl Registry {
    pub fn new(config: Config) -> Result<Self, LayoutError> {
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(LayoutError::InvalidConfig(issues.join("; ")));
        }
        Ok(Registry {
            config,
            workspaces: BTreeMap::new(),
            handles: HashMap::default(),
            active: WorkspaceId::default(),
        })
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn active_id(&self) -> &WorkspaceId { &self.active }

    pub fn set_active(&mut self, id: WorkspaceId) -> Result<(), LayoutError> {
        self.ensure(&id)?;
        self.active = id;
        Ok(())
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<&Workspace> { self.workspaces.get(id) }

    pub fn workspace_mut(&mut self, id: &WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.get_mut(id)
    }

    pub fn workspaces(&self) -> impl Iterator<Item = (&WorkspaceId, &Workspace)> {
        self.workspaces.iter()
    }

    pub fn workspace_of(&self, handle: Handle) -> Option<&WorkspaceId> { self.handles.get(&handle) }

    /// Returns the workspace, creating it from its template on first use.
    pub fn ensure(&mut self, id: &WorkspaceId) -> Result<&mut Workspace, LayoutError> {
        match self.workspaces.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let resolved = self.config.workspace(id);
                let tree = LayoutTree::from_template(resolved.template)?;
                debug!(workspace = %id, name = %resolved.name, "created workspace");
                Ok(entry.insert(Workspace::new(resolved.name, tree, resolved.no_fallback_behavior)))
            }
        }
    }

    /// Adds a window to `id`, moving it out of any other workspace first.
    /// Windows the tree cannot take get the workspace's fallback behavior.
    pub fn add_handle(&mut self, handle: Handle, id: &WorkspaceId) -> Result<Admission, LayoutError> {
        self.detach_elsewhere(handle, id);
        let workspace = self.ensure(id)?;
        let admission = if workspace.floating.is_floating(handle) {
            Admission::Floating
        } else if workspace.floating.is_unmanaged(handle) {
            Admission::Unmanaged
        } else {
            match workspace.tree.add_handle(handle) {
                Ok(node) => Admission::Tiled(node),
                Err(LayoutError::CapacityExhausted(_)) => workspace.admit_outside_tree(handle),
                Err(e) => return Err(e),
            }
        };
        self.handles.insert(handle, id.clone());
        Ok(admission)
    }

    /// Places a window next to `anchor` according to `reservation`. On
    /// error nothing was changed.
    pub fn reserve(
        &mut self,
        handle: Handle,
        id: &WorkspaceId,
        reservation: Reservation,
        anchor: Handle,
    ) -> Result<Admission, LayoutError> {
        let workspace = self.ensure(id)?;
        if reservation != Reservation::Float && !workspace.tree.contains(anchor) {
            return Err(LayoutError::NotFound(anchor));
        }
        if workspace.contains(handle) {
            return Err(LayoutError::StructuralViolation(format!(
                "handle {handle} is already in workspace {id}"
            )));
        }
        let admission = match workspace.tree.apply_reservation(reservation, anchor, handle)? {
            Some(node) => Admission::Tiled(node),
            None => {
                workspace.floating.add_floating(handle);
                Admission::Floating
            }
        };
        self.detach_elsewhere(handle, id);
        self.handles.insert(handle, id.clone());
        Ok(admission)
    }

    /// Forgets a window. Returns the workspace it belonged to.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<WorkspaceId> {
        let id = self.handles.remove(&handle)?;
        if let Some(workspace) = self.workspaces.get_mut(&id) {
            let in_tree = workspace.tree.remove_handle(handle);
            let outside = workspace.floating.remove(handle);
            if !in_tree && !outside {
                warn!(%handle, workspace = %id, "handle index was out of date");
            }
        }
        Some(id)
    }

    /// Repacks the tree of `id`. Windows that no longer fit get the
    /// workspace's fallback behavior; they are returned.
    pub fn reindex(&mut self, id: &WorkspaceId) -> Vec<Handle> {
        let Some(workspace) = self.workspaces.get_mut(id) else {
            return Vec::new();
        };
        trace_misc("reindex", || {
            let overflow = workspace.tree.reindex();
            for &handle in &overflow {
                warn!(%handle, workspace = %id, "window no longer fits after reindex");
                workspace.admit_outside_tree(handle);
            }
            overflow
        })
    }

    /// Moves a window between its workspace's tree and the floating layer.
    pub fn toggle_floating(&mut self, handle: Handle) -> Result<Admission, LayoutError> {
        let Some(id) = self.handles.get(&handle) else {
            return Err(LayoutError::NotFound(handle));
        };
        let Some(workspace) = self.workspaces.get_mut(id) else {
            return Err(LayoutError::NotFound(handle));
        };
        if workspace.tree.remove_handle(handle) {
            workspace.floating.add_floating(handle);
            return Ok(Admission::Floating);
        }
        if !workspace.floating.contains(handle) {
            return Err(LayoutError::NotFound(handle));
        }
        match workspace.tree.add_handle(handle) {
            Ok(node) => {
                workspace.floating.remove(handle);
                Ok(Admission::Tiled(node))
            }
            Err(e) => Err(e),
        }
    }

    fn detach_elsewhere(&mut self, handle: Handle, target: &WorkspaceId) {
        if let Some(current) = self.handles.get(&handle)
            && current != target
        {
            debug!(%handle, from = %current, to = %target, "moving window between workspaces");
            self.remove_handle(handle);
        }
    }
}
