use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{
    Axis, Direction, Handle, LayoutError, Placement, Registry, Reservation, ResizeDirection,
    Workspace, WorkspaceId,
};
use crate::common::config::Config;
use crate::common::geometry::Rect;

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    /// Place the next window that appears relative to the focused one.
    Reserve(Reservation),
    CancelReservation,
    CycleStack {
        forward: bool,
    },
    Reindex,
    ResetGrowFactors,
    ToggleFloating,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEvent {
    WindowAppeared {
        handle: Handle,
        workspace: WorkspaceId,
    },
    WindowDisappeared {
        handle: Handle,
    },
    WindowFocused {
        handle: Handle,
    },
    /// Recompute positions without touching any tree.
    RetileRequested,
    ReservationRequested {
        handle: Handle,
        reservation: Reservation,
        active: Handle,
    },
    ResizeRequested {
        axis: Axis,
        direction: ResizeDirection,
    },
    FocusMoved {
        direction: Direction,
    },
    ActiveWorkspaceChanged {
        workspace: WorkspaceId,
    },
    WorkAreaChanged {
        area: Rect,
    },
}

/// Commands for the positioning collaborator, recomputed after every event.
#[must_use]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub placements: Vec<Placement>,
    pub hide_windows: Vec<Handle>,
    /// Windows whose reservation failed and were placed some other way.
    pub bounce_windows: Vec<Handle>,
    pub focus_window: Option<Handle>,
}

pub struct LayoutEngine {
    registry: Registry,
    work_area: Rect,
    focused_window: Option<Handle>,
    pending_reservation: Option<Reservation>,
}

impl LayoutEngine {
    pub fn new(config: Config) -> Result<Self, LayoutError> {
        let work_area = config.settings.work_area.rect();
        Ok(LayoutEngine {
            registry: Registry::new(config)?,
            work_area,
            focused_window: None,
            pending_reservation: None,
        })
    }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn focused_window(&self) -> Option<Handle> { self.focused_window }

    pub fn pending_reservation(&self) -> Option<Reservation> { self.pending_reservation }

    pub fn work_area(&self) -> Rect { self.work_area }

    pub fn active_workspace(&self) -> Option<&Workspace> {
        self.registry.workspace(self.registry.active_id())
    }

    pub fn draw_tree(&self) -> Option<String> {
        self.active_workspace().map(|ws| ws.tree.draw_tree())
    }

    pub fn debug_tree(&self) {
        match self.draw_tree() {
            Some(tree) => debug!("Tree {}\n{}", self.registry.active_id(), tree.trim()),
            None => debug!("No tree for workspace {}", self.registry.active_id()),
        }
    }

    pub fn handle_event(&mut self, event: LayoutEvent) -> EventResponse {
        debug!(?event);
        let mut response = EventResponse::default();
        match event {
            LayoutEvent::WindowAppeared { handle, workspace } => {
                self.window_appeared(handle, workspace, &mut response);
            }
            LayoutEvent::WindowDisappeared { handle } => self.window_disappeared(handle),
            LayoutEvent::WindowFocused { handle } => {
                self.focused_window = Some(handle);
                if let Some(id) = self.registry.workspace_of(handle).cloned()
                    && let Some(workspace) = self.registry.workspace_mut(&id)
                {
                    workspace.tree.activate(handle);
                }
            }
            LayoutEvent::RetileRequested => {}
            LayoutEvent::ReservationRequested { handle, reservation, active } => {
                let workspace = self
                    .registry
                    .workspace_of(active)
                    .cloned()
                    .unwrap_or_else(|| self.registry.active_id().clone());
                if self.registry.workspace_of(handle).is_some() {
                    self.registry.remove_handle(handle);
                }
                self.place_reserved(handle, &workspace, reservation, active, &mut response);
            }
            LayoutEvent::ResizeRequested { axis, direction } => self.resize(axis, direction),
            LayoutEvent::FocusMoved { direction } => self.move_focus(direction, &mut response),
            LayoutEvent::ActiveWorkspaceChanged { workspace } => {
                if let Err(e) = self.registry.set_active(workspace) {
                    warn!("Could not switch workspace: {e}");
                }
            }
            LayoutEvent::WorkAreaChanged { area } => self.work_area = area,
        }
        self.retile(&mut response);
        response
    }

    pub fn handle_command(&mut self, command: LayoutCommand) -> EventResponse {
        debug!(?command, focused = ?self.focused_window, pending = ?self.pending_reservation);
        self.debug_tree();
        let mut response = EventResponse::default();
        match command {
            LayoutCommand::Reserve(reservation) => self.pending_reservation = Some(reservation),
            LayoutCommand::CancelReservation => self.pending_reservation = None,
            LayoutCommand::CycleStack { forward } => {
                if let Some(focus) = self.focused_window
                    && let Some(workspace) = self.workspace_of_mut(focus)
                    && let Some(next) = workspace.tree.cycle_stack(focus, forward)
                {
                    self.focused_window = Some(next);
                    response.focus_window = Some(next);
                }
            }
            LayoutCommand::Reindex => {
                let id = self.registry.active_id().clone();
                self.registry.reindex(&id);
            }
            LayoutCommand::ResetGrowFactors => {
                let id = self.registry.active_id().clone();
                if let Some(workspace) = self.registry.workspace_mut(&id) {
                    workspace.tree.reset_grow_factor();
                }
            }
            LayoutCommand::ToggleFloating => {
                if let Some(focus) = self.focused_window {
                    match self.registry.toggle_floating(focus) {
                        Ok(admission) => debug!(%focus, ?admission, "toggled floating"),
                        Err(e) => debug!(%focus, "Could not toggle floating: {e}"),
                    }
                }
            }
        }
        self.retile(&mut response);
        response
    }

    fn window_appeared(
        &mut self,
        handle: Handle,
        workspace: WorkspaceId,
        response: &mut EventResponse,
    ) {
        let anchor = self
            .focused_window
            .filter(|&f| f != handle && self.registry.workspace_of(f) == Some(&workspace));
        if workspace == *self.registry.active_id()
            && let Some(anchor) = anchor
            && let Some(reservation) = self.pending_reservation.take()
        {
            self.place_reserved(handle, &workspace, reservation, anchor, response);
            return;
        }
        self.place(handle, &workspace);
    }

    fn place(&mut self, handle: Handle, workspace: &WorkspaceId) {
        match self.registry.add_handle(handle, workspace) {
            Ok(admission) => debug!(%handle, %workspace, ?admission, "placed window"),
            Err(e) => error!(%handle, %workspace, "Could not place window: {e}"),
        }
    }

    fn place_reserved(
        &mut self,
        handle: Handle,
        workspace: &WorkspaceId,
        reservation: Reservation,
        anchor: Handle,
        response: &mut EventResponse,
    ) {
        match self.registry.reserve(handle, workspace, reservation, anchor) {
            Ok(admission) => {
                info!(%handle, %reservation, %anchor, ?admission, "applied reservation");
            }
            Err(e) => {
                if e.is_contract_violation() {
                    error!(%handle, %reservation, "Reservation failed: {e}");
                } else {
                    warn!(%handle, %reservation, "Reservation failed: {e}");
                }
                response.bounce_windows.push(handle);
                self.place(handle, workspace);
            }
        }
    }

    fn window_disappeared(&mut self, handle: Handle) {
        if self.focused_window == Some(handle) {
            self.focused_window = None;
        }
        let Some(id) = self.registry.remove_handle(handle) else {
            debug!(%handle, "Unknown window disappeared");
            return;
        };
        if self.registry.config().settings.auto_reindex {
            self.registry.reindex(&id);
        }
    }

    fn resize(&mut self, axis: Axis, direction: ResizeDirection) {
        let Some(focus) = self.focused_window else {
            return;
        };
        let resize = self.registry.config().settings.resize.clone();
        let delta = match axis {
            Axis::X => resize.horizontal_delta,
            Axis::Y => resize.vertical_delta,
        };
        if let Some(workspace) = self.workspace_of_mut(focus)
            && workspace.tree.update_grow_factor(focus, axis, direction, delta)
        {
            workspace.tree.reindex_grow_factor();
        }
    }

    fn move_focus(&mut self, direction: Direction, response: &mut EventResponse) {
        let Some(focus) = self.focused_window else {
            return;
        };
        let Some(workspace) = self.workspace_of_mut(focus) else {
            return;
        };
        match workspace.tree.handle_at_side(focus, direction) {
            Ok(target) => {
                self.focused_window = Some(target);
                response.focus_window = Some(target);
            }
            Err(e) => debug!("Focus unchanged: {e}"),
        }
    }

    fn workspace_of_mut(&mut self, handle: Handle) -> Option<&mut Workspace> {
        let id = self.registry.workspace_of(handle)?.clone();
        self.registry.workspace_mut(&id)
    }

    /// Positions for the active workspace; windows of every other workspace
    /// are hidden.
    fn retile(&self, response: &mut EventResponse) {
        let settings = &self.registry.config().settings;
        let active = self.registry.active_id();
        for (id, workspace) in self.registry.workspaces() {
            if id == active {
                let arrangement = workspace.tree.calculate_layout(self.work_area, &settings.gaps);
                response.placements.extend(arrangement.placements);
                response
                    .placements
                    .extend(workspace.floating.placements(self.work_area, &settings.floating));
                response.hide_windows.extend(arrangement.hidden);
            } else {
                response.hide_windows.extend(workspace.tree.handles());
                response.hide_windows.extend(workspace.floating.floating());
            }
        }
    }
}
