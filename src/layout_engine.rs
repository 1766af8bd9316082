mod condition;
pub mod engine;
mod error;
mod floating;
pub(crate) mod graph;
mod layout_tree;
mod navigation;
mod node;
mod placement;
mod positioning;
mod removal;
pub mod replay;
mod sizing;
mod workspaces;

pub use condition::Condition;
pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
pub use error::LayoutError;
pub(crate) use floating::FloatingManager;
pub use graph::{Axis, Direction, Orientation, Reservation, ResizeDirection, Subtype};
pub use layout_tree::LayoutTree;
pub use node::{Handle, NoFallbackBehavior, NodeInfo, NodeKind, NodeTemplate, TemplateKind};
pub use positioning::{Arrangement, Placement};
pub use sizing::MIN_GROW_FACTOR;
pub use workspaces::{Admission, Registry, Workspace, WorkspaceId};
