use thiserror::Error;

use super::{Direction, Handle};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A mutation that is invalid for the node's current kind.
    #[error("structural violation: {0}")]
    StructuralViolation(String),
    #[error("handle {0} is not in the tree")]
    NotFound(Handle),
    #[error("no node can accept handle {0}")]
    CapacityExhausted(Handle),
    #[error("nothing {direction:?} of handle {from}")]
    NavigationDeadEnd { from: Handle, direction: Direction },
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid condition `{expr}`: {message}")]
    InvalidCondition { expr: String, message: String },
}

impl LayoutError {
    /// Whether the caller broke a structural contract, as opposed to a
    /// runtime condition it is expected to handle.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, LayoutError::StructuralViolation(_))
    }
}
