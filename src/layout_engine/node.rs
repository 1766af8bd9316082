use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Condition, Orientation, Subtype};

/// Opaque identifier of a managed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub isize);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// What occupies a tree slot. Changing a node's kind replaces this value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Leaf {
        handle: Option<Handle>,
    },
    /// A stack of windows where only `active` is visible.
    Fallback {
        handles: Vec<Handle>,
        active: Option<Handle>,
    },
    Branch(Orientation),
}

impl NodeKind {
    pub fn empty_leaf() -> Self { NodeKind::Leaf { handle: None } }

    pub fn empty_fallback() -> Self {
        NodeKind::Fallback { handles: Vec::new(), active: None }
    }

    pub fn is_leaf(&self) -> bool { matches!(self, NodeKind::Leaf { .. }) }

    pub fn is_fallback(&self) -> bool { matches!(self, NodeKind::Fallback { .. }) }

    pub fn is_branch(&self) -> bool { matches!(self, NodeKind::Branch(_)) }

    pub fn orientation(&self) -> Option<Orientation> {
        match self {
            NodeKind::Branch(o) => Some(*o),
            _ => None,
        }
    }

    /// Handles held directly by this slot. Branches hold none themselves.
    pub fn handles(&self) -> &[Handle] {
        match self {
            NodeKind::Leaf { handle } => handle.as_slice(),
            NodeKind::Fallback { handles, .. } => handles,
            NodeKind::Branch(_) => &[],
        }
    }

    pub fn holds(&self, handle: Handle) -> bool { self.handles().contains(&handle) }

    /// The handle shown on screen for a leaf-like slot.
    pub fn visible(&self) -> Option<Handle> {
        match self {
            NodeKind::Leaf { handle } => *handle,
            NodeKind::Fallback { active, .. } => *active,
            NodeKind::Branch(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub subtype: Subtype,
    pub priority: i32,
    pub grow_factor: f64,
    pub condition: Option<Condition>,
}

impl Default for NodeInfo {
    fn default() -> Self {
        NodeInfo {
            kind: NodeKind::empty_leaf(),
            subtype: Subtype::Permanent,
            priority: default_priority(),
            grow_factor: default_grow_factor(),
            condition: None,
        }
    }
}

impl NodeInfo {
    pub fn is_temporal(&self) -> bool { self.subtype == Subtype::Temporal }

    pub(crate) fn temporal_leaf(handle: Handle, priority: i32) -> Self {
        NodeInfo {
            kind: NodeKind::Leaf { handle: Some(handle) },
            subtype: Subtype::Temporal,
            priority,
            ..NodeInfo::default()
        }
    }
}

/// What a workspace does with a window no node can accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoFallbackBehavior {
    /// Center the window at the configured floating size.
    #[default]
    Float,
    /// Keep tracking the window but never position it.
    Unmanaged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Leaf,
    Fallback,
    Horizontal,
    Vertical,
}

/// Serialized form of a node, as written in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeTemplate {
    #[serde(rename = "type")]
    pub kind: TemplateKind,
    #[serde(default)]
    pub subtype: Subtype,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_grow_factor")]
    pub grow_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn leaf(priority: i32) -> Self { Self::new(TemplateKind::Leaf, priority, Vec::new()) }

    pub fn fallback(priority: i32) -> Self {
        Self::new(TemplateKind::Fallback, priority, Vec::new())
    }

    pub fn branch(orientation: Orientation, priority: i32, children: Vec<NodeTemplate>) -> Self {
        let kind = match orientation {
            Orientation::Horizontal => TemplateKind::Horizontal,
            Orientation::Vertical => TemplateKind::Vertical,
        };
        Self::new(kind, priority, children)
    }

    fn new(kind: TemplateKind, priority: i32, children: Vec<NodeTemplate>) -> Self {
        NodeTemplate {
            kind,
            subtype: Subtype::Permanent,
            priority,
            grow_factor: default_grow_factor(),
            condition: None,
            children,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_subtype(mut self, subtype: Subtype) -> Self {
        self.subtype = subtype;
        self
    }

    /// `H[leaf, V[leaf, H[leaf, fallback]]]`, each level weighted 1 then 2.
    pub fn fibonacci() -> Self {
        use Orientation::*;
        Self::branch(Horizontal, 1, vec![
            Self::leaf(1),
            Self::branch(Vertical, 2, vec![
                Self::leaf(1),
                Self::branch(Horizontal, 2, vec![Self::leaf(1), Self::fallback(2)]),
            ]),
        ])
    }

    pub(crate) fn info(&self) -> NodeInfo {
        let kind = match self.kind {
            TemplateKind::Leaf => NodeKind::empty_leaf(),
            TemplateKind::Fallback => NodeKind::empty_fallback(),
            TemplateKind::Horizontal => NodeKind::Branch(Orientation::Horizontal),
            TemplateKind::Vertical => NodeKind::Branch(Orientation::Vertical),
        };
        NodeInfo {
            kind,
            subtype: self.subtype,
            priority: self.priority,
            grow_factor: self.grow_factor,
            condition: self.condition.clone(),
        }
    }

    fn is_branch(&self) -> bool {
        matches!(self.kind, TemplateKind::Horizontal | TemplateKind::Vertical)
    }

    /// Checks the template can become a workspace tree and returns a list of
    /// issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.kind == TemplateKind::Leaf {
            issues.push("root must be a fallback or a branch, not a leaf".to_owned());
        }
        self.validate_node("root", &mut issues);
        issues
    }

    fn validate_node(&self, path: &str, issues: &mut Vec<String>) {
        if !self.grow_factor.is_finite() || self.grow_factor <= 0.0 {
            issues.push(format!(
                "{path}: grow_factor must be positive, got {}",
                self.grow_factor
            ));
        }
        if !self.is_branch() {
            if !self.children.is_empty() {
                issues.push(format!("{path}: {:?} nodes cannot have children", self.kind));
            }
            return;
        }
        if self.children.is_empty() {
            issues.push(format!("{path}: branch must have at least one child"));
        } else if self.children.iter().all(|c| c.subtype == Subtype::Temporal) {
            issues.push(format!("{path}: branch needs at least one permanent child"));
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate_node(&format!("{path}.children[{i}]"), issues);
        }
    }
}

impl Default for NodeTemplate {
    fn default() -> Self { Self::fibonacci() }
}

fn default_priority() -> i32 { 1 }

fn default_grow_factor() -> f64 { 1.0 }
