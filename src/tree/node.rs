//! Behavior-tree node kinds.
//!
//! The set of kinds is closed: the learner matches on [`NodeKind`]
//! exhaustively, so adding a kind forces every dispatch site to decide what
//! teaching means for it.

use serde::{Deserialize, Serialize};

/// Opaque handle to a node inside a [`BehaviorTree`](super::BehaviorTree).
///
/// Handles are never reused. Once a node is detached every copy of its
/// handle stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot index, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A behavior-tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Top-level container. Child 0 is the approach action.
    Root { name: String, learned: bool },

    /// A named action that the teacher elaborates into sub-steps.
    Step {
        name: String,
        #[serde(default)]
        gerund: Option<String>,
        learned: bool,
    },

    /// Ordered grouping. Never asked about directly.
    Sequence { learned: bool },

    /// Child 0 is the primary branch (a sequence led by a trigger),
    /// child 1 the else-branch once assigned.
    Conditional { learned: bool },

    /// Literal condition the agent listens for.
    Trigger { text: String, description: String },

    /// Atomic executable act.
    Action { description: String },

    /// No-op closing an else-branch.
    Placeholder,
}

impl NodeKind {
    /// Create an unelaborated step.
    pub fn step(name: impl Into<String>, gerund: Option<String>) -> Self {
        Self::Step {
            name: name.into(),
            gerund,
            learned: false,
        }
    }

    /// Create an action leaf.
    pub fn action(description: impl Into<String>) -> Self {
        Self::Action {
            description: description.into(),
        }
    }

    /// Create a trigger leaf.
    pub fn trigger(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Trigger {
            text: text.into(),
            description: description.into(),
        }
    }

    /// Whether the kind carries a `learned` flag that teaching can set.
    pub fn is_learnable(&self) -> bool {
        match self {
            NodeKind::Root { .. }
            | NodeKind::Step { .. }
            | NodeKind::Sequence { .. }
            | NodeKind::Conditional { .. } => true,
            NodeKind::Trigger { .. } | NodeKind::Action { .. } | NodeKind::Placeholder => false,
        }
    }

    /// Whether the node needs no further teaching.
    ///
    /// Kinds without a flag are always learned.
    pub fn is_learned(&self) -> bool {
        match self {
            NodeKind::Root { learned, .. }
            | NodeKind::Step { learned, .. }
            | NodeKind::Sequence { learned }
            | NodeKind::Conditional { learned } => *learned,
            NodeKind::Trigger { .. } | NodeKind::Action { .. } | NodeKind::Placeholder => true,
        }
    }

    /// Set the `learned` flag. Returns false for kinds that have none.
    ///
    /// The flag only ever moves from false to true.
    pub(crate) fn set_learned(&mut self) -> bool {
        match self {
            NodeKind::Root { learned, .. }
            | NodeKind::Step { learned, .. }
            | NodeKind::Sequence { learned }
            | NodeKind::Conditional { learned } => {
                *learned = true;
                true
            }
            NodeKind::Trigger { .. } | NodeKind::Action { .. } | NodeKind::Placeholder => false,
        }
    }

    /// Whether the kind may own children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Root { .. }
                | NodeKind::Step { .. }
                | NodeKind::Sequence { .. }
                | NodeKind::Conditional { .. }
        )
    }

    /// Phrase used when the node is mentioned in a question.
    pub fn description(&self) -> &str {
        match self {
            NodeKind::Root { name, .. } => name,
            NodeKind::Step { name, gerund, .. } => gerund.as_deref().unwrap_or(name),
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Conditional { .. } => "conditional",
            NodeKind::Trigger { description, .. } => description,
            NodeKind::Action { description } => description,
            NodeKind::Placeholder => "nothing",
        }
    }

    /// Short lowercase tag for outlines and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Root { .. } => "root",
            NodeKind::Step { .. } => "step",
            NodeKind::Sequence { .. } => "sequence",
            NodeKind::Conditional { .. } => "conditional",
            NodeKind::Trigger { .. } => "trigger",
            NodeKind::Action { .. } => "action",
            NodeKind::Placeholder => "placeholder",
        }
    }
}
