//! Owned, unattached subtrees.
//!
//! Parsers hand fragments to the tree, and the tree hands fragments back
//! as snapshots. Because a fragment owns its children outright, attaching
//! one can never create a cycle or give a node two parents.

use serde::{Deserialize, Serialize};

use super::node::NodeKind;

/// A node together with its ordered children, detached from any arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// The node itself.
    pub kind: NodeKind,
    /// Children in execution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Fragment>,
}

impl Fragment {
    /// A fragment without children.
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// A fragment with the given children.
    pub fn with_children(kind: NodeKind, children: Vec<Fragment>) -> Self {
        Self { kind, children }
    }

    /// An unelaborated step.
    pub fn step(name: impl Into<String>, gerund: Option<String>) -> Self {
        Self::leaf(NodeKind::step(name, gerund))
    }

    /// An action leaf.
    pub fn action(description: impl Into<String>) -> Self {
        Self::leaf(NodeKind::action(description))
    }

    /// A no-op leaf.
    pub fn placeholder() -> Self {
        Self::leaf(NodeKind::Placeholder)
    }

    /// A sequence grouping.
    pub fn sequence(children: Vec<Fragment>, learned: bool) -> Self {
        Self::with_children(NodeKind::Sequence { learned }, children)
    }

    /// A conditional whose primary branch starts with the trigger and
    /// continues with `body`. The else-branch is left unassigned.
    pub fn conditional(
        trigger_text: impl Into<String>,
        trigger_description: impl Into<String>,
        body: Vec<Fragment>,
    ) -> Self {
        let mut primary = Vec::with_capacity(body.len() + 1);
        primary.push(Self::leaf(NodeKind::trigger(
            trigger_text,
            trigger_description,
        )));
        primary.extend(body);

        Self::with_children(
            NodeKind::Conditional { learned: false },
            vec![Self::sequence(primary, false)],
        )
    }

    /// Total number of nodes in the fragment, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Fragment::node_count).sum::<usize>()
    }

    /// Check that leaves have no children and no nested root exists.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if matches!(self.kind, NodeKind::Root { .. }) {
            return Err("a fragment may not contain a root".to_string());
        }
        if !self.kind.is_container() && !self.children.is_empty() {
            return Err(format!("{} nodes cannot have children", self.kind.tag()));
        }
        if let NodeKind::Conditional { .. } = self.kind {
            let primary_ok = matches!(
                self.children.first(),
                Some(Fragment {
                    kind: NodeKind::Sequence { .. },
                    children,
                }) if matches!(children.first(), Some(Fragment { kind: NodeKind::Trigger { .. }, .. }))
            );
            if !primary_ok || self.children.len() > 2 {
                return Err(
                    "a conditional needs a primary sequence led by a trigger and at most one else-branch"
                        .to_string(),
                );
            }
        }
        self.children.iter().try_for_each(Fragment::validate)
    }
}
