//! Arena-backed behavior tree.
//!
//! Nodes live in a slot vector and refer to each other by [`NodeId`].
//! Parent links are plain back-references used for traversal and detach;
//! ownership flows strictly downward through each slot's child list.

use tracing::debug;

use super::fragment::Fragment;
use super::node::{NodeId, NodeKind};
use crate::error::{Result, SaplingError};

/// Where an attached fragment lands among its new siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// After the current last child.
    End,
    /// At the given index, shifting later siblings right.
    Index(usize),
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted behavior tree owned by one teaching session.
#[derive(Debug, Clone)]
pub struct BehaviorTree {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl BehaviorTree {
    /// Create a tree holding only the root and its approach action.
    pub fn new(root_name: impl Into<String>, approach: impl Into<String>) -> Self {
        let root = NodeId(0);
        let approach_id = NodeId(1);
        let slots = vec![
            Some(Slot {
                kind: NodeKind::Root {
                    name: root_name.into(),
                    learned: false,
                },
                parent: None,
                children: vec![approach_id],
            }),
            Some(Slot {
                kind: NodeKind::action(approach),
                parent: Some(root),
                children: Vec::new(),
            }),
        ];
        Self { slots, root }
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes. Detached slots are not counted.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the handle still resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SaplingError::NodeNotFound { index: id.0 })
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SaplingError::NodeNotFound { index: id.0 })
    }

    /// The node's kind and fields.
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.slot(id)?.kind)
    }

    /// The node's parent, `None` for the root.
    pub fn parent_of(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.slot(id)?.parent)
    }

    /// Ordered children of the node.
    pub fn children_of(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.slot(id)?.children)
    }

    /// Whether the node's kind carries a `learned` flag.
    pub fn is_learnable(&self, id: NodeId) -> Result<bool> {
        Ok(self.kind(id)?.is_learnable())
    }

    /// Whether the node needs no further teaching.
    pub fn is_learned(&self, id: NodeId) -> Result<bool> {
        Ok(self.kind(id)?.is_learned())
    }

    /// Set the node's `learned` flag. Never cleared afterwards.
    pub fn mark_learned(&mut self, id: NodeId) -> Result<()> {
        let slot = self.slot_mut(id)?;
        if !slot.kind.set_learned() {
            return Err(SaplingError::invalid_tree(format!(
                "{} nodes have no learned flag",
                slot.kind.tag()
            )));
        }
        debug!(node = id.0, kind = slot.kind.tag(), "marked learned");
        Ok(())
    }

    /// Materialize `fragment` as a child of `parent`.
    ///
    /// The fragment is validated before anything is written, so a rejected
    /// attach leaves the tree untouched.
    pub fn attach(&mut self, parent: NodeId, fragment: Fragment, position: Position) -> Result<NodeId> {
        let mut ids = self.attach_all(parent, vec![fragment], position)?;
        ids.pop()
            .ok_or_else(|| SaplingError::invalid_tree("attach produced no node"))
    }

    /// Attach a group of sibling fragments in order, starting at `position`.
    pub fn attach_all(
        &mut self,
        parent: NodeId,
        fragments: Vec<Fragment>,
        position: Position,
    ) -> Result<Vec<NodeId>> {
        let index = self.resolve_position(parent, position)?;
        for fragment in &fragments {
            fragment.validate().map_err(SaplingError::invalid_tree)?;
        }

        let mut ids = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            ids.push(self.materialize(fragment, parent));
        }

        let siblings = &mut self.slot_mut(parent)?.children;
        siblings.splice(index..index, ids.iter().copied());
        debug!(parent = parent.0, count = ids.len(), index, "attached fragments");
        Ok(ids)
    }

    fn resolve_position(&self, parent: NodeId, position: Position) -> Result<usize> {
        let slot = self.slot(parent)?;
        if !slot.kind.is_container() {
            return Err(SaplingError::invalid_tree(format!(
                "cannot attach under a {} node",
                slot.kind.tag()
            )));
        }

        let len = slot.children.len();
        let index = match position {
            Position::End => len,
            Position::Index(i) if i <= len => i,
            Position::Index(i) => {
                return Err(SaplingError::invalid_tree(format!(
                    "index {i} is past the end of {len} children"
                )))
            }
        };

        if parent == self.root && index == 0 {
            return Err(SaplingError::invalid_tree(
                "the approach action must stay the root's first child",
            ));
        }
        Ok(index)
    }

    fn materialize(&mut self, fragment: Fragment, parent: NodeId) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            kind: fragment.kind,
            parent: Some(parent),
            children: Vec::new(),
        }));

        let children: Vec<NodeId> = fragment
            .children
            .into_iter()
            .map(|child| self.materialize(child, id))
            .collect();
        if let Some(Some(slot)) = self.slots.get_mut(id.0) {
            slot.children = children;
        }
        id
    }

    /// Remove the node from its parent and free its whole subtree.
    ///
    /// Returns a snapshot of what was removed. The root and the root's
    /// approach action cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Result<Fragment> {
        let parent = self
            .parent_of(id)?
            .ok_or_else(|| SaplingError::invalid_tree("the root cannot be detached"))?;
        if parent == self.root && self.children_of(parent)?.first() == Some(&id) {
            return Err(SaplingError::invalid_tree(
                "the approach action cannot be detached",
            ));
        }

        let removed = self.snapshot_of(id)?;
        self.slot_mut(parent)?.children.retain(|child| *child != id);

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(next.0).and_then(Option::take) {
                stack.extend(slot.children);
            }
        }
        debug!(node = id.0, parent = parent.0, freed = removed.node_count(), "detached subtree");
        Ok(removed)
    }

    /// Conventional parent for new instructions about `target`.
    ///
    /// Instructions about a conditional extend its primary branch; every
    /// other container receives them directly.
    pub fn insertion_point(&self, target: NodeId) -> Result<NodeId> {
        match self.kind(target)? {
            NodeKind::Conditional { .. } => self.primary_branch_of(target),
            kind if kind.is_container() => Ok(target),
            kind => Err(SaplingError::invalid_tree(format!(
                "{} nodes take no instructions",
                kind.tag()
            ))),
        }
    }

    fn expect_conditional(&self, id: NodeId) -> Result<&Slot> {
        let slot = self.slot(id)?;
        match slot.kind {
            NodeKind::Conditional { .. } => Ok(slot),
            ref other => Err(SaplingError::invalid_tree(format!(
                "expected a conditional, found a {} node",
                other.tag()
            ))),
        }
    }

    /// The primary branch sequence of a conditional.
    pub fn primary_branch_of(&self, conditional: NodeId) -> Result<NodeId> {
        self.expect_conditional(conditional)?
            .children
            .first()
            .copied()
            .ok_or_else(|| SaplingError::invalid_tree("conditional has no primary branch"))
    }

    /// The else-branch of a conditional, if one was assigned.
    pub fn else_branch_of(&self, conditional: NodeId) -> Result<Option<NodeId>> {
        Ok(self.expect_conditional(conditional)?.children.get(1).copied())
    }

    /// The trigger leading a conditional's primary branch.
    pub fn trigger_of(&self, conditional: NodeId) -> Result<NodeId> {
        let primary = self.primary_branch_of(conditional)?;
        let first = self
            .children_of(primary)?
            .first()
            .copied()
            .ok_or_else(|| SaplingError::invalid_tree("primary branch has no trigger"))?;
        match self.kind(first)? {
            NodeKind::Trigger { .. } => Ok(first),
            other => Err(SaplingError::invalid_tree(format!(
                "primary branch starts with a {} node instead of a trigger",
                other.tag()
            ))),
        }
    }

    /// Assign the else-branch of a conditional. Allowed exactly once.
    pub fn set_else_branch(&mut self, conditional: NodeId, fragment: Fragment) -> Result<NodeId> {
        if self.else_branch_of(conditional)?.is_some() {
            return Err(SaplingError::invalid_tree(
                "else-branch already assigned",
            ));
        }
        self.attach(conditional, fragment, Position::End)
    }

    /// Owned copy of the whole tree, for structural comparison.
    pub fn snapshot(&self) -> Fragment {
        self.snapshot_of(self.root)
            .unwrap_or_else(|_| Fragment::placeholder())
    }

    /// Owned copy of the subtree rooted at `id`.
    pub fn snapshot_of(&self, id: NodeId) -> Result<Fragment> {
        let slot = self.slot(id)?;
        let children = slot
            .children
            .iter()
            .map(|child| self.snapshot_of(*child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Fragment::with_children(slot.kind.clone(), children))
    }
}
