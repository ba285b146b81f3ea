//! Behavior-tree model for sapling.
//!
//! The tree is an arena of [`NodeKind`]s addressed by [`NodeId`] handles.
//! Parsers produce owned [`Fragment`]s, which the tree materializes on
//! attach and hands back as snapshots on detach.

pub mod arena;
pub mod fragment;
pub mod node;
mod outline;

pub use arena::{BehaviorTree, Position};
pub use fragment::Fragment;
pub use node::{NodeId, NodeKind};
