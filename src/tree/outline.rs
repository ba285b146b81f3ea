//! Indented text rendering of a behavior tree.

use super::arena::BehaviorTree;
use super::node::{NodeId, NodeKind};

const INDENT: &str = "    ";

impl BehaviorTree {
    /// Render the tree as an indented outline, one node per line.
    ///
    /// Learnable nodes are prefixed with `[x]` or `[ ]`; leaves with `-`.
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        self.outline_into(self.root(), 0, &mut lines);
        lines.join("\n") + "\n"
    }

    fn outline_into(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        let Ok(kind) = self.kind(id) else {
            return;
        };

        let marker = if !kind.is_learnable() {
            "-"
        } else if kind.is_learned() {
            "[x]"
        } else {
            "[ ]"
        };
        lines.push(format!(
            "{}{} {}: {}",
            INDENT.repeat(depth),
            marker,
            kind.tag(),
            self.label(id, kind)
        ));

        if let Ok(children) = self.children_of(id) {
            for child in children {
                self.outline_into(*child, depth + 1, lines);
            }
        }
    }

    fn label(&self, id: NodeId, kind: &NodeKind) -> String {
        match kind {
            NodeKind::Root { name, .. } => name.clone(),
            NodeKind::Step { name, .. } => name.clone(),
            NodeKind::Sequence { .. } => "in order".to_string(),
            NodeKind::Conditional { .. } => {
                let trigger = self
                    .trigger_of(id)
                    .and_then(|t| self.kind(t).map(|k| k.description().to_string()));
                match trigger {
                    Ok(description) => format!("when {description}"),
                    Err(_) => "when ?".to_string(),
                }
            }
            NodeKind::Trigger { text, description } => format!("{description} ({text:?})"),
            NodeKind::Action { description } => description.clone(),
            NodeKind::Placeholder => "do nothing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::{BehaviorTree, Fragment, Position};

    #[test]
    fn test_outline_fresh_tree() {
        let tree = BehaviorTree::new("Root", "approaching the person");
        assert_eq!(
            tree.outline(),
            "[ ] root: Root\n    - action: approaching the person\n"
        );
    }

    #[test]
    fn test_outline_nested_conditional() {
        let mut tree = BehaviorTree::new("Root", "approaching the person");
        let root = tree.root();
        let cond = tree
            .attach(
                root,
                Fragment::conditional("yes", "the person says yes", vec![Fragment::action("nod")]),
                Position::End,
            )
            .unwrap();
        tree.set_else_branch(cond, Fragment::placeholder()).unwrap();

        let outline = tree.outline();
        let lines: Vec<&str> = outline.lines().collect();
        assert_eq!(lines[2], "    [ ] conditional: when the person says yes");
        assert_eq!(lines[3], "        [ ] sequence: in order");
        assert_eq!(lines[4], "            - trigger: the person says yes (\"yes\")");
        assert_eq!(lines[5], "            - action: nod");
        assert_eq!(lines[6], "        - placeholder: do nothing");
    }
}
