//! Teaching state machine.
//!
//! The learner walks the behavior tree for the leftmost unlearned node, asks
//! the teacher about it, and turns the classified reply into a tree edit.
//! Every call to [`TaskLearner::step`] performs at most one edit, so a
//! session abandoned between steps leaves a consistent tree behind.

use tracing::{debug, info, warn};

use crate::config::DialogueConfig;
use crate::core::prompt::{Prompt, Response, ResponseCategory, Turn};
use crate::error::{Result, SaplingError};
use crate::ports::InstructionParser;
use crate::tree::{BehaviorTree, Fragment, NodeId, NodeKind};

const APOLOGY_ROOT: &str = "I'm sorry I misheard you, let's try again";
const APOLOGY_STEP: &str = "I'm sorry I misheard you, let's go back and try again";
const APOLOGY_PARSE: &str = "I'm sorry, I don't quite understand what you said, let's try again";

/// Which question is outstanding. Decides how a reply is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    /// What comes after the last top-level step.
    Continue,
    /// How to perform a step with no sub-steps yet.
    Elaborate,
    /// What follows the sub-steps taught so far.
    NextStep,
    /// Whether a conditional's primary branch needs more.
    AnythingElse,
    /// What to do when the trigger's opposite is heard.
    Otherwise,
}

#[derive(Debug, Clone)]
enum Pending {
    /// No question outstanding; the next step picks a target.
    Ready,
    /// A question was asked and exactly one response is expected.
    Awaiting {
        target: NodeId,
        question: Question,
        text: String,
    },
    /// The root is learned.
    Finished,
}

/// Builds a behavior tree by asking the teacher questions.
///
/// Drive it by calling [`step`](Self::step) with `None` to get a prompt and,
/// when that prompt needs a response, calling it again with the classified
/// reply. Stop when it returns [`Turn::Done`].
#[derive(Debug)]
pub struct TaskLearner<P> {
    tree: BehaviorTree,
    parser: P,
    config: DialogueConfig,
    pending: Pending,
}

impl<P: InstructionParser> TaskLearner<P> {
    /// Create a learner with a fresh tree.
    pub fn new(parser: P, config: &DialogueConfig) -> Self {
        Self {
            tree: BehaviorTree::new(config.root_name.clone(), config.approach.clone()),
            parser,
            config: config.clone(),
            pending: Pending::Ready,
        }
    }

    /// The tree built so far.
    pub fn tree(&self) -> &BehaviorTree {
        &self.tree
    }

    /// Consume the learner and keep the tree.
    pub fn into_tree(self) -> BehaviorTree {
        self.tree
    }

    /// Whether the root has been learned.
    pub fn is_finished(&self) -> bool {
        matches!(self.pending, Pending::Finished)
    }

    /// Text of the question awaiting a response, if any.
    pub fn pending_question(&self) -> Option<&str> {
        match &self.pending {
            Pending::Awaiting { text, .. } => Some(text),
            Pending::Ready | Pending::Finished => None,
        }
    }

    // =========================================================================
    // Protocol
    // =========================================================================

    /// Advance the dialogue by one turn.
    ///
    /// Pass `None` when no question is outstanding and `Some(response)` to
    /// answer the question returned by the previous call. Mixing the two up
    /// is a [`SaplingError::ProtocolViolation`].
    pub fn step(&mut self, response: Option<Response>) -> Result<Turn> {
        let pending = std::mem::replace(&mut self.pending, Pending::Ready);
        match (pending, response) {
            (Pending::Ready, None) => self.advance(),
            (Pending::Ready, Some(response)) => Err(SaplingError::protocol(format!(
                "received {:?} but no question was asked",
                response.text
            ))),
            (
                Pending::Awaiting {
                    target, question, ..
                },
                Some(response),
            ) => {
                debug!(node = target.index(), category = %response.category, "dispatching response");
                self.dispatch(target, question, response)
            }
            (
                Pending::Awaiting {
                    target,
                    question,
                    text,
                },
                None,
            ) => {
                let message = format!("a response is required for {text:?}");
                self.pending = Pending::Awaiting {
                    target,
                    question,
                    text,
                };
                Err(SaplingError::protocol(message))
            }
            (Pending::Finished, None) => {
                self.pending = Pending::Finished;
                Ok(Turn::Done)
            }
            (Pending::Finished, Some(response)) => {
                self.pending = Pending::Finished;
                Err(SaplingError::protocol(format!(
                    "received {:?} after teaching finished",
                    response.text
                )))
            }
        }
    }

    /// Pick the next target and ask about it.
    fn advance(&mut self) -> Result<Turn> {
        loop {
            let root = self.tree.root();
            if self.tree.is_learned(root)? {
                self.pending = Pending::Finished;
                return Ok(Turn::Done);
            }

            let target = next_target(&self.tree)?;
            if let Some((question, text)) = self.question_for(target)? {
                debug!(node = target.index(), question = %text, "asking");
                self.pending = Pending::Awaiting {
                    target,
                    question,
                    text: text.clone(),
                };
                return Ok(Turn::Prompt(Prompt::question(text)));
            }
        }
    }

    /// Phrase the question for `target`.
    ///
    /// Returns `None` when the target could be closed without asking, which
    /// happens for a conditional whose trigger has no opposite.
    fn question_for(&mut self, target: NodeId) -> Result<Option<(Question, String)>> {
        let kind = self.tree.kind(target)?.clone();
        match &kind {
            NodeKind::Root { .. } => {
                let last = self
                    .tree
                    .children_of(target)?
                    .last()
                    .copied()
                    .ok_or_else(|| SaplingError::invalid_tree("root has no children"))?;
                let text = format!("What should I do after {}?", self.mention(last)?);
                Ok(Some((Question::Continue, text)))
            }
            NodeKind::Step { name, .. } if self.tree.children_of(target)?.is_empty() => {
                Ok(Some((Question::Elaborate, format!("How do I {name}?"))))
            }
            NodeKind::Step { .. } => Ok(Some((
                Question::NextStep,
                format!("What is the next step of {}?", kind.description()),
            ))),
            NodeKind::Conditional { .. } => {
                let primary = self.tree.primary_branch_of(target)?;
                let (literal, situation) = self.trigger_phrases(target)?;
                if !self.tree.is_learned(primary)? {
                    return Ok(Some((
                        Question::AnythingElse,
                        format!("Should I do anything else when {situation}?"),
                    )));
                }
                match self.opposite_literal(&literal) {
                    Some(opposite) => Ok(Some((
                        Question::Otherwise,
                        format!("What should I do if the person says {opposite}?"),
                    ))),
                    None => {
                        self.close_conditional(target)?;
                        Ok(None)
                    }
                }
            }
            other => Err(SaplingError::invalid_tree(format!(
                "{} nodes are never taught",
                other.tag()
            ))),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn dispatch(&mut self, target: NodeId, question: Question, response: Response) -> Result<Turn> {
        use ResponseCategory::{Done, Instruction, Misrecognized};

        match (question, response.category) {
            (Question::Otherwise, Instruction) => self.assign_else(target, &response.text),
            (_, Instruction) => self.extend(target, &response.text),

            (Question::Continue, Done) => {
                self.tree.mark_learned(target)?;
                info!("root learned, teaching finished");
                self.pending = Pending::Finished;
                Ok(Turn::Done)
            }
            (Question::NextStep, Done) => {
                self.tree.mark_learned(target)?;
                let name = match self.tree.kind(target)? {
                    NodeKind::Step { name, .. } => name.clone(),
                    other => other.description().to_string(),
                };
                info!(node = target.index(), step = %name, "step learned");
                Ok(notify(format!("Okay, I've learned how to {name}")))
            }
            (Question::AnythingElse, Done) => self.complete_primary(target),
            (Question::Otherwise, Done) => {
                self.close_conditional(target)?;
                self.advance()
            }

            (Question::Continue, Misrecognized) => {
                let children = self.tree.children_of(target)?;
                let last = children.last().copied().filter(|_| children.len() > 1);
                if let Some(last) = last {
                    let removed = self.tree.detach(last)?;
                    info!(node = last.index(), kind = removed.kind.tag(), "rolled back top-level step");
                }
                Ok(notify(APOLOGY_ROOT))
            }
            (Question::Elaborate, Misrecognized) => {
                let removed = self.tree.detach(target)?;
                info!(node = target.index(), step = removed.kind.description(), "rolled back step");
                Ok(notify(APOLOGY_STEP))
            }
            (Question::NextStep | Question::AnythingElse | Question::Otherwise, Misrecognized) => {
                debug!(node = target.index(), "misheard, asking again");
                Ok(notify(APOLOGY_ROOT))
            }

            (_, category) => self.unexpected(target, category),
        }
    }

    /// Parse an instruction and attach it at the target's insertion point.
    fn extend(&mut self, target: NodeId, text: &str) -> Result<Turn> {
        match self.parser.parse_and_attach(text, &mut self.tree, target) {
            Ok(ids) => {
                info!(node = target.index(), attached = ids.len(), "instruction attached");
                self.advance()
            }
            Err(SaplingError::Parse(failure)) => {
                warn!(%failure, "instruction not understood");
                Ok(notify(APOLOGY_PARSE))
            }
            Err(e) => Err(e),
        }
    }

    /// Parse an instruction and make it the conditional's else-branch.
    fn assign_else(&mut self, conditional: NodeId, text: &str) -> Result<Turn> {
        let fragment = match self.parser.parse_standalone(text) {
            Ok(fragment) => fragment,
            Err(failure) => {
                warn!(%failure, "else-branch not understood");
                return Ok(notify(APOLOGY_PARSE));
            }
        };
        self.tree.set_else_branch(conditional, fragment)?;
        self.tree.mark_learned(conditional)?;
        info!(node = conditional.index(), "conditional learned with else-branch");
        self.advance()
    }

    /// The teacher has nothing more for the primary branch.
    fn complete_primary(&mut self, conditional: NodeId) -> Result<Turn> {
        let primary = self.tree.primary_branch_of(conditional)?;
        self.tree.mark_learned(primary)?;
        let (literal, situation) = self.trigger_phrases(conditional)?;
        info!(node = conditional.index(), trigger = %literal, "primary branch learned");

        if self.opposite_literal(&literal).is_none() {
            self.close_conditional(conditional)?;
        }
        Ok(notify(format!("Okay, I've learned what to do when {situation}")))
    }

    /// Attach a placeholder else-branch and mark the conditional learned.
    fn close_conditional(&mut self, conditional: NodeId) -> Result<()> {
        if self.tree.else_branch_of(conditional)?.is_none() {
            self.tree.set_else_branch(conditional, Fragment::placeholder())?;
        }
        self.tree.mark_learned(conditional)?;
        info!(node = conditional.index(), "conditional closed without else-branch");
        Ok(())
    }

    fn unexpected(&mut self, target: NodeId, category: ResponseCategory) -> Result<Turn> {
        let description = self.tree.kind(target)?.description().to_string();
        if self.config.strict {
            return Err(SaplingError::unexpected_response(description, category));
        }
        warn!(node = target.index(), %category, "ignoring unexpected response");
        Ok(notify(APOLOGY_PARSE))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// How a node is referred to in a question.
    fn mention(&self, id: NodeId) -> Result<String> {
        match self.tree.kind(id)? {
            NodeKind::Conditional { .. } => Ok(self.trigger_phrases(id)?.1),
            other => Ok(other.description().to_string()),
        }
    }

    /// The trigger's literal and situation phrase.
    fn trigger_phrases(&self, conditional: NodeId) -> Result<(String, String)> {
        let trigger = self.tree.trigger_of(conditional)?;
        match self.tree.kind(trigger)? {
            NodeKind::Trigger { text, description } => Ok((text.clone(), description.clone())),
            other => Err(SaplingError::invalid_tree(format!(
                "expected a trigger, found a {} node",
                other.tag()
            ))),
        }
    }

    /// The reply that takes the else-branch, if the literal is a yes/no.
    fn opposite_literal(&self, literal: &str) -> Option<String> {
        let literal = literal.trim().to_lowercase();
        let listed = |set: &[String]| set.iter().any(|s| s.trim().to_lowercase() == literal);

        if listed(&self.config.affirmative) {
            self.config.negative.first().cloned()
        } else if listed(&self.config.negative) {
            self.config.affirmative.first().cloned()
        } else {
            None
        }
    }
}

fn notify(text: impl Into<String>) -> Turn {
    Turn::Prompt(Prompt::notification(text))
}

// =========================================================================
// Traversal
// =========================================================================

/// Leftmost unlearned node in the subtree rooted at `node`.
///
/// Descends into the first learnable child that is not learned; a node with
/// no such child is itself the answer. A sequence is never returned: it is
/// replaced by the nearest ancestor that is not a sequence.
pub fn find_unlearned(tree: &BehaviorTree, node: NodeId) -> Result<NodeId> {
    let mut current = node;
    'descend: loop {
        for &child in tree.children_of(current)? {
            if tree.is_learnable(child)? && !tree.is_learned(child)? {
                current = child;
                continue 'descend;
            }
        }
        break;
    }

    while let NodeKind::Sequence { .. } = tree.kind(current)? {
        match tree.parent_of(current)? {
            Some(parent) => current = parent,
            None => break,
        }
    }
    Ok(current)
}

/// The node the learner should ask about next.
pub fn next_target(tree: &BehaviorTree) -> Result<NodeId> {
    find_unlearned(tree, tree.root())
}
