//! Interfaces to the language collaborators.
//!
//! The learner never looks inside a parser or classifier. It only needs
//! fragments from the one and categories from the other.

use crate::core::{Response, ResponseCategory};
use crate::error::{ParseFailure, Result};
use crate::tree::{BehaviorTree, Fragment, NodeId, Position};

/// Turns free-text instructions into behavior-tree fragments.
pub trait InstructionParser {
    /// Parse `text` into an ordered list of sibling fragments.
    ///
    /// Must fail with [`ParseFailure`] rather than return an empty list.
    fn parse_instruction(&self, text: &str) -> std::result::Result<Vec<Fragment>, ParseFailure>;

    /// Parse `text` into a single unattached fragment.
    ///
    /// Several clauses are wrapped in a learned sequence.
    fn parse_standalone(&self, text: &str) -> std::result::Result<Fragment, ParseFailure> {
        let mut fragments = self.parse_instruction(text)?;
        match fragments.len() {
            0 => Err(ParseFailure::new(text, "no instruction found")),
            1 => Ok(fragments.remove(0)),
            _ => Ok(Fragment::sequence(fragments, true)),
        }
    }

    /// Parse `text` and attach the result at `target`'s conventional
    /// insertion point.
    ///
    /// Parsing happens before any edit, so a parse failure leaves the tree
    /// untouched.
    fn parse_and_attach(
        &self,
        text: &str,
        tree: &mut BehaviorTree,
        target: NodeId,
    ) -> Result<Vec<NodeId>> {
        let fragments = self.parse_instruction(text)?;
        if fragments.is_empty() {
            return Err(ParseFailure::new(text, "no instruction found").into());
        }
        let parent = tree.insertion_point(target)?;
        tree.attach_all(parent, fragments, Position::End)
    }
}

/// Assigns a semantic category to a raw utterance.
pub trait ResponseClassifier {
    /// Classify one utterance.
    fn classify(&self, utterance: &str) -> ResponseCategory;

    /// Classify and wrap the utterance as a [`Response`].
    fn respond(&self, utterance: &str) -> Response {
        Response::new(utterance, self.classify(utterance))
    }
}

impl<T: InstructionParser + ?Sized> InstructionParser for &T {
    fn parse_instruction(&self, text: &str) -> std::result::Result<Vec<Fragment>, ParseFailure> {
        (**self).parse_instruction(text)
    }
}

impl<T: InstructionParser + ?Sized> InstructionParser for Box<T> {
    fn parse_instruction(&self, text: &str) -> std::result::Result<Vec<Fragment>, ParseFailure> {
        (**self).parse_instruction(text)
    }
}

impl<T: ResponseClassifier + ?Sized> ResponseClassifier for &T {
    fn classify(&self, utterance: &str) -> ResponseCategory {
        (**self).classify(utterance)
    }
}
