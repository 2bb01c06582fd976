pub mod evaluator;
pub mod session;
pub mod validation;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use evaluator::{evaluate, trace};
pub use session::DecisionSession;
pub use validation::{validate_tree, StructuralTreeError, TreeViolation};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque key of a recommendation. Catalog membership is checked by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TerminalKey(pub String);

impl TerminalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TerminalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&str> for TerminalKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Question(NodeId),
    Terminal(TerminalKey),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerOption {
    pub label: String,
    pub next: NextStep,
}

impl AnswerOption {
    pub fn to_question(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next: NextStep::Question(NodeId::new(id)),
        }
    }

    pub fn to_terminal(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            next: NextStep::Terminal(TerminalKey::new(key)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionNode {
    pub id: NodeId,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

impl QuestionNode {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            prompt: prompt.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: AnswerOption) -> Self {
        self.options.push(option);
        self
    }
}

/// Tree as authored. May be malformed; run [`validate_tree`] or convert into a
/// [`DecisionTree`] before evaluating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeDefinition {
    pub root: NodeId,
    pub questions: Vec<QuestionNode>,
}

/// A structurally valid decision tree: one root, no dangling references, no
/// cycles. Only obtainable through validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "TreeDefinition", into = "TreeDefinition")]
pub struct DecisionTree {
    root: NodeId,
    questions: Vec<QuestionNode>,
    index: BTreeMap<NodeId, usize>,
}

impl DecisionTree {
    pub fn new(definition: TreeDefinition) -> Result<Self, StructuralTreeError> {
        let violations = validate_tree(&definition);
        if !violations.is_empty() {
            return Err(StructuralTreeError { violations });
        }
        let index = definition
            .questions
            .iter()
            .enumerate()
            .map(|(pos, q)| (q.id.clone(), pos))
            .collect();
        Ok(Self {
            root: definition.root,
            questions: definition.questions,
            index,
        })
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    pub fn question(&self, id: &NodeId) -> Option<&QuestionNode> {
        self.index.get(id).map(|pos| &self.questions[*pos])
    }

    pub fn questions(&self) -> &[QuestionNode] {
        &self.questions
    }

    /// Upper bound on the number of answers any path can consume.
    pub fn max_depth(&self) -> usize {
        self.questions.len()
    }

    pub fn terminal_keys(&self) -> BTreeSet<TerminalKey> {
        self.questions
            .iter()
            .flat_map(|q| q.options.iter())
            .filter_map(|o| match &o.next {
                NextStep::Terminal(key) => Some(key.clone()),
                NextStep::Question(_) => None,
            })
            .collect()
    }
}

impl TryFrom<TreeDefinition> for DecisionTree {
    type Error = StructuralTreeError;

    fn try_from(value: TreeDefinition) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DecisionTree> for TreeDefinition {
    fn from(value: DecisionTree) -> Self {
        Self {
            root: value.root,
            questions: value.questions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Evaluation {
    InProgress { node: NodeId },
    Done { terminal: TerminalKey },
}

impl Evaluation {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn terminal(&self) -> Option<&TerminalKey> {
        match self {
            Self::Done { terminal } => Some(terminal),
            Self::InProgress { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceStep {
    pub node: NodeId,
    pub prompt: String,
    pub answer_index: usize,
    pub answer_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionTrace {
    pub steps: Vec<TraceStep>,
    pub outcome: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error(
        "answer {index} at step {step} is not an option of question {node} ({option_count} options)"
    )]
    InvalidAnswerIndex {
        step: usize,
        node: NodeId,
        index: usize,
        option_count: usize,
    },
    #[error("answer at step {step} given after the path already reached {terminal}")]
    AnswerAfterTerminal { step: usize, terminal: TerminalKey },
    #[error("question {0} is not part of the tree")]
    UnknownNode(NodeId),
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{AnswerOption, DecisionTree, QuestionNode, TreeDefinition};

    /// Q1 yes -> a, no -> Q2; Q2 yes -> b, no -> c.
    pub fn two_question_definition() -> TreeDefinition {
        TreeDefinition {
            root: "q1".into(),
            questions: vec![
                QuestionNode::new("q1", "Is the document already well structured?")
                    .with_option(AnswerOption::to_terminal("Yes", "a"))
                    .with_option(AnswerOption::to_question("No", "q2")),
                QuestionNode::new("q2", "Do answers need surrounding context?")
                    .with_option(AnswerOption::to_terminal("Yes", "b"))
                    .with_option(AnswerOption::to_terminal("No", "c")),
            ],
        }
    }

    pub fn two_question_tree() -> DecisionTree {
        DecisionTree::new(two_question_definition()).expect("fixture tree is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{two_question_definition, two_question_tree};
    use super::*;

    #[test]
    fn collects_terminal_keys_and_depth() {
        let tree = two_question_tree();
        assert_eq!(tree.max_depth(), 2);
        let keys: Vec<_> = tree.terminal_keys().into_iter().map(|k| k.0).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn deserializing_runs_structural_validation() {
        let mut definition = two_question_definition();
        definition.questions[0].options[1].next = NextStep::Question("missing".into());
        let json = serde_json::to_string(&definition).expect("serialize definition");
        let parsed: Result<DecisionTree, _> = serde_json::from_str(&json);
        assert!(parsed.is_err());

        let json = serde_json::to_string(&two_question_definition()).expect("serialize");
        let tree: DecisionTree = serde_json::from_str(&json).expect("valid tree parses");
        assert_eq!(tree.root().as_str(), "q1");
    }

    #[test]
    fn next_step_uses_tagged_shape() {
        let option = AnswerOption::to_terminal("Yes", "fixed_size");
        let value = serde_json::to_value(&option).expect("serialize option");
        assert_eq!(value["next"]["terminal"], "fixed_size");
    }

    #[test]
    fn evaluation_state_is_kebab_case() {
        let pending = Evaluation::InProgress { node: "q1".into() };
        let value = serde_json::to_value(&pending).expect("serialize evaluation");
        assert_eq!(value["state"], "in-progress");
        assert_eq!(value["node"], "q1");

        let done = Evaluation::Done {
            terminal: "fixed_size".into(),
        };
        let value = serde_json::to_value(&done).expect("serialize evaluation");
        assert_eq!(value["state"], "done");
        assert_eq!(value["terminal"], "fixed_size");

        let restored: Evaluation = serde_json::from_value(value).expect("deserialize evaluation");
        assert_eq!(restored, done);
    }
}
