use serde::{Deserialize, Serialize};

use crate::decision::{evaluate, DecisionError, DecisionTree, Evaluation};

/// Caller-owned answer path. Holds nothing but the indices chosen so far, so it
/// can be stored, replayed or rewound freely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionSession {
    answers: Vec<usize>,
}

impl DecisionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_answers(answers: Vec<usize>) -> Self {
        Self { answers }
    }

    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    pub fn current(&self, tree: &DecisionTree) -> Result<Evaluation, DecisionError> {
        evaluate(tree, &self.answers)
    }

    /// Records `index` only if the extended path evaluates cleanly.
    pub fn answer(
        &mut self,
        tree: &DecisionTree,
        index: usize,
    ) -> Result<Evaluation, DecisionError> {
        self.answers.push(index);
        match evaluate(tree, &self.answers) {
            Ok(evaluation) => Ok(evaluation),
            Err(err) => {
                self.answers.pop();
                Err(err)
            }
        }
    }

    pub fn back(&mut self) -> Option<usize> {
        self.answers.pop()
    }

    pub fn restart(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::DecisionSession;
    use crate::decision::fixtures::two_question_tree;
    use crate::decision::{DecisionError, Evaluation, NodeId, TerminalKey};

    #[test]
    fn answers_back_and_restart() {
        let tree = two_question_tree();
        let mut session = DecisionSession::new();

        let step = session.answer(&tree, 1).expect("valid answer");
        assert_eq!(
            step,
            Evaluation::InProgress {
                node: NodeId::new("q2")
            }
        );
        let step = session.answer(&tree, 1).expect("valid answer");
        assert_eq!(step.terminal(), Some(&TerminalKey::new("c")));
        assert_eq!(session.answers(), &[1, 1]);

        assert_eq!(session.back(), Some(1));
        let step = session.answer(&tree, 0).expect("valid answer");
        assert_eq!(step.terminal(), Some(&TerminalKey::new("b")));

        session.restart();
        assert!(session.answers().is_empty());
        assert_eq!(
            session.current(&tree).expect("root"),
            Evaluation::InProgress {
                node: NodeId::new("q1")
            }
        );
    }

    #[test]
    fn rejected_answer_leaves_path_untouched() {
        let tree = two_question_tree();
        let mut session = DecisionSession::from_answers(vec![1]);
        let err = session.answer(&tree, 9).expect_err("index 9 is out of range");
        assert!(matches!(err, DecisionError::InvalidAnswerIndex { .. }));
        assert_eq!(session.answers(), &[1]);

        session.answer(&tree, 0).expect("valid answer");
        assert!(session.answer(&tree, 0).is_err());
        assert_eq!(session.answers(), &[1, 0]);
    }
}
