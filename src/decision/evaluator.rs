use crate::decision::{
    DecisionError, DecisionTrace, DecisionTree, Evaluation, NextStep, TraceStep,
};

/// Walks `tree` from its root along `answers`. Pure: the caller owns the path.
pub fn evaluate(tree: &DecisionTree, answers: &[usize]) -> Result<Evaluation, DecisionError> {
    walk(tree, answers, |_| {})
}

/// Same walk as [`evaluate`], keeping the question and label chosen at each step.
pub fn trace(tree: &DecisionTree, answers: &[usize]) -> Result<DecisionTrace, DecisionError> {
    let mut steps = Vec::with_capacity(answers.len());
    let outcome = walk(tree, answers, |step| steps.push(step))?;
    Ok(DecisionTrace { steps, outcome })
}

fn walk(
    tree: &DecisionTree,
    answers: &[usize],
    mut on_step: impl FnMut(TraceStep),
) -> Result<Evaluation, DecisionError> {
    let mut current = tree.root().clone();

    for (step, &index) in answers.iter().enumerate() {
        let question = tree
            .question(&current)
            .ok_or_else(|| DecisionError::UnknownNode(current.clone()))?;
        let option = question
            .options
            .get(index)
            .ok_or_else(|| DecisionError::InvalidAnswerIndex {
                step,
                node: current.clone(),
                index,
                option_count: question.options.len(),
            })?;
        on_step(TraceStep {
            node: question.id.clone(),
            prompt: question.prompt.clone(),
            answer_index: index,
            answer_label: option.label.clone(),
        });

        match &option.next {
            NextStep::Question(next) => current = next.clone(),
            NextStep::Terminal(terminal) => {
                if answers.len() > step + 1 {
                    return Err(DecisionError::AnswerAfterTerminal {
                        step: step + 1,
                        terminal: terminal.clone(),
                    });
                }
                return Ok(Evaluation::Done {
                    terminal: terminal.clone(),
                });
            }
        }
    }

    Ok(Evaluation::InProgress { node: current })
}

#[cfg(test)]
mod tests {
    use crate::decision::fixtures::two_question_tree;
    use crate::decision::{evaluate, trace, DecisionError, Evaluation, NodeId, TerminalKey};

    fn done(key: &str) -> Evaluation {
        Evaluation::Done {
            terminal: TerminalKey::new(key),
        }
    }

    #[test]
    fn empty_path_starts_at_root() {
        let tree = two_question_tree();
        assert_eq!(
            evaluate(&tree, &[]).expect("root"),
            Evaluation::InProgress {
                node: NodeId::new("q1")
            }
        );
    }

    #[test]
    fn walks_two_question_tree_to_each_terminal() {
        let tree = two_question_tree();
        assert_eq!(evaluate(&tree, &[0]).expect("a"), done("a"));
        assert_eq!(evaluate(&tree, &[1, 0]).expect("b"), done("b"));
        assert_eq!(evaluate(&tree, &[1, 1]).expect("c"), done("c"));
        assert_eq!(
            evaluate(&tree, &[1]).expect("q2"),
            Evaluation::InProgress {
                node: NodeId::new("q2")
            }
        );
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let tree = two_question_tree();
        let err = evaluate(&tree, &[5]).expect_err("index 5 is out of range");
        assert_eq!(
            err,
            DecisionError::InvalidAnswerIndex {
                step: 0,
                node: NodeId::new("q1"),
                index: 5,
                option_count: 2,
            }
        );
        assert!(matches!(
            evaluate(&tree, &[1, 2]),
            Err(DecisionError::InvalidAnswerIndex { step: 1, .. })
        ));
    }

    #[test]
    fn rejects_answers_past_a_terminal() {
        let tree = two_question_tree();
        let err = evaluate(&tree, &[0, 0]).expect_err("path continues past terminal a");
        assert_eq!(
            err,
            DecisionError::AnswerAfterTerminal {
                step: 1,
                terminal: TerminalKey::new("a"),
            }
        );
    }

    #[test]
    fn going_back_is_truncation() {
        let tree = two_question_tree();
        let mut path = vec![1, 1];
        assert_eq!(evaluate(&tree, &path).expect("c"), done("c"));
        path.pop();
        assert!(!evaluate(&tree, &path).expect("q2").is_done());
        path.clear();
        assert_eq!(
            evaluate(&tree, &path).expect("root"),
            evaluate(&tree, &[]).expect("root")
        );
    }

    #[test]
    fn trace_records_labels_along_the_path() {
        let tree = two_question_tree();
        let result = trace(&tree, &[1, 0]).expect("trace");
        let labels: Vec<_> = result
            .steps
            .iter()
            .map(|s| (s.node.as_str(), s.answer_label.as_str()))
            .collect();
        assert_eq!(labels, vec![("q1", "No"), ("q2", "Yes")]);
        assert_eq!(result.outcome, done("b"));
    }

    #[test]
    fn repeated_and_interleaved_calls_agree() {
        let tree = two_question_tree();
        let paths: [&[usize]; 4] = [&[], &[0], &[1, 0], &[1, 1]];
        let first: Vec<_> = paths.iter().map(|p| evaluate(&tree, p)).collect();
        for _ in 0..3 {
            for (path, expected) in paths.iter().rev().zip(first.iter().rev()) {
                assert_eq!(&evaluate(&tree, path), expected);
            }
        }
    }
}
