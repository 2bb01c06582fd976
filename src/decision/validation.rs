use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::{NextStep, NodeId, TreeDefinition};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeViolation {
    #[error("tree has no questions")]
    EmptyTree,
    #[error("root {root} is not a question in the tree")]
    MissingRoot { root: NodeId },
    #[error("question id {id} is defined more than once")]
    DuplicateNode { id: NodeId },
    #[error("question {id} has no options")]
    NoOptions { id: NodeId },
    #[error("option {option} of {from} points at missing question {target}")]
    DanglingReference {
        from: NodeId,
        option: usize,
        target: NodeId,
    },
    #[error("root {root} is the target of an answer from {parents:?}")]
    RootHasParent { root: NodeId, parents: Vec<NodeId> },
    #[error("question {id} has no parent and is not the root")]
    DetachedRoot { id: NodeId },
    #[error("question {id} cannot be reached from the root")]
    Unreachable { id: NodeId },
    #[error("cycle: {}", render_path(.path))]
    Cycle { path: Vec<NodeId> },
}

fn render_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn render_violations(violations: &[TreeViolation]) -> String {
    violations.iter().map(|v| format!("; {v}")).collect()
}

/// Every violation found while loading one tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{} structural error(s) in decision tree{}",
    .violations.len(),
    render_violations(.violations)
)]
pub struct StructuralTreeError {
    pub violations: Vec<TreeViolation>,
}

/// Reports all structural problems of `definition`. Empty means the tree has a
/// single root, no dangling references and no cycles.
pub fn validate_tree(definition: &TreeDefinition) -> Vec<TreeViolation> {
    let mut violations = Vec::new();
    if definition.questions.is_empty() {
        violations.push(TreeViolation::EmptyTree);
        return violations;
    }

    let mut order: Vec<&NodeId> = Vec::new();
    let mut adjacency: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for question in &definition.questions {
        if adjacency.contains_key(&question.id) {
            violations.push(TreeViolation::DuplicateNode {
                id: question.id.clone(),
            });
            continue;
        }
        order.push(&question.id);
        adjacency.insert(&question.id, Vec::new());
    }

    let root_known = adjacency.contains_key(&definition.root);
    if !root_known {
        violations.push(TreeViolation::MissingRoot {
            root: definition.root.clone(),
        });
    }

    let mut parents: BTreeMap<&NodeId, Vec<NodeId>> = BTreeMap::new();
    for question in &definition.questions {
        if question.options.is_empty() {
            violations.push(TreeViolation::NoOptions {
                id: question.id.clone(),
            });
        }
        for (option, answer) in question.options.iter().enumerate() {
            let NextStep::Question(target) = &answer.next else {
                continue;
            };
            let Some((known, _)) = adjacency.get_key_value(target) else {
                violations.push(TreeViolation::DanglingReference {
                    from: question.id.clone(),
                    option,
                    target: target.clone(),
                });
                continue;
            };
            let known = *known;
            parents.entry(known).or_default().push(question.id.clone());
            if let Some(edges) = adjacency.get_mut(&question.id) {
                edges.push(known);
            }
        }
    }

    let mut detached = BTreeSet::new();
    for id in &order {
        let has_parent = parents.contains_key(*id);
        if **id == definition.root {
            if let Some(from) = parents.get(*id) {
                violations.push(TreeViolation::RootHasParent {
                    root: (*id).clone(),
                    parents: from.clone(),
                });
            }
        } else if !has_parent {
            detached.insert(*id);
            violations.push(TreeViolation::DetachedRoot { id: (*id).clone() });
        }
    }

    if root_known {
        let reached = reachable_from(&definition.root, &adjacency);
        for id in &order {
            if !reached.contains(*id) && !detached.contains(*id) {
                violations.push(TreeViolation::Unreachable { id: (*id).clone() });
            }
        }
    }

    let mut visiting = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut path = Vec::new();
    for id in &order {
        if !visited.contains(*id) {
            find_cycles(
                *id,
                &adjacency,
                &mut visiting,
                &mut visited,
                &mut path,
                &mut violations,
            );
        }
    }

    violations
}

fn reachable_from<'a>(
    root: &'a NodeId,
    adjacency: &BTreeMap<&'a NodeId, Vec<&'a NodeId>>,
) -> BTreeSet<&'a NodeId> {
    let mut reached = BTreeSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if !reached.insert(node) {
            continue;
        }
        if let Some(next) = adjacency.get(node) {
            queue.extend(next.iter().copied());
        }
    }
    reached
}

fn find_cycles<'a>(
    node: &'a NodeId,
    adjacency: &BTreeMap<&'a NodeId, Vec<&'a NodeId>>,
    visiting: &mut BTreeSet<&'a NodeId>,
    visited: &mut BTreeSet<&'a NodeId>,
    path: &mut Vec<&'a NodeId>,
    violations: &mut Vec<TreeViolation>,
) {
    if visiting.contains(node) {
        if let Some(start) = path.iter().position(|n| *n == node) {
            let mut cycle: Vec<NodeId> = path[start..].iter().map(|n| (*n).clone()).collect();
            cycle.push(node.clone());
            violations.push(TreeViolation::Cycle { path: cycle });
        }
        return;
    }
    if visited.contains(node) {
        return;
    }

    visiting.insert(node);
    path.push(node);
    if let Some(next) = adjacency.get(node) {
        for target in next {
            find_cycles(*target, adjacency, visiting, visited, path, violations);
        }
    }
    path.pop();
    visiting.remove(node);
    visited.insert(node);
}
