//! Structured answer extraction and cross-validation.
//!
//! This module is the algorithmic core of the service: it turns free-text
//! model output into a per-task answer map, filters hallucinated task
//! numbers against the OCR-derived task set, and reconciles two
//! independently produced answer sets into a consensus report.
//!
//! Everything here is synchronous and pure; the network-facing glue lives
//! in `llm` and `pipeline`.

mod consensus;
mod normalize;
mod parser;
mod validate;

pub use consensus::reconcile;
pub use normalize::{answers_equivalent, normalize_answer};
pub use parser::parse;
pub use validate::{scan_valid_tasks, validate};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number labeling one exam sub-question ("Aufgabe 6" has task id 6).
pub type TaskId = u32;

/// One extracted answer: the normalized answer text plus the justification
/// lines that followed it in the model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSolution {
    /// Normalized answer (sorted letter set, numeric string, or verbatim text).
    pub answer: String,
    /// Justification text, joined from the lines following the answer.
    #[serde(default)]
    pub reasoning: String,
    /// Optional step-by-step working, when a caller attaches it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_steps: Option<Vec<String>>,
    /// Optional assumptions the solution relies on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
}

impl TaskSolution {
    pub fn new(answer: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            reasoning: reasoning.into(),
            detailed_steps: None,
            assumptions: None,
        }
    }
}

/// Per-task agreement between the two model responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusStatus {
    /// Both sources answered and the answers are equivalent.
    Agree,
    /// Both sources answered but the answers differ; the primary answer is kept.
    Disagree,
    /// Only one source produced an answer for this task.
    SingleSource,
    /// Neither source answered this task.
    None,
}

/// Consensus outcome for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConsensus {
    pub status: ConsensusStatus,
    /// The selected solution; `None` only when `status` is [`ConsensusStatus::None`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<TaskSolution>,
}

/// Full reconciliation result for one document, in ascending task order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusReport {
    /// Per-task outcome for every task in the valid set.
    pub tasks: BTreeMap<TaskId, TaskConsensus>,
    /// Hallucinated task ids dropped from the primary response.
    pub rejected_primary: Vec<TaskId>,
    /// Hallucinated task ids dropped from the secondary response.
    pub rejected_secondary: Vec<TaskId>,
    /// True when the primary response parsed to nothing and the secondary
    /// took its place (fallback-swap policy).
    pub primary_swapped: bool,
    /// True when no task disagrees and at least one task was answered.
    pub full_consensus: bool,
}

impl ConsensusReport {
    /// Iterate over the tasks that ended up with a chosen solution.
    pub fn answered(&self) -> impl Iterator<Item = (TaskId, &TaskSolution)> {
        self.tasks
            .iter()
            .filter_map(|(id, tc)| tc.chosen.as_ref().map(|sol| (*id, sol)))
    }
}

/// Render a solution map back into the canonical
/// `Aufgabe N: answer / Begründung: text` line format.
///
/// Re-parsing the rendered text yields the same map, modulo reasoning
/// whitespace (the format is structurally, not byte-wise, round-trippable).
pub fn render_solutions(solutions: &BTreeMap<TaskId, TaskSolution>) -> String {
    let mut out = String::new();
    for (task, solution) in solutions {
        out.push_str(&format!("Aufgabe {}: {}\n", task, solution.answer));
        if !solution.reasoning.is_empty() {
            out.push_str(&format!("Begründung: {}\n", solution.reasoning));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_then_parse_is_structurally_lossless() {
        let mut solutions = BTreeMap::new();
        solutions.insert(1, TaskSolution::new("AB", "Skript 2023 S.45"));
        solutions.insert(3, TaskSolution::new("22,5", "Einheit 2 S.12\nZeile 4"));
        solutions.insert(7, TaskSolution::new("42", ""));

        let rendered = render_solutions(&solutions);
        let reparsed = parse(&rendered, None);

        assert_eq!(reparsed, solutions);
    }

    #[test]
    fn answered_skips_unanswered_tasks() {
        let mut tasks = BTreeMap::new();
        tasks.insert(
            1,
            TaskConsensus {
                status: ConsensusStatus::Agree,
                chosen: Some(TaskSolution::new("A", "")),
            },
        );
        tasks.insert(
            2,
            TaskConsensus {
                status: ConsensusStatus::None,
                chosen: None,
            },
        );
        let report = ConsensusReport {
            tasks,
            rejected_primary: vec![],
            rejected_secondary: vec![],
            primary_swapped: false,
            full_consensus: true,
        };

        let answered: Vec<TaskId> = report.answered().map(|(id, _)| id).collect();
        assert_eq!(answered, vec![1]);
    }
}
