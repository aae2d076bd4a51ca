//! Hallucination filtering against the OCR-derived task set.
//!
//! The OCR transcript of the uploaded page is the ground truth for which
//! task numbers exist. A model answer for any other number is a
//! fabrication and is dropped, but recorded so the caller can surface it.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::warn;

use super::{TaskId, TaskSolution};

/// Collect the set of legitimate task numbers from the OCR transcript.
///
/// Uses the same label-pattern family as the parser, but only harvests the
/// identifiers. The resulting set is established once per document and
/// read-only afterwards.
pub fn scan_valid_tasks(ocr_text: &str) -> BTreeSet<TaskId> {
    let patterns = [
        Regex::new(r"(?i)^\s*aufgabe\s*(\d+)").unwrap(),
        Regex::new(r"(?i)^\s*task\s*(\d+)").unwrap(),
        Regex::new(r"^\s*(\d+)\s*\.?\)").unwrap(),
        Regex::new(r"(?i)^\s*frage\s*(\d+)").unwrap(),
    ];

    let mut tasks = BTreeSet::new();
    for line in ocr_text.lines() {
        for pattern in &patterns {
            if let Some(caps) = pattern.captures(line) {
                if let Ok(task) = caps[1].parse::<TaskId>() {
                    tasks.insert(task);
                }
                break;
            }
        }
    }
    tasks
}

/// Split a parsed solution map into entries backed by the valid task set
/// and rejected (hallucinated) task ids.
pub fn validate(
    parsed: BTreeMap<TaskId, TaskSolution>,
    valid_tasks: &BTreeSet<TaskId>,
) -> (BTreeMap<TaskId, TaskSolution>, Vec<TaskId>) {
    let mut filtered = BTreeMap::new();
    let mut rejected = Vec::new();

    for (task, solution) in parsed {
        if valid_tasks.contains(&task) {
            filtered.insert(task, solution);
        } else {
            warn!(task, "rejecting solution for task absent from the document");
            rejected.push(task);
        }
    }

    (filtered, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_task_labels_out_of_ocr_text() {
        let ocr = "TASK 1: Berechnen Sie den Deckungsbeitrag | OPTIONS: A) 10 B) 20\n\
                   TASK 2: Prozesskostensatz | OPTIONS: A) 1,5 B) 2,5\n\
                   Aufgabe 3: Verrechnungspreise\n\
                   4) Kostenstellenrechnung";
        let tasks = scan_valid_tasks(ocr);
        assert_eq!(tasks.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn duplicate_labels_collapse() {
        let tasks = scan_valid_tasks("Aufgabe 2: a\nAufgabe 2: b\nFrage 1: c");
        assert_eq!(tasks.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn fabricated_tasks_are_rejected_but_reported() {
        let valid: BTreeSet<TaskId> = [1, 2, 3].into_iter().collect();
        let mut parsed = BTreeMap::new();
        parsed.insert(2, TaskSolution::new("B", ""));
        parsed.insert(4, TaskSolution::new("C", "erfunden"));

        let (filtered, rejected) = validate(parsed, &valid);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key(&2));
        assert_eq!(rejected, vec![4]);
    }

    #[test]
    fn prose_without_labels_yields_no_tasks() {
        assert!(scan_valid_tasks("Bitte beachten Sie die Hinweise zur Klausur.").is_empty());
    }
}
