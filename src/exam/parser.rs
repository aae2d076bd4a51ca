//! Line-oriented extraction of task/answer pairs from model output.
//!
//! The answer model is asked for `Aufgabe N: answer / Begründung: text`
//! lines, but real responses drift: English labels, numbered lists, stray
//! prose. The parser tolerates all of it and simply yields whatever tasks
//! it can recognize; unparseable text produces an empty map, never an
//! error.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::warn;

use super::{normalize_answer, TaskId, TaskSolution};

/// A recognized task label: the task number plus the trailing answer text.
struct TaskLabel {
    task: TaskId,
    rest: String,
}

/// Label patterns in fixed priority order; the first match on a line wins,
/// so a line can never be processed by two patterns.
fn label_patterns() -> Vec<Regex> {
    vec![
        // "Aufgabe 3: B" (requested format)
        Regex::new(r"(?i)^\s*aufgabe\s*(\d+)\s*[:.]?\s*(.*)$").unwrap(),
        // "Task 3: B" (the OCR extraction format)
        Regex::new(r"(?i)^\s*task\s*(\d+)\s*[:.]?\s*(.*)$").unwrap(),
        // "3.)" / "3)" numbered-list style
        Regex::new(r"^\s*(\d+)\s*\.?\)\s*(.*)$").unwrap(),
        // "Lösung 3: B" alternate German label
        Regex::new(r"(?i)^\s*lösung\s*(\d+)\s*[:.]?\s*(.*)$").unwrap(),
    ]
}

fn match_label(patterns: &[Regex], line: &str) -> Option<TaskLabel> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(line) {
            // A capture that overflows TaskId is OCR noise, not a task.
            let task = caps[1].parse::<TaskId>().ok()?;
            return Some(TaskLabel {
                task,
                rest: caps[2].trim().to_string(),
            });
        }
    }
    None
}

/// Scan free text for task labels and collect per-task solutions.
///
/// When `valid_tasks` is given, a label whose number is not in the set is
/// discarded on the spot (logged as a hallucinated task) and no task is
/// opened for it; the lines that follow are ignored until the next valid
/// label. Tasks whose normalized answer is empty are dropped rather than
/// emitted as empty entries.
pub fn parse(text: &str, valid_tasks: Option<&BTreeSet<TaskId>>) -> BTreeMap<TaskId, TaskSolution> {
    let patterns = label_patterns();
    let begruendung = Regex::new(r"(?i)^\s*begründung\s*:\s*(.*)$").unwrap();

    fn finalize(
        open: Option<(TaskId, String, Vec<String>)>,
        solutions: &mut BTreeMap<TaskId, TaskSolution>,
    ) {
        if let Some((task, answer, reasoning)) = open {
            if !answer.is_empty() {
                solutions.insert(task, TaskSolution::new(answer, reasoning.join("\n")));
            }
        }
    }

    let mut solutions = BTreeMap::new();
    let mut current: Option<(TaskId, String, Vec<String>)> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(label) = match_label(&patterns, line) {
            finalize(current.take(), &mut solutions);

            if let Some(valid) = valid_tasks {
                if !valid.contains(&label.task) {
                    warn!(task = label.task, "discarding hallucinated task label");
                    continue;
                }
            }

            current = Some((label.task, normalize_answer(&label.rest), Vec::new()));
            continue;
        }

        if let Some(caps) = begruendung.captures(line) {
            if let Some((_, _, reasoning)) = current.as_mut() {
                // An explicit justification marker replaces anything
                // accumulated so far for this task.
                *reasoning = vec![caps[1].trim().to_string()];
            }
            continue;
        }

        if let Some((_, _, reasoning)) = current.as_mut() {
            reasoning.push(line.trim().to_string());
        }
        // Text before the first recognized label is ignored.
    }

    finalize(current.take(), &mut solutions);
    solutions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(ids: &[TaskId]) -> BTreeSet<TaskId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn parses_requested_format() {
        let text = "Aufgabe 1: B\nBegründung: Skript 2023 S.45\n\nAufgabe 2: 22,5\nBegründung: Einheit 2 S.12";
        let solutions = parse(text, None);

        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[&1].answer, "B");
        assert_eq!(solutions[&1].reasoning, "Skript 2023 S.45");
        assert_eq!(solutions[&2].answer, "22,5");
    }

    #[test]
    fn tolerates_alternate_labels() {
        let text = "Task 1: A\nLösung 2: C\n3) 17,5\n4.) D";
        let solutions = parse(text, None);

        assert_eq!(solutions[&1].answer, "A");
        assert_eq!(solutions[&2].answer, "C");
        assert_eq!(solutions[&3].answer, "17,5");
        assert_eq!(solutions[&4].answer, "D");
    }

    #[test]
    fn first_pattern_wins_on_ambiguous_lines() {
        // "Aufgabe 5: ..." also contains a digit but must only ever be
        // processed by the Aufgabe pattern.
        let solutions = parse("Aufgabe 5: B", None);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[&5].answer, "B");
    }

    #[test]
    fn reasoning_accumulates_until_next_label() {
        let text = "Aufgabe 1: B\nweil die Fixkosten\nnicht anteilig sind\nAufgabe 2: A";
        let solutions = parse(text, None);

        assert_eq!(
            solutions[&1].reasoning,
            "weil die Fixkosten\nnicht anteilig sind"
        );
        assert_eq!(solutions[&2].answer, "A");
    }

    #[test]
    fn begruendung_marker_replaces_prior_reasoning() {
        let text = "Aufgabe 1: B\nvorläufige Notiz\nBegründung: die eigentliche Begründung";
        let solutions = parse(text, None);

        assert_eq!(solutions[&1].reasoning, "die eigentliche Begründung");
    }

    #[test]
    fn hallucinated_labels_are_discarded_without_opening_a_task() {
        let text = "Aufgabe 1: B\nAufgabe 9: C\nBegründung: erfunden";
        let solutions = parse(text, Some(&valid(&[1, 2])));

        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[&1].answer, "B");
        // The stray justification belongs to no open task.
        assert_eq!(solutions[&1].reasoning, "");
    }

    #[test]
    fn empty_answers_are_dropped() {
        let solutions = parse("Aufgabe 1:\nBegründung: ohne Antwort", None);
        assert!(solutions.is_empty());
    }

    #[test]
    fn unstructured_prose_yields_empty_map() {
        let text = "Ich kann diese Klausur leider nicht lösen.\nBitte laden Sie ein besseres Bild hoch.";
        assert!(parse(text, None).is_empty());
    }

    #[test]
    fn preamble_before_first_label_is_ignored() {
        let text = "Hier sind die Lösungen:\nAufgabe 2: D";
        let solutions = parse(text, None);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[&2].answer, "D");
    }
}
