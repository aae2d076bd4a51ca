//! Two-source reconciliation of validated answer maps.
//!
//! The primary response is authoritative: on disagreement it wins and the
//! secondary answer is advisory only. The single deliberate exception is
//! the fallback swap — a primary that parses to nothing must not win over
//! a secondary that produced answers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::{
    answers_equivalent, parse, validate, ConsensusReport, ConsensusStatus, TaskConsensus, TaskId,
    TaskSolution,
};

/// Parse a response and drop hallucinated tasks, keeping the audit trail.
///
/// The valid set is applied here rather than inside the parser so that the
/// rejected ids actually reach the report instead of being filtered away
/// twice.
fn extract_validated(
    text: &str,
    valid_tasks: &BTreeSet<TaskId>,
) -> (BTreeMap<TaskId, TaskSolution>, Vec<TaskId>) {
    validate(parse(text, None), valid_tasks)
}

/// Reconcile two model responses into a per-task consensus report.
///
/// `response_b` may be absent (the secondary model call failed); that
/// degrades to single-source reporting, never to an error. Tasks iterate
/// in ascending numeric order, which is the canonical output order for
/// everything downstream.
pub fn reconcile(
    valid_tasks: &BTreeSet<TaskId>,
    response_a: &str,
    response_b: Option<&str>,
) -> ConsensusReport {
    let (map_a, rejected_a) = extract_validated(response_a, valid_tasks);
    let (map_b, rejected_b) = match response_b {
        Some(text) => extract_validated(text, valid_tasks),
        None => Default::default(),
    };

    // Fallback swap: an unparseable primary must not silently win.
    let primary_swapped = map_a.is_empty() && !map_b.is_empty();
    let (primary, secondary, rejected_primary, rejected_secondary) = if primary_swapped {
        warn!("primary response yielded no tasks; promoting secondary response");
        (map_b, map_a, rejected_b, rejected_a)
    } else {
        (map_a, map_b, rejected_a, rejected_b)
    };

    let mut tasks = BTreeMap::new();
    for &task in valid_tasks {
        let consensus = match (primary.get(&task), secondary.get(&task)) {
            (Some(p), Some(s)) => {
                if answers_equivalent(&p.answer, &s.answer) {
                    TaskConsensus {
                        status: ConsensusStatus::Agree,
                        chosen: Some(p.clone()),
                    }
                } else {
                    warn!(
                        task,
                        primary = %p.answer,
                        secondary = %s.answer,
                        "sources disagree; keeping primary answer"
                    );
                    TaskConsensus {
                        status: ConsensusStatus::Disagree,
                        chosen: Some(p.clone()),
                    }
                }
            }
            (Some(p), None) => TaskConsensus {
                status: ConsensusStatus::SingleSource,
                chosen: Some(p.clone()),
            },
            (None, Some(s)) => TaskConsensus {
                status: ConsensusStatus::SingleSource,
                chosen: Some(s.clone()),
            },
            (None, None) => TaskConsensus {
                status: ConsensusStatus::None,
                chosen: None,
            },
        };
        tasks.insert(task, consensus);
    }

    let any_disagree = tasks
        .values()
        .any(|tc| tc.status == ConsensusStatus::Disagree);
    let any_answered = tasks.values().any(|tc| {
        matches!(
            tc.status,
            ConsensusStatus::Agree | ConsensusStatus::SingleSource
        )
    });
    let full_consensus = !any_disagree && any_answered;

    debug!(
        tasks = tasks.len(),
        full_consensus, primary_swapped, "reconciled model responses"
    );

    ConsensusReport {
        tasks,
        rejected_primary,
        rejected_secondary,
        primary_swapped,
        full_consensus,
    }
}
