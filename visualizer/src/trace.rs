//! Trace model consumed by the playback controller.
//!
//! Evaluator results are wrapped in a tagged [`Trace`] so the cursor,
//! highlight resolver and snapshot builder handle DFA steps and PDA stack
//! operations through one type.

use shared_types::{ActiveEdge, DfaResult, DfaStep, PdaResult, StackOperation, TraceKind};

/// An owned evaluator trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trace {
    Dfa(DfaResult),
    Pda(PdaResult),
}

/// One element of a trace, borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePoint<'a> {
    Dfa(&'a DfaStep),
    Pda(&'a StackOperation),
}

/// Invariant violations found in a trace returned by the evaluator.
///
/// These are reported, not enforced: the controller replays what it is given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceIssue {
    #[error("step {index} starts in {found} but step {prev} ended in {expected}")]
    Discontinuity {
        index: usize,
        prev: usize,
        expected: String,
        found: String,
    },
    #[error("final state {final_state} does not match last transition target {last_target}")]
    FinalStateMismatch {
        final_state: String,
        last_target: String,
    },
    #[error("operation {position} carries step_index {found}")]
    StepIndexGap { position: usize, found: i64 },
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl<'a> TracePoint<'a> {
    pub fn current_state(&self) -> Option<&'a str> {
        match self {
            Self::Dfa(step) => non_empty(&step.current_state),
            Self::Pda(op) => op.current_state.as_deref().and_then(non_empty),
        }
    }

    pub fn next_state(&self) -> Option<&'a str> {
        match self {
            Self::Dfa(step) => non_empty(&step.next_state),
            Self::Pda(op) => op.next_state.as_deref().and_then(non_empty),
        }
    }

    /// Edge taken by this point, when both endpoints are known.
    pub fn edge(&self) -> Option<ActiveEdge> {
        match (self.current_state(), self.next_state()) {
            (Some(source), Some(target)) => Some(ActiveEdge {
                source: source.to_string(),
                target: target.to_string(),
            }),
            _ => None,
        }
    }
}

impl Trace {
    pub fn kind(&self) -> TraceKind {
        match self {
            Self::Dfa(_) => TraceKind::Dfa,
            Self::Pda(_) => TraceKind::Pda,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Dfa(result) => result.steps.len(),
            Self::Pda(result) => result.trace.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, index: usize) -> Option<TracePoint<'_>> {
        match self {
            Self::Dfa(result) => result.steps.get(index).map(TracePoint::Dfa),
            Self::Pda(result) => result.trace.get(index).map(TracePoint::Pda),
        }
    }

    /// Point at a signed cursor index; `None` outside `[0, N)`.
    pub fn point_at(&self, index: i64) -> Option<TracePoint<'_>> {
        usize::try_from(index).ok().and_then(|i| self.point(i))
    }

    pub fn last_point(&self) -> Option<TracePoint<'_>> {
        self.len().checked_sub(1).and_then(|i| self.point(i))
    }

    pub fn validate(&self) -> Vec<TraceIssue> {
        match self {
            Self::Dfa(result) => validate_dfa(result),
            Self::Pda(result) => validate_pda(result),
        }
    }
}

fn validate_dfa(result: &DfaResult) -> Vec<TraceIssue> {
    let mut issues = Vec::new();
    for (index, pair) in result.steps.windows(2).enumerate() {
        if pair[1].current_state != pair[0].next_state {
            issues.push(TraceIssue::Discontinuity {
                index: index + 1,
                prev: index,
                expected: pair[0].next_state.clone(),
                found: pair[1].current_state.clone(),
            });
        }
    }
    if let Some(last) = result.steps.last() {
        if last.next_state != result.final_state {
            issues.push(TraceIssue::FinalStateMismatch {
                final_state: result.final_state.clone(),
                last_target: last.next_state.clone(),
            });
        }
    }
    issues
}

fn validate_pda(result: &PdaResult) -> Vec<TraceIssue> {
    result
        .trace
        .iter()
        .enumerate()
        .filter(|(position, op)| op.step_index != *position as i64)
        .map(|(position, op)| TraceIssue::StepIndexGap {
            position,
            found: op.step_index,
        })
        .collect()
}
