//! Highlight resolution for the graph view.
//!
//! Maps the active trace, its cursor index and a fallback state to the node
//! and edge the graph should highlight. Pure: identical inputs always give
//! identical output.

use shared_types::{Highlight, TraceKind};

use crate::trace::Trace;

/// The trace currently driving the graph view, with its cursor index.
#[derive(Debug, Clone, Copy)]
pub struct ActiveTrace<'a> {
    pub trace: &'a Trace,
    pub index: i64,
}

pub fn resolve_highlight(active: Option<ActiveTrace<'_>>, fallback: &str) -> Highlight {
    let Some(ActiveTrace { trace, index }) = active else {
        return idle(fallback);
    };
    match trace.kind() {
        TraceKind::Dfa => resolve_dfa(trace, index, fallback),
        TraceKind::Pda if trace.is_empty() => idle(fallback),
        TraceKind::Pda => resolve_pda(trace, index, fallback),
    }
}

fn idle(fallback: &str) -> Highlight {
    Highlight {
        active_node_id: fallback.to_string(),
        active_edge: None,
    }
}

// DFA playback shows the state the current step leaves from, and the final
// state once the cursor is past the last transition.
fn resolve_dfa(trace: &Trace, index: i64, fallback: &str) -> Highlight {
    if index >= trace.len() as i64 {
        let final_state = match trace {
            Trace::Dfa(result) if !result.final_state.is_empty() => result.final_state.as_str(),
            _ => fallback,
        };
        return idle(final_state);
    }

    match trace.point_at(index) {
        Some(point) => Highlight {
            active_node_id: point.current_state().unwrap_or(fallback).to_string(),
            active_edge: point.edge(),
        },
        None => idle(fallback),
    }
}

// PDA stack snapshots already reflect the operation at index i, so the last
// operation shows its destination while earlier ones show their origin.
fn resolve_pda(trace: &Trace, index: i64, fallback: &str) -> Highlight {
    if index < 0 {
        return idle(fallback);
    }

    let last = trace.len() as i64 - 1;
    if index > last {
        let node = trace
            .last_point()
            .and_then(|point| point.next_state().or_else(|| point.current_state()))
            .unwrap_or(fallback);
        return idle(node);
    }

    let Some(point) = trace.point_at(index) else {
        return idle(fallback);
    };
    let node = if index == last {
        point.next_state().or_else(|| point.current_state())
    } else {
        point.current_state().or_else(|| point.next_state())
    };
    Highlight {
        active_node_id: node.unwrap_or(fallback).to_string(),
        active_edge: point.edge(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ActiveEdge, DfaResult, DfaStep, PdaResult, StackOperation};

    fn dfa_trace() -> Trace {
        Trace::Dfa(DfaResult {
            steps: vec![
                DfaStep {
                    current_state: "s4".to_string(),
                    symbol: "tcp".to_string(),
                    next_state: "s1".to_string(),
                },
                DfaStep {
                    current_state: "s1".to_string(),
                    symbol: "http".to_string(),
                    next_state: "s2".to_string(),
                },
            ],
            final_state: "s2".to_string(),
            is_malicious: false,
            label: "normal".to_string(),
        })
    }

    fn pda_op(index: i64, current: Option<&str>, next: Option<&str>) -> StackOperation {
        StackOperation {
            step_index: index,
            action: "push".to_string(),
            symbol: "proto=tcp".to_string(),
            stack: vec!["Z0".to_string()],
            current_state: current.map(ToString::to_string),
            next_state: next.map(ToString::to_string),
        }
    }

    fn edge(source: &str, target: &str) -> Option<ActiveEdge> {
        Some(ActiveEdge {
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    #[test]
    fn test_no_active_trace_uses_fallback() {
        let highlight = resolve_highlight(None, "s4");
        assert_eq!(highlight.active_node_id, "s4");
        assert_eq!(highlight.active_edge, None);
    }

    #[test]
    fn test_dfa_mid_trace_highlights_origin_and_edge() {
        let trace = dfa_trace();
        let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 1 }), "x");
        assert_eq!(highlight.active_node_id, "s1");
        assert_eq!(highlight.active_edge, edge("s1", "s2"));
    }

    #[test]
    fn test_dfa_unstarted_uses_fallback() {
        let trace = dfa_trace();
        let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index: -1 }), "s0");
        assert_eq!(highlight.active_node_id, "s0");
        assert_eq!(highlight.active_edge, None);
    }

    #[test]
    fn test_dfa_finished_highlights_final_state_without_edge() {
        let trace = dfa_trace();
        let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 2 }), "x");
        assert_eq!(highlight.active_node_id, "s2");
        assert_eq!(highlight.active_edge, None);
    }

    #[test]
    fn test_empty_dfa_trace_finishes_on_final_state() {
        let trace = Trace::Dfa(DfaResult {
            steps: vec![],
            final_state: String::new(),
            is_malicious: false,
            label: String::new(),
        });
        let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 0 }), "s4");
        assert_eq!(highlight.active_node_id, "s4");
    }

    #[test]
    fn test_single_operation_pda_scenario() {
        let trace = Trace::Pda(PdaResult {
            is_valid: true,
            trace: vec![pda_op(0, Some("Start"), Some("A"))],
        });

        let before = resolve_highlight(Some(ActiveTrace { trace: &trace, index: -1 }), "q_fallback");
        assert_eq!(before.active_node_id, "q_fallback");
        assert_eq!(before.active_edge, None);

        let last = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 0 }), "q_fallback");
        assert_eq!(last.active_node_id, "A");
        assert_eq!(last.active_edge, edge("Start", "A"));

        let finished = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 1 }), "q_fallback");
        assert_eq!(finished.active_node_id, "A");
        assert_eq!(finished.active_edge, None);
    }

    #[test]
    fn test_pda_mid_trace_prefers_origin() {
        let trace = Trace::Pda(PdaResult {
            is_valid: true,
            trace: vec![
                pda_op(0, Some("q0"), Some("q1")),
                pda_op(1, None, Some("q2")),
                pda_op(2, Some("q2"), Some("q3")),
            ],
        });

        let first = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 0 }), "f");
        assert_eq!(first.active_node_id, "q0");
        assert_eq!(first.active_edge, edge("q0", "q1"));

        let missing_origin = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 1 }), "f");
        assert_eq!(missing_origin.active_node_id, "q2");
        assert_eq!(missing_origin.active_edge, None);
    }

    #[test]
    fn test_pda_without_states_falls_back() {
        let trace = Trace::Pda(PdaResult {
            is_valid: false,
            trace: vec![pda_op(0, None, None)],
        });
        for index in [-1, 0, 1] {
            let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index }), "f");
            assert_eq!(highlight.active_node_id, "f");
            assert_eq!(highlight.active_edge, None);
        }
    }

    #[test]
    fn test_empty_pda_trace_uses_fallback() {
        let trace = Trace::Pda(PdaResult {
            is_valid: true,
            trace: vec![],
        });
        let highlight = resolve_highlight(Some(ActiveTrace { trace: &trace, index: 0 }), "s4");
        assert_eq!(highlight.active_node_id, "s4");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let trace = dfa_trace();
        for index in -1..=3 {
            let a = resolve_highlight(Some(ActiveTrace { trace: &trace, index }), "s4");
            let b = resolve_highlight(Some(ActiveTrace { trace: &trace, index }), "s4");
            assert_eq!(a, b);
        }
    }
}
