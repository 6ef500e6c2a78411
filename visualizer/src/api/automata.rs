//! Graph, grammar and derivation endpoints
//!
//! Thin pass-through to the evaluator, decorated with what the graph view
//! needs: grouped edges, the active element, a fallback grammar and
//! classified derivation tokens.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shared_types::{GraphData, Packet, TraceKind, ViewMode};

use super::{
    error_response, evaluator_error_response, json_rejection, parse_lane, ApiState,
};
use crate::actors::playback::PlaybackMsg;
use crate::grammar::{
    dfa_grammar_from_graph, pda_grammar_from_graph, tokenize_derivation, DerivationToken,
};
use crate::graph::{find_active_edge, group_edges, is_accepting, GroupedEdge};

#[derive(Debug, Serialize)]
pub struct GraphView {
    pub graph: GraphData,
    pub edges: Vec<GroupedEdge>,
    /// Set when this lane is the one being visualized
    pub active_node_id: Option<String>,
    pub active_edge_id: Option<String>,
    pub active_node_accepting: bool,
}

#[derive(Debug, Serialize)]
pub struct GrammarView {
    pub rules: Vec<String>,
    /// Rules were derived from the graph because the grammar endpoint failed
    pub fallback: bool,
}

/// `{ "packet": … }` for DFA, `{ "packets": [...] }` for PDA
#[derive(Debug, Deserialize)]
pub struct DerivationBody {
    pub packet: Option<Packet>,
    pub packets: Option<Vec<Packet>>,
}

#[derive(Debug, Serialize)]
pub struct DerivationView {
    pub steps: Vec<String>,
    pub tokens: Vec<Vec<DerivationToken>>,
}

fn lane_matches(kind: TraceKind, view: ViewMode) -> bool {
    matches!(
        (kind, view),
        (TraceKind::Dfa, ViewMode::Dfa) | (TraceKind::Pda, ViewMode::Pda)
    )
}

pub async fn get_graph(Path(lane): Path<String>, State(state): State<ApiState>) -> Response {
    let kind = match parse_lane(&lane) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let graph = match state.evaluator.fetch_graph(kind).await {
        Ok(graph) => graph,
        Err(e) => return evaluator_error_response(&e),
    };

    let edges = group_edges(&graph);
    let highlight = match ractor::call!(state.playback, |reply| PlaybackMsg::GetSnapshot {
        reply
    }) {
        Ok(snapshot) if lane_matches(kind, snapshot.view) => Some(snapshot.highlight),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Playback actor unavailable; graph served without highlight");
            None
        }
    };

    let active_edge_id = highlight.as_ref().and_then(|h| {
        find_active_edge(&edges, h.active_edge.as_ref()).map(|edge| edge.id.clone())
    });
    let active_node_accepting = highlight
        .as_ref()
        .is_some_and(|h| is_accepting(&graph, &h.active_node_id));

    Json(GraphView {
        active_node_id: highlight.map(|h| h.active_node_id),
        active_edge_id,
        active_node_accepting,
        edges,
        graph,
    })
    .into_response()
}

pub async fn get_grammar(Path(lane): Path<String>, State(state): State<ApiState>) -> Response {
    let kind = match parse_lane(&lane) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let grammar_err = match state.evaluator.fetch_grammar(kind).await {
        Ok(grammar) => {
            return Json(GrammarView {
                rules: grammar.rules,
                fallback: false,
            })
            .into_response()
        }
        Err(e) => e,
    };

    tracing::warn!(
        lane = kind.as_str(),
        error = %grammar_err,
        "Grammar fetch failed; deriving rules from graph"
    );
    match state.evaluator.fetch_graph(kind).await {
        Ok(graph) => {
            let rules = match kind {
                TraceKind::Dfa => dfa_grammar_from_graph(&graph),
                TraceKind::Pda => pda_grammar_from_graph(&graph),
            };
            Json(GrammarView {
                rules,
                fallback: true,
            })
            .into_response()
        }
        Err(_) => evaluator_error_response(&grammar_err),
    }
}

pub async fn post_derivation(
    Path(lane): Path<String>,
    State(state): State<ApiState>,
    body: Result<Json<DerivationBody>, JsonRejection>,
) -> Response {
    let kind = match parse_lane(&lane) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let result = match (kind, body) {
        (
            TraceKind::Dfa,
            DerivationBody {
                packet: Some(packet),
                ..
            },
        ) => state.evaluator.derivation(&packet).await,
        (
            TraceKind::Pda,
            DerivationBody {
                packets: Some(packets),
                ..
            },
        ) if !packets.is_empty() => state.evaluator.pda_derivation(&packets).await,
        (TraceKind::Dfa, _) => {
            return error_response(StatusCode::BAD_REQUEST, "DFA derivation needs a packet")
        }
        (TraceKind::Pda, _) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "PDA derivation needs a non-empty packet list",
            )
        }
    };

    match result {
        Ok(derivation) => {
            let tokens = derivation
                .steps
                .iter()
                .map(|step| tokenize_derivation(step))
                .collect();
            Json(DerivationView {
                steps: derivation.steps,
                tokens,
            })
            .into_response()
        }
        Err(e) => evaluator_error_response(&e),
    }
}
