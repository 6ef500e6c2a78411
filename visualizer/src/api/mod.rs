//! HTTP API routes for the playback visualizer
//!
//! Bridges the PlaybackActor and the evaluator to a presentational UI.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ractor::ActorRef;
use serde_json::json;
use std::sync::Arc;

pub mod automata;
pub mod playback;

use crate::actors::playback::PlaybackMsg;
use crate::evaluator::{Evaluator, EvaluatorError};

#[derive(Clone)]
pub struct ApiState {
    pub playback: ActorRef<PlaybackMsg>,
    pub evaluator: Arc<dyn Evaluator>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        // Playback routes
        .route("/playback", get(playback::get_snapshot))
        .route("/playback/highlight", get(playback::get_highlight))
        .route("/playback/request", post(playback::submit_request))
        .route("/playback/load", post(playback::load_result))
        .route("/playback/select/{index}", post(playback::select_packet))
        .route("/playback/deselect", post(playback::clear_selection))
        .route("/playback/{lane}/{command}", post(playback::step_lane))
        // Evaluator pass-through routes
        .route("/graph/{lane}", get(automata::get_graph))
        .route("/grammar/{lane}", get(automata::get_grammar))
        .route("/derivation/{lane}", post(automata::post_derivation))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "visualizer",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": message.into()
        })),
    )
        .into_response()
}

pub(crate) fn json_rejection(rejection: JsonRejection) -> Response {
    error_response(rejection.status(), rejection.body_text())
}

pub(crate) fn evaluator_error_response(err: &EvaluatorError) -> Response {
    error_response(StatusCode::BAD_GATEWAY, err.to_string())
}

pub(crate) fn parse_lane(lane: &str) -> Result<shared_types::TraceKind, Response> {
    lane.parse()
        .map_err(|e: String| error_response(StatusCode::BAD_REQUEST, e))
}
