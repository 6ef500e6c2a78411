//! Playback API endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ractor::{ActorRef, RactorErr, RpcReplyPort};
use serde::Deserialize;
use shared_types::{Packet, PlaybackSnapshot, RequestResult, SubmissionAccepted};

use super::{error_response, json_rejection, parse_lane, ApiState};
use crate::actors::playback::{PlaybackError, PlaybackMsg, StepCommand};

/// Body of `POST /playback/request`
#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    pub packets: Vec<Packet>,
    pub threshold: Option<i64>,
}

/// Body of `POST /playback/load`
#[derive(Debug, Deserialize)]
pub struct LoadResultBody {
    pub result: RequestResult,
    pub packets: Vec<Packet>,
    pub threshold: Option<i64>,
}

fn actor_unavailable(e: RactorErr<PlaybackMsg>) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Playback actor unavailable: {e}"),
    )
}

/// Ask the actor for an updated snapshot and render it.
async fn snapshot_call<F>(playback: &ActorRef<PlaybackMsg>, build: F) -> Response
where
    F: FnOnce(RpcReplyPort<PlaybackSnapshot>) -> PlaybackMsg + Send,
{
    match ractor::call!(playback, build) {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => actor_unavailable(e),
    }
}

pub async fn get_snapshot(State(state): State<ApiState>) -> Response {
    snapshot_call(&state.playback, |reply| PlaybackMsg::GetSnapshot { reply }).await
}

pub async fn get_highlight(State(state): State<ApiState>) -> Response {
    match ractor::call!(state.playback, |reply| PlaybackMsg::GetHighlight { reply }) {
        Ok(highlight) => Json(highlight).into_response(),
        Err(e) => actor_unavailable(e),
    }
}

/// Submit a request for evaluation. Returns as soon as the call is in flight.
pub async fn submit_request(
    State(state): State<ApiState>,
    body: Result<Json<SubmitRequestBody>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = ractor::call!(state.playback, |reply| PlaybackMsg::SubmitRequest {
        packets: req.packets,
        threshold: req.threshold,
        reply,
    });

    match result {
        Ok(Ok(submission_id)) => (
            StatusCode::ACCEPTED,
            Json(SubmissionAccepted {
                success: true,
                submission_id,
            }),
        )
            .into_response(),
        Ok(Err(e @ PlaybackError::Busy)) => error_response(StatusCode::CONFLICT, e.to_string()),
        Ok(Err(e @ PlaybackError::InvalidRequest(_))) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(e @ PlaybackError::Evaluator(_))) => {
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
        Err(e) => actor_unavailable(e),
    }
}

pub async fn load_result(
    State(state): State<ApiState>,
    body: Result<Json<LoadResultBody>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    snapshot_call(&state.playback, |reply| PlaybackMsg::LoadRequestResult {
        result: req.result,
        packets: req.packets,
        threshold: req.threshold,
        reply,
    })
    .await
}

/// Indices that are negative or not numbers select nothing, like indices past
/// the packet list; the reply is the unchanged snapshot.
pub async fn select_packet(
    Path(index): Path<String>,
    State(state): State<ApiState>,
) -> Response {
    let Ok(index) = index.trim().parse::<usize>() else {
        tracing::debug!(index = %index, "Ignoring unparseable packet selection");
        return get_snapshot(State(state)).await;
    };
    snapshot_call(&state.playback, |reply| PlaybackMsg::SelectPacket {
        index,
        reply,
    })
    .await
}

pub async fn clear_selection(State(state): State<ApiState>) -> Response {
    snapshot_call(&state.playback, |reply| PlaybackMsg::ClearSelection { reply }).await
}

/// `POST /playback/{lane}/{command}` with lane `dfa` | `pda`
pub async fn step_lane(
    Path((lane, command)): Path<(String, String)>,
    State(state): State<ApiState>,
) -> Response {
    let lane = match parse_lane(&lane) {
        Ok(lane) => lane,
        Err(response) => return response,
    };
    let command: StepCommand = match command.parse() {
        Ok(command) => command,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("{e}")),
    };

    snapshot_call(&state.playback, |reply| PlaybackMsg::Step {
        lane,
        command,
        reply,
    })
    .await
}
