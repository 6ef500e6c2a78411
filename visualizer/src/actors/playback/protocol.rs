//! PlaybackActor message protocol
//!
//! Every state transition of the controller is one of these messages, so all
//! of them are serialized through the actor's mailbox.

use ractor::RpcReplyPort;
use shared_types::{Highlight, Packet, PlaybackSnapshot, RequestResult, TraceKind};

use super::autoplay::AutoplayTick;
use crate::evaluator::EvaluatorError;

/// Messages handled by PlaybackActor
#[derive(Debug)]
pub enum PlaybackMsg {
    /// Send a request to the evaluator. Replies with the submission id once
    /// the call is in flight; the result arrives as `RequestCompleted`.
    SubmitRequest {
        packets: Vec<Packet>,
        threshold: Option<i64>,
        reply: RpcReplyPort<Result<String, PlaybackError>>,
    },
    /// Evaluator response for a submission
    RequestCompleted {
        submission_id: String,
        result: Result<RequestResult, PlaybackError>,
    },
    /// Load an already computed result directly
    LoadRequestResult {
        result: RequestResult,
        packets: Vec<Packet>,
        threshold: Option<i64>,
        reply: RpcReplyPort<PlaybackSnapshot>,
    },
    SelectPacket {
        index: usize,
        reply: RpcReplyPort<PlaybackSnapshot>,
    },
    ClearSelection {
        reply: RpcReplyPort<PlaybackSnapshot>,
    },
    Step {
        lane: TraceKind,
        command: StepCommand,
        reply: RpcReplyPort<PlaybackSnapshot>,
    },
    /// Autoplay timer firing
    Tick(AutoplayTick),
    /// Start node of the DFA graph, once fetched
    SetInitialState { state: String },
    GetSnapshot {
        reply: RpcReplyPort<PlaybackSnapshot>,
    },
    GetHighlight {
        reply: RpcReplyPort<Highlight>,
    },
}

/// Navigation and autoplay commands for one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    Next,
    Prev,
    Reset,
    Play,
    Pause,
    Toggle,
}

impl std::str::FromStr for StepCommand {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "reset" => Ok(Self::Reset),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "toggle" => Ok(Self::Toggle),
            other => Err(PlaybackError::InvalidRequest(format!(
                "unknown playback command: {other}"
            ))),
        }
    }
}

/// Errors that can occur in PlaybackActor
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// A submission is already waiting for the evaluator
    #[error("a request is already being processed")]
    Busy,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
}
