//! PlaybackActor - serializes every playback state transition
//!
//! The PlaybackActor is responsible for:
//! - Forwarding request submissions to the evaluator off the mailbox
//! - Routing navigation, selection and autoplay commands to the controller
//! - Arming autoplay timers that report back through `PlaybackMsg::Tick`
//! - Cancelling all timers when it stops

use std::sync::Arc;

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use shared_types::{Packet, TraceKind};

use super::autoplay::TickSink;
use super::controller::{PlaybackController, TickOutcome};
use super::protocol::{PlaybackError, PlaybackMsg};
use crate::config::PlaybackSettings;
use crate::evaluator::Evaluator;
use crate::graph::start_node;

/// PlaybackActor - owns the playback controller
#[derive(Debug, Default)]
pub struct PlaybackActor;

/// Arguments for spawning PlaybackActor
#[derive(Clone)]
pub struct PlaybackArguments {
    pub evaluator: Arc<dyn Evaluator>,
    pub settings: PlaybackSettings,
}

/// Internal state for PlaybackActor
pub struct PlaybackState {
    controller: PlaybackController,
    evaluator: Arc<dyn Evaluator>,
}

#[async_trait]
impl Actor for PlaybackActor {
    type Msg = PlaybackMsg;
    type State = PlaybackState;
    type Arguments = PlaybackArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(actor_id = %myself.get_id(), "PlaybackActor starting");

        let tick_ref = myself.clone();
        let sink: TickSink = Arc::new(move |tick| tick_ref.cast(PlaybackMsg::Tick(tick)).is_ok());

        Ok(PlaybackState {
            controller: PlaybackController::new(args.settings, sink),
            evaluator: args.evaluator,
        })
    }

    async fn post_start(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        // The DFA start node becomes the resting highlight once known.
        let evaluator = state.evaluator.clone();
        let start_ref = myself.clone();
        tokio::spawn(async move {
            match evaluator.fetch_graph(TraceKind::Dfa).await {
                Ok(graph) => {
                    if let Some(node) = start_node(&graph) {
                        let _ = start_ref.cast(PlaybackMsg::SetInitialState {
                            state: node.id.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not fetch DFA graph start node");
                }
            }
        });

        tracing::info!(actor_id = %myself.get_id(), "PlaybackActor started successfully");
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PlaybackMsg::SubmitRequest {
                packets,
                threshold,
                reply,
            } => {
                let result = self.handle_submit(myself, state, packets, threshold);
                let _ = reply.send(result);
            }
            PlaybackMsg::RequestCompleted {
                submission_id,
                result,
            } => {
                state.controller.complete_submission(&submission_id, result);
            }
            PlaybackMsg::LoadRequestResult {
                result,
                packets,
                threshold,
                reply,
            } => {
                state
                    .controller
                    .load_request_result(result, packets, threshold);
                let _ = reply.send(state.controller.snapshot());
            }
            PlaybackMsg::SelectPacket { index, reply } => {
                state.controller.select_packet(index);
                let _ = reply.send(state.controller.snapshot());
            }
            PlaybackMsg::ClearSelection { reply } => {
                state.controller.clear_selection();
                let _ = reply.send(state.controller.snapshot());
            }
            PlaybackMsg::Step {
                lane,
                command,
                reply,
            } => {
                state.controller.step(lane, command);
                let _ = reply.send(state.controller.snapshot());
            }
            PlaybackMsg::Tick(tick) => {
                if state.controller.on_tick(&tick) == TickOutcome::Stopped {
                    tracing::debug!(lane = tick.lane.as_str(), "Autoplay finished");
                }
            }
            PlaybackMsg::SetInitialState { state: node } => {
                state.controller.set_initial_state(node);
            }
            PlaybackMsg::GetSnapshot { reply } => {
                let _ = reply.send(state.controller.snapshot());
            }
            PlaybackMsg::GetHighlight { reply } => {
                let _ = reply.send(state.controller.highlight());
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.controller.shutdown();
        tracing::info!(actor_id = %myself.get_id(), "PlaybackActor stopped");
        Ok(())
    }
}

impl PlaybackActor {
    /// Register the submission and run the evaluator call in a task; the
    /// mailbox keeps serving navigation while it is in flight.
    fn handle_submit(
        &self,
        myself: ActorRef<PlaybackMsg>,
        state: &mut PlaybackState,
        packets: Vec<Packet>,
        threshold: Option<i64>,
    ) -> Result<String, PlaybackError> {
        let submission = state.controller.begin_submission(packets, threshold)?;
        tracing::info!(
            submission_id = %submission.id,
            packets = submission.request.packets.len(),
            threshold = submission.request.threshold,
            "Submitting request to evaluator"
        );

        let evaluator = state.evaluator.clone();
        let submission_id = submission.id.clone();
        tokio::spawn(async move {
            let result = evaluator
                .process_request(&submission.request)
                .await
                .map_err(PlaybackError::from);
            let _ = myself.cast(PlaybackMsg::RequestCompleted {
                submission_id: submission.id,
                result,
            });
        });

        Ok(submission_id)
    }
}
