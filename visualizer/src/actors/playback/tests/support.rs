use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ractor::{call, Actor, ActorRef};
use shared_types::{
    DerivationResponse, DfaResult, DfaStep, GrammarResponse, GraphData, GraphNode, Packet,
    PdaResult, PlaybackSnapshot, ProcessRequest, RequestResult, StackOperation, TraceKind,
};
use tokio::sync::Notify;

use crate::actors::playback::{PlaybackActor, PlaybackArguments, PlaybackMsg};
use crate::config::PlaybackSettings;
use crate::evaluator::{Evaluator, EvaluatorError};

/// In-memory evaluator. `process_request` waits on `gate` when one is set.
pub(crate) struct StubEvaluator {
    pub graph: Result<GraphData, EvaluatorError>,
    pub result: Mutex<Result<RequestResult, EvaluatorError>>,
    pub gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<ProcessRequest>>,
}

impl StubEvaluator {
    pub(crate) fn new(result: Result<RequestResult, EvaluatorError>) -> Self {
        Self {
            graph: Ok(GraphData {
                nodes: vec![GraphNode {
                    id: "s0".to_string(),
                    label: "s0".to_string(),
                    is_accepting: false,
                    is_start: true,
                }],
                edges: vec![],
            }),
            result: Mutex::new(result),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn gated(result: Result<RequestResult, EvaluatorError>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(result)
        }
    }
}

#[async_trait]
impl Evaluator for StubEvaluator {
    async fn fetch_graph(&self, _kind: TraceKind) -> Result<GraphData, EvaluatorError> {
        self.graph.clone()
    }

    async fn fetch_grammar(&self, _kind: TraceKind) -> Result<GrammarResponse, EvaluatorError> {
        Ok(GrammarResponse::default())
    }

    async fn process_request(
        &self,
        request: &ProcessRequest,
    ) -> Result<RequestResult, EvaluatorError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.lock().expect("result lock").clone()
    }

    async fn derivation(&self, _packet: &Packet) -> Result<DerivationResponse, EvaluatorError> {
        Ok(DerivationResponse::default())
    }

    async fn pda_derivation(
        &self,
        _packets: &[Packet],
    ) -> Result<DerivationResponse, EvaluatorError> {
        Ok(DerivationResponse::default())
    }
}

pub(crate) fn sample_result(flags: &[bool], pda_ops: usize) -> RequestResult {
    RequestResult {
        pda: PdaResult {
            is_valid: true,
            trace: (0..pda_ops)
                .map(|i| StackOperation {
                    step_index: i as i64,
                    action: "push".to_string(),
                    symbol: "service=http".to_string(),
                    stack: vec!["Z0".to_string()],
                    current_state: Some(format!("q{i}")),
                    next_state: Some(format!("q{}", i + 1)),
                })
                .collect(),
        },
        packets: flags
            .iter()
            .map(|flag| DfaResult {
                steps: vec![
                    DfaStep {
                        current_state: "s0".to_string(),
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
                is_malicious: *flag,
                label: String::new(),
            })
            .collect(),
        is_malicious: None,
    }
}

pub(crate) fn sample_packets(n: usize) -> Vec<Packet> {
    (0..n).map(|_| Packet::new("tcp", "http", "SF")).collect()
}

pub(crate) async fn setup_test_playback(
    evaluator: Arc<StubEvaluator>,
) -> ActorRef<PlaybackMsg> {
    let args = PlaybackArguments {
        evaluator,
        settings: PlaybackSettings {
            autoplay_interval_ms: 50,
            ..PlaybackSettings::default()
        },
    };
    let (playback_ref, _handle) = Actor::spawn(None, PlaybackActor, args).await.unwrap();
    playback_ref
}

pub(crate) async fn snapshot(playback: &ActorRef<PlaybackMsg>) -> PlaybackSnapshot {
    call!(playback, |reply| PlaybackMsg::GetSnapshot { reply }).unwrap()
}

/// Poll the actor until `predicate` holds or two seconds pass.
pub(crate) async fn wait_for_snapshot(
    playback: &ActorRef<PlaybackMsg>,
    predicate: impl Fn(&PlaybackSnapshot) -> bool,
) -> PlaybackSnapshot {
    for _ in 0..200 {
        let current = snapshot(playback).await;
        if predicate(&current) {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("playback never reached expected state: {:?}", snapshot(playback).await);
}
