use std::sync::Arc;

use ractor::call;
use shared_types::{CursorPosition, PlaybackSnapshot, TraceKind, ViewMode};
use tokio::sync::Notify;

use crate::actors::playback::{PlaybackError, PlaybackMsg, StepCommand};
use crate::evaluator::EvaluatorError;

use super::support::{
    sample_packets, sample_result, setup_test_playback, snapshot, wait_for_snapshot,
    StubEvaluator,
};

#[tokio::test]
async fn test_playback_actor_spawn_uses_graph_start() {
    let evaluator = Arc::new(StubEvaluator::new(Ok(sample_result(&[false], 1))));
    let playback_ref = setup_test_playback(evaluator).await;

    let snapshot = wait_for_snapshot(&playback_ref, |s| s.last_known_state == "s0").await;
    assert_eq!(snapshot.view, ViewMode::None);
    assert_eq!(snapshot.highlight.active_node_id, "s0");

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_submit_request_loads_result() {
    let evaluator = Arc::new(StubEvaluator::new(Ok(sample_result(&[true, false], 2))));
    let playback_ref = setup_test_playback(evaluator.clone()).await;

    let submitted: Result<Result<String, PlaybackError>, _> =
        call!(playback_ref, |reply| PlaybackMsg::SubmitRequest {
            packets: sample_packets(2),
            threshold: Some(1),
            reply,
        });
    let submission_id = submitted.unwrap().expect("accepted");
    assert_eq!(submission_id.len(), 26);

    let snapshot = wait_for_snapshot(&playback_ref, |s| s.verdict.is_some()).await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.view, ViewMode::Pda);
    let verdict = snapshot.verdict.expect("verdict");
    assert!(verdict.is_malicious);
    assert_eq!(verdict.suspicious, vec![true, false]);

    let sent = evaluator.requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].threshold, 1);

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_submit_while_loading_is_busy_but_navigation_works() {
    let gate = Arc::new(Notify::new());
    let evaluator = Arc::new(StubEvaluator::gated(
        Ok(sample_result(&[false], 2)),
        gate.clone(),
    ));
    let playback_ref = setup_test_playback(evaluator).await;

    let _ = call!(playback_ref, |reply| PlaybackMsg::LoadRequestResult {
        result: sample_result(&[false], 3),
        packets: sample_packets(1),
        threshold: None,
        reply,
    })
    .unwrap();

    let first = call!(playback_ref, |reply| PlaybackMsg::SubmitRequest {
        packets: sample_packets(1),
        threshold: None,
        reply,
    })
    .unwrap();
    assert!(first.is_ok());

    let second = call!(playback_ref, |reply| PlaybackMsg::SubmitRequest {
        packets: sample_packets(1),
        threshold: None,
        reply,
    })
    .unwrap();
    assert_eq!(second, Err(PlaybackError::Busy));

    let stepped: PlaybackSnapshot = call!(playback_ref, |reply| PlaybackMsg::Step {
        lane: TraceKind::Pda,
        command: StepCommand::Next,
        reply,
    })
    .unwrap();
    assert!(stepped.loading);
    assert_eq!(stepped.pda.expect("pda").index, 0);

    gate.notify_one();
    let snapshot = wait_for_snapshot(&playback_ref, |s| !s.loading).await;
    let pda = snapshot.pda.expect("pda");
    assert_eq!(pda.length, 2);
    assert_eq!(pda.index, -1);

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_evaluator_failure_keeps_previous_request() {
    let evaluator = Arc::new(StubEvaluator::new(Err(EvaluatorError::Status {
        status: 502,
        message: "evaluator offline".to_string(),
    })));
    let playback_ref = setup_test_playback(evaluator).await;

    let loaded: PlaybackSnapshot = call!(playback_ref, |reply| PlaybackMsg::LoadRequestResult {
        result: sample_result(&[true], 2),
        packets: sample_packets(1),
        threshold: Some(1),
        reply,
    })
    .unwrap();

    let _ = call!(playback_ref, |reply| PlaybackMsg::SubmitRequest {
        packets: sample_packets(3),
        threshold: None,
        reply,
    })
    .unwrap()
    .expect("accepted");

    let snapshot = wait_for_snapshot(&playback_ref, |s| s.last_error.is_some()).await;
    assert_eq!(snapshot.last_error.as_deref(), Some("evaluator offline"));
    assert_eq!(snapshot.packets, loaded.packets);
    assert_eq!(snapshot.pda, loaded.pda);
    assert_eq!(snapshot.verdict, loaded.verdict);

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_select_packet_twice_returns_to_pda_view() {
    let evaluator = Arc::new(StubEvaluator::new(Ok(sample_result(&[false], 1))));
    let playback_ref = setup_test_playback(evaluator).await;

    let _ = call!(playback_ref, |reply| PlaybackMsg::LoadRequestResult {
        result: sample_result(&[false, true], 2),
        packets: sample_packets(2),
        threshold: None,
        reply,
    })
    .unwrap();

    let selected = call!(playback_ref, |reply| PlaybackMsg::SelectPacket {
        index: 1,
        reply
    })
    .unwrap();
    assert_eq!(selected.view, ViewMode::Dfa);
    assert_eq!(selected.highlight.active_node_id, "s0");

    let toggled = call!(playback_ref, |reply| PlaybackMsg::SelectPacket {
        index: 1,
        reply
    })
    .unwrap();
    assert_eq!(toggled.view, ViewMode::Pda);
    assert_eq!(toggled.selected_packet, None);

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_autoplay_runs_to_finished_and_stops() {
    let evaluator = Arc::new(StubEvaluator::new(Ok(sample_result(&[false], 1))));
    let playback_ref = setup_test_playback(evaluator).await;

    let _ = call!(playback_ref, |reply| PlaybackMsg::LoadRequestResult {
        result: sample_result(&[false], 2),
        packets: sample_packets(1),
        threshold: None,
        reply,
    })
    .unwrap();

    let playing = call!(playback_ref, |reply| PlaybackMsg::Step {
        lane: TraceKind::Pda,
        command: StepCommand::Play,
        reply,
    })
    .unwrap();
    assert!(playing.pda.expect("pda").is_playing);

    let finished = wait_for_snapshot(&playback_ref, |s| {
        s.pda.as_ref().is_some_and(|lane| !lane.is_playing)
    })
    .await;
    let pda = finished.pda.expect("pda");
    assert_eq!(pda.position, CursorPosition::Finished);
    assert_eq!(pda.index, 2);

    let highlight = call!(playback_ref, |reply| PlaybackMsg::GetHighlight { reply }).unwrap();
    assert_eq!(highlight.active_node_id, "q2");
    assert_eq!(highlight.active_edge, None);

    playback_ref.stop(None);
}

#[tokio::test]
async fn test_clear_selection_discards_dfa_lane() {
    let evaluator = Arc::new(StubEvaluator::new(Ok(sample_result(&[false], 1))));
    let playback_ref = setup_test_playback(evaluator).await;

    let _ = call!(playback_ref, |reply| PlaybackMsg::LoadRequestResult {
        result: sample_result(&[false], 1),
        packets: sample_packets(1),
        threshold: None,
        reply,
    })
    .unwrap();
    let _ = call!(playback_ref, |reply| PlaybackMsg::SelectPacket {
        index: 0,
        reply
    })
    .unwrap();

    let cleared = call!(playback_ref, |reply| PlaybackMsg::ClearSelection { reply }).unwrap();
    assert!(cleared.dfa.is_none());
    assert_eq!(cleared.view, ViewMode::Pda);
    assert_eq!(snapshot(&playback_ref).await.selected_packet, None);

    playback_ref.stop(None);
}
