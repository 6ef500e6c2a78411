//! Selection and playback state owned by the PlaybackActor.
//!
//! The controller is plain synchronous state. The actor serializes access to
//! it; timers only reach it as [`AutoplayTick`] values that are checked
//! against the live trace before anything moves.

use chrono::{DateTime, Utc};
use shared_types::{
    DfaResult, Highlight, LaneSnapshot, Packet, PacketField, PdaResult, PlaybackSnapshot,
    ProcessRequest, RequestResult, RequestVerdict, StepDetail, TraceId, TraceKind, ViewMode,
};

use super::autoplay::{AutoplayScheduler, AutoplayTick, TickSink};
use super::protocol::{PlaybackError, StepCommand};
use crate::aggregation::aggregate_verdict;
use crate::config::PlaybackSettings;
use crate::cursor::{Advance, Cursor, ResetPosition};
use crate::highlight::{resolve_highlight, ActiveTrace};
use crate::trace::Trace;

/// What a timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    /// The cursor was already finished; autoplay has been switched off.
    Stopped,
    /// The tick belongs to a replaced trace or a cancelled scheduler.
    Stale,
}

/// A submission accepted for evaluation.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub request: ProcessRequest,
}

// ── Lanes ────────────────────────────────────────────────────────────────────

/// A loaded trace, its cursor and at most one autoplay timer.
struct Lane {
    trace_id: TraceId,
    trace: Trace,
    cursor: Cursor,
    autoplay: Option<AutoplayScheduler>,
}

impl Lane {
    fn attach(trace: Trace, start: i64, reset_to: ResetPosition) -> Self {
        let trace_id = TraceId::new();
        for issue in trace.validate() {
            tracing::warn!(
                trace_id = %trace_id,
                kind = trace.kind().as_str(),
                issue = %issue,
                "Trace violates evaluator invariants"
            );
        }

        let mut cursor = Cursor::new(trace.len(), reset_to);
        cursor.seek(start);
        tracing::debug!(
            trace_id = %trace_id,
            kind = trace.kind().as_str(),
            len = trace.len(),
            index = cursor.index(),
            "Trace attached"
        );

        Self {
            trace_id,
            trace,
            cursor,
            autoplay: None,
        }
    }

    fn is_playing(&self) -> bool {
        self.autoplay.is_some()
    }

    fn stop_autoplay(&mut self) {
        if self.autoplay.take().is_some() {
            tracing::debug!(trace_id = %self.trace_id, "Autoplay stopped");
        }
    }

    fn snapshot(&self) -> LaneSnapshot {
        let detail = match &self.trace {
            Trace::Dfa(result) => Some(dfa_detail(result, &self.cursor)),
            Trace::Pda(result) => pda_detail(result, &self.cursor),
        };
        LaneSnapshot {
            trace_id: self.trace_id.clone(),
            index: self.cursor.index(),
            length: self.cursor.len(),
            position: self.cursor.position(),
            can_next: self.cursor.can_next(),
            can_prev: self.cursor.can_prev(),
            is_playing: self.is_playing(),
            progress: self.cursor.progress(self.trace.kind()),
            detail,
        }
    }
}

fn dfa_detail(result: &DfaResult, cursor: &Cursor) -> StepDetail {
    let active_field = match cursor.position() {
        shared_types::CursorPosition::AtStep { index } => PacketField::for_step(index),
        _ => None,
    };
    let outcome = cursor
        .is_finished()
        .then(|| String::from(if result.is_malicious { "malicious" } else { "benign" }));
    StepDetail::Dfa {
        active_field,
        outcome,
    }
}

// Before the first operation there is nothing to describe. Past the end the
// last operation stays on screen.
fn pda_detail(result: &PdaResult, cursor: &Cursor) -> Option<StepDetail> {
    let index = usize::try_from(cursor.index()).ok()?;
    let last = result.trace.len().checked_sub(1)?;
    let op = result.trace.get(index.min(last))?;
    let (field, value) = PacketField::decode_symbol(&op.symbol);
    let outcome = (index >= last)
        .then(|| String::from(if result.is_valid { "accepted" } else { "rejected" }));

    Some(StepDetail::Pda {
        action: op.action.clone(),
        symbol: op.symbol.clone(),
        field,
        field_value: value.to_string(),
        stack: op.stack.clone(),
        top_of_stack: op.stack.last().cloned(),
        outcome,
    })
}

// ── Controller ───────────────────────────────────────────────────────────────

struct LoadedRequest {
    result: RequestResult,
    packets: Vec<Packet>,
    verdict: RequestVerdict,
    loaded_at: DateTime<Utc>,
}

struct PendingSubmission {
    id: String,
    packets: Vec<Packet>,
    threshold: i64,
}

pub struct PlaybackController {
    settings: PlaybackSettings,
    sink: TickSink,
    generation: u64,
    request: Option<LoadedRequest>,
    selected: Option<usize>,
    dfa: Option<Lane>,
    pda: Option<Lane>,
    last_known_state: String,
    /// Set once a finished DFA trace has supplied the last-known state
    state_from_trace: bool,
    pending: Option<PendingSubmission>,
    last_error: Option<String>,
}

impl PlaybackController {
    pub fn new(settings: PlaybackSettings, sink: TickSink) -> Self {
        let last_known_state = settings.fallback_state.clone();
        Self {
            settings,
            sink,
            generation: 0,
            request: None,
            selected: None,
            dfa: None,
            pda: None,
            last_known_state,
            state_from_trace: false,
            pending: None,
            last_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_known_state(&self) -> &str {
        &self.last_known_state
    }

    /// Use the DFA graph's start node as the resting highlight, unless a
    /// finished trace has already provided one.
    pub fn set_initial_state(&mut self, state: String) {
        if self.state_from_trace || state.is_empty() {
            return;
        }
        self.last_known_state = state;
    }

    // ── Submission lifecycle ─────────────────────────────────────────────

    pub fn begin_submission(
        &mut self,
        packets: Vec<Packet>,
        threshold: Option<i64>,
    ) -> Result<Submission, PlaybackError> {
        if self.pending.is_some() {
            return Err(PlaybackError::Busy);
        }
        if packets.is_empty() {
            return Err(PlaybackError::InvalidRequest(
                "packet list is empty".to_string(),
            ));
        }

        let threshold = threshold.unwrap_or(self.settings.default_threshold);
        let id = ulid::Ulid::new().to_string();
        self.pending = Some(PendingSubmission {
            id: id.clone(),
            packets: packets.clone(),
            threshold,
        });
        Ok(Submission {
            id,
            request: ProcessRequest { packets, threshold },
        })
    }

    /// Apply an evaluator response. Returns `false` when the response does
    /// not belong to the pending submission and was dropped.
    pub fn complete_submission(
        &mut self,
        submission_id: &str,
        result: Result<RequestResult, PlaybackError>,
    ) -> bool {
        let pending = match self.pending.take() {
            Some(pending) if pending.id == submission_id => pending,
            other => {
                self.pending = other;
                tracing::debug!(submission_id, "Dropping response for superseded submission");
                return false;
            }
        };

        match result {
            Ok(result) => self.attach_request(result, pending.packets, pending.threshold),
            Err(err) => {
                tracing::warn!(submission_id, error = %err, "Request evaluation failed");
                self.last_error = Some(err.to_string());
            }
        }
        true
    }

    /// Replace the active request. Any in-flight submission is superseded.
    pub fn load_request_result(
        &mut self,
        result: RequestResult,
        packets: Vec<Packet>,
        threshold: Option<i64>,
    ) {
        if let Some(pending) = self.pending.take() {
            tracing::info!(submission_id = %pending.id, "Pending submission superseded");
        }
        let threshold = threshold.unwrap_or(self.settings.default_threshold);
        self.attach_request(result, packets, threshold);
    }

    fn attach_request(&mut self, result: RequestResult, packets: Vec<Packet>, threshold: i64) {
        if result.packets.len() != packets.len() {
            tracing::warn!(
                submitted = packets.len(),
                returned = result.packets.len(),
                "Evaluator returned a different number of packet results"
            );
        }

        let verdict = aggregate_verdict(&result, packets.len(), threshold);
        let pda = Lane::attach(
            Trace::Pda(result.pda.clone()),
            self.settings.reset_position.index(),
            self.settings.reset_position,
        );
        tracing::info!(
            trace_id = %pda.trace_id,
            packets = packets.len(),
            detections = verdict.detections,
            malicious = verdict.is_malicious,
            "Request result loaded"
        );

        self.selected = None;
        self.dfa = None;
        self.pda = Some(pda);
        self.request = Some(LoadedRequest {
            result,
            packets,
            verdict,
            loaded_at: Utc::now(),
        });
        self.last_error = None;
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Show packet `index`'s DFA trace, or return to the request view when it
    /// is already selected. Invalid indices are ignored.
    pub fn select_packet(&mut self, index: usize) {
        if self.selected == Some(index) {
            self.clear_selection();
            return;
        }

        let Some(request) = &self.request else {
            tracing::debug!(index, "Ignoring selection without a loaded request");
            return;
        };
        let Some(result) = request
            .result
            .packets
            .get(index)
            .filter(|_| index < request.packets.len())
        else {
            tracing::debug!(index, "Ignoring out-of-range packet selection");
            return;
        };

        let lane = Lane::attach(Trace::Dfa(result.clone()), 0, self.settings.reset_position);
        self.selected = Some(index);
        self.dfa = Some(lane);
        if let Some(pda) = self.pda.as_mut() {
            pda.stop_autoplay();
        }
        self.note_dfa_position();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.dfa = None;
    }

    // ── Navigation & autoplay ────────────────────────────────────────────

    fn lane(&self, kind: TraceKind) -> Option<&Lane> {
        match kind {
            TraceKind::Dfa => self.dfa.as_ref(),
            TraceKind::Pda => self.pda.as_ref(),
        }
    }

    fn lane_mut(&mut self, kind: TraceKind) -> Option<&mut Lane> {
        match kind {
            TraceKind::Dfa => self.dfa.as_mut(),
            TraceKind::Pda => self.pda.as_mut(),
        }
    }

    pub fn is_playing(&self, kind: TraceKind) -> bool {
        self.lane(kind).is_some_and(Lane::is_playing)
    }

    /// Apply a command to one lane. Commands on an empty lane are no-ops.
    pub fn step(&mut self, kind: TraceKind, command: StepCommand) {
        match command {
            StepCommand::Next => {
                if let Some(lane) = self.lane_mut(kind) {
                    lane.cursor.next();
                }
            }
            StepCommand::Prev => {
                if let Some(lane) = self.lane_mut(kind) {
                    lane.cursor.prev();
                }
            }
            StepCommand::Reset => {
                if let Some(lane) = self.lane_mut(kind) {
                    lane.stop_autoplay();
                    lane.cursor.reset();
                }
            }
            StepCommand::Play => self.play(kind),
            StepCommand::Pause => self.pause(kind),
            StepCommand::Toggle => {
                if self.is_playing(kind) {
                    self.pause(kind);
                } else {
                    self.play(kind);
                }
            }
        }
        if kind == TraceKind::Dfa {
            self.note_dfa_position();
        }
    }

    fn play(&mut self, kind: TraceKind) {
        let interval = self.settings.autoplay_interval();
        let generation = self.generation + 1;
        let sink = self.sink.clone();
        let Some(lane) = self.lane_mut(kind) else {
            return;
        };
        if lane.is_playing() {
            return;
        }

        let tick = AutoplayTick {
            lane: kind,
            trace_id: lane.trace_id.clone(),
            generation,
        };
        lane.autoplay = Some(AutoplayScheduler::arm(interval, tick, sink));
        tracing::info!(
            trace_id = %lane.trace_id,
            lane = kind.as_str(),
            generation,
            interval_ms = interval.as_millis() as u64,
            "Autoplay started"
        );
        self.generation = generation;
    }

    fn pause(&mut self, kind: TraceKind) {
        if let Some(lane) = self.lane_mut(kind) {
            lane.stop_autoplay();
        }
    }

    pub fn on_tick(&mut self, tick: &AutoplayTick) -> TickOutcome {
        let Some(lane) = self.lane_mut(tick.lane) else {
            tracing::debug!(lane = tick.lane.as_str(), "Tick for empty lane ignored");
            return TickOutcome::Stale;
        };
        let live = lane.trace_id == tick.trace_id
            && lane.autoplay.as_ref().map(AutoplayScheduler::generation) == Some(tick.generation);
        if !live {
            tracing::debug!(
                trace_id = %tick.trace_id,
                generation = tick.generation,
                "Stale autoplay tick ignored"
            );
            return TickOutcome::Stale;
        }

        let outcome = match lane.cursor.next() {
            Advance::Moved => TickOutcome::Advanced,
            Advance::AlreadyFinished => {
                lane.autoplay = None;
                tracing::info!(trace_id = %lane.trace_id, "Autoplay reached end of trace");
                TickOutcome::Stopped
            }
        };
        if tick.lane == TraceKind::Dfa {
            self.note_dfa_position();
        }
        outcome
    }

    fn note_dfa_position(&mut self) {
        let Some(lane) = &self.dfa else {
            return;
        };
        if !lane.cursor.is_finished() {
            return;
        }
        if let Trace::Dfa(result) = &lane.trace {
            if !result.final_state.is_empty() {
                self.last_known_state.clone_from(&result.final_state);
                self.state_from_trace = true;
            }
        }
    }

    /// Cancel both timers. No tick is acted on afterwards.
    pub fn shutdown(&mut self) {
        for lane in [self.dfa.as_mut(), self.pda.as_mut()].into_iter().flatten() {
            lane.stop_autoplay();
        }
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn view(&self) -> ViewMode {
        if self.dfa.is_some() {
            ViewMode::Dfa
        } else if self.pda.is_some() {
            ViewMode::Pda
        } else {
            ViewMode::None
        }
    }

    pub fn highlight(&self) -> Highlight {
        let active = self
            .dfa
            .as_ref()
            .or(self.pda.as_ref())
            .map(|lane| ActiveTrace {
                trace: &lane.trace,
                index: lane.cursor.index(),
            });
        resolve_highlight(active, &self.last_known_state)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            view: self.view(),
            selected_packet: self.selected,
            packets: self
                .request
                .as_ref()
                .map(|request| request.packets.clone())
                .unwrap_or_default(),
            dfa: self.dfa.as_ref().map(Lane::snapshot),
            pda: self.pda.as_ref().map(Lane::snapshot),
            highlight: self.highlight(),
            verdict: self.request.as_ref().map(|request| request.verdict.clone()),
            loading: self.is_loading(),
            last_error: self.last_error.clone(),
            last_known_state: self.last_known_state.clone(),
            loaded_at: self.request.as_ref().map(|request| request.loaded_at),
        }
    }
}
