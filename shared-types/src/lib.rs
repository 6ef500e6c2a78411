//! Shared types between the playback controller and its UI
//!
//! These types are used by both:
//! - the evaluator client and playback actor (native Rust)
//! - the presentational UI (via generated TypeScript bindings)
//!
//! Serializable with serde for JSON over HTTP

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Core Types
// ============================================================================

/// Identity of one loaded trace.
///
/// A fresh id is minted every time a trace is attached to a cursor, so timer
/// ticks captured against an older trace can be told apart from live ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct TraceId(pub String);

impl TraceId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which evaluator a trace came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum TraceKind {
    Dfa,
    Pda,
}

impl TraceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dfa => "dfa",
            Self::Pda => "pda",
        }
    }
}

impl std::str::FromStr for TraceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfa" => Ok(Self::Dfa),
            "pda" => Ok(Self::Pda),
            other => Err(format!("unknown trace kind: {other}")),
        }
    }
}

// ============================================================================
// Evaluator Input
// ============================================================================

/// A symbol to be classified. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct Packet {
    pub proto: String,
    pub service: String,
    pub conn_state: String,
}

impl Packet {
    pub fn new(
        proto: impl Into<String>,
        service: impl Into<String>,
        conn_state: impl Into<String>,
    ) -> Self {
        Self {
            proto: proto.into(),
            service: service.into(),
            conn_state: conn_state.into(),
        }
    }
}

/// The three packet attributes, in the order the DFA consumes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum PacketField {
    Proto,
    Service,
    ConnState,
}

impl PacketField {
    pub const ORDER: [PacketField; 3] = [Self::Proto, Self::Service, Self::ConnState];

    /// Field consumed by the DFA at a given step index.
    pub fn for_step(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    /// Decode a PDA input symbol such as `proto=tcp` into its field and value.
    ///
    /// Symbols without a `proto=` or `service=` prefix are connection states,
    /// with an optional `state=` prefix stripped.
    pub fn decode_symbol(symbol: &str) -> (Self, &str) {
        if let Some(value) = symbol.strip_prefix("proto=") {
            (Self::Proto, value)
        } else if let Some(value) = symbol.strip_prefix("service=") {
            (Self::Service, value)
        } else {
            (
                Self::ConnState,
                symbol.strip_prefix("state=").unwrap_or(symbol),
            )
        }
    }
}

// ============================================================================
// Trace Model
// ============================================================================

/// One transition consumed while classifying a single packet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct DfaStep {
    pub current_state: String,
    pub symbol: String,
    pub next_state: String,
}

/// Classification of one packet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct DfaResult {
    #[serde(default)]
    pub steps: Vec<DfaStep>,
    pub final_state: String,
    pub is_malicious: bool,
    #[serde(default)]
    pub label: String,
}

/// One push/pop/transition event of the request validator.
///
/// `stack` is the snapshot taken after the operation at `step_index`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct StackOperation {
    pub step_index: i64,
    pub action: String,
    pub symbol: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state: Option<String>,
}

/// Validation of a request's whole packet sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct PdaResult {
    pub is_valid: bool,
    #[serde(default)]
    pub trace: Vec<StackOperation>,
}

/// Evaluator response to `POST request/process`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RequestResult {
    pub pda: PdaResult,
    /// Index-aligned with the submitted packet list
    #[serde(default)]
    pub packets: Vec<DfaResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_malicious: Option<bool>,
}

// ============================================================================
// Graph & Grammar
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub is_accepting: bool,
    #[serde(default)]
    pub is_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
}

/// Automaton topology. Multiple edges may share a `(source, target)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct GrammarResponse {
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct DerivationResponse {
    pub steps: Vec<String>,
}

// ============================================================================
// API Types
// ============================================================================

/// Body of `POST request/process`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ProcessRequest {
    pub packets: Vec<Packet>,
    pub threshold: i64,
}

/// Body of `POST derivation`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct DerivationRequest {
    pub packet: Packet,
}

/// Body of `POST pda/derivation`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct PdaDerivationRequest {
    pub packets: Vec<Packet>,
}

// ============================================================================
// Playback View State
// ============================================================================

/// Which trace the graph view is rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum ViewMode {
    Dfa,
    Pda,
    None,
}

/// Typed cursor position inside a trace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum CursorPosition {
    Unstarted,
    AtStep { index: usize },
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct ActiveEdge {
    pub source: String,
    pub target: String,
}

/// Graph element currently highlighted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct Highlight {
    pub active_node_id: String,
    pub active_edge: Option<ActiveEdge>,
}

/// "Step x / y" counter shown next to the playback controls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct StepProgress {
    pub current: i64,
    pub total: usize,
}

/// What the current cursor position means for the side panels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub enum StepDetail {
    Dfa {
        /// Packet attribute consumed by the current step
        active_field: Option<PacketField>,
        /// Set once the cursor is past the last transition
        outcome: Option<String>,
    },
    Pda {
        action: String,
        symbol: String,
        field: PacketField,
        field_value: String,
        stack: Vec<String>,
        top_of_stack: Option<String>,
        /// Set once the cursor reaches the last operation
        outcome: Option<String>,
    },
}

/// One cursor as seen by the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct LaneSnapshot {
    pub trace_id: TraceId,
    pub index: i64,
    pub length: usize,
    pub position: CursorPosition,
    pub can_next: bool,
    pub can_prev: bool,
    pub is_playing: bool,
    pub progress: StepProgress,
    pub detail: Option<StepDetail>,
}

/// Aggregate verdict for a request, computed once at response time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct RequestVerdict {
    pub detections: usize,
    pub threshold: i64,
    pub threshold_exceeded: bool,
    pub backend_flag: bool,
    pub is_malicious: bool,
    /// Index-aligned with the submitted packets
    pub suspicious: Vec<bool>,
    pub pda_valid: bool,
}

/// Full controller state rendered by the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct PlaybackSnapshot {
    pub view: ViewMode,
    pub selected_packet: Option<usize>,
    pub packets: Vec<Packet>,
    pub dfa: Option<LaneSnapshot>,
    pub pda: Option<LaneSnapshot>,
    pub highlight: Highlight,
    pub verdict: Option<RequestVerdict>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub last_known_state: String,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Reply to `POST /playback/request`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../bindings/generated.ts")]
pub struct SubmissionAccepted {
    pub success: bool,
    pub submission_id: String,
}

// ============================================================================
// Tests
// ============================================================================
