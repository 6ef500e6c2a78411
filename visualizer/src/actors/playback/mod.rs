//! PlaybackActor - steps through evaluator traces and drives the graph highlight
//!
//! The PlaybackActor holds two independent lanes:
//! - the DFA lane: the transition log of the selected packet
//! - the PDA lane: the stack-operation trace of the active request
//!
//! Selecting a packet shows its DFA lane; deselecting returns to the PDA lane.
//! Each lane has a bounded cursor and at most one autoplay timer.
//!
//! ## Cursor
//!
//! ```text
//! Unstarted (-1) → AtStep(0) → … → AtStep(N-1) → Finished (N)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ractor::Actor;
//! use crate::actors::playback::{PlaybackActor, PlaybackArguments};
//!
//! let args = PlaybackArguments {
//!     evaluator: Arc::new(EvaluatorClient::new(base_url, timeout)),
//!     settings: config.playback.clone(),
//! };
//!
//! let (playback_ref, _handle) = Actor::spawn(None, PlaybackActor, args).await?;
//! ```

pub mod actor;
pub mod autoplay;
pub mod controller;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use actor::{PlaybackActor, PlaybackArguments, PlaybackState};
pub use autoplay::{AutoplayScheduler, AutoplayTick, TickSink};
pub use controller::{PlaybackController, Submission, TickOutcome};
pub use protocol::{PlaybackError, PlaybackMsg, StepCommand};
