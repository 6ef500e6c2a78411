//! Automata playback visualizer - trace stepping and graph highlighting
//!
//! This crate replays DFA and PDA evaluator traces: a bounded cursor per
//! trace, autoplay timers owned by a single controller actor, and a pure
//! highlight resolver, exposed to a UI over a REST API.

pub mod actors;
pub mod aggregation;
pub mod api;
pub mod config;
pub mod cursor;
pub mod evaluator;
pub mod grammar;
pub mod graph;
pub mod highlight;
pub mod trace;
