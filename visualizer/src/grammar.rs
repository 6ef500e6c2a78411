//! Display grammars and derivation tokens.
//!
//! The evaluator owns grammar construction. These helpers only produce a
//! readable fallback from graph topology when the grammar endpoint is
//! unavailable, and classify derivation tokens for highlighting.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use shared_types::GraphData;

use crate::graph::start_node;

const EPSILON: &str = "ε";

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn quote(label: &str) -> String {
    format!("'{}'", label.replace('\'', "\\'"))
}

fn pda_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)push|pop|->|\[|\]").expect("static regex"))
}

fn non_terminal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("static regex"))
}

/// Right-linear grammar for a DFA graph: one `SRC -> 'label' TGT` rule per edge.
pub fn dfa_grammar_from_graph(graph: &GraphData) -> Vec<String> {
    let accepting: HashMap<&str, bool> = graph
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node.is_accepting))
        .collect();

    let mut rules: Vec<String> = graph
        .edges
        .iter()
        .map(|edge| {
            let src = sanitize(&edge.source);
            let tgt = sanitize(&edge.target);
            let label = edge.label.trim();
            let quoted = quote(if label.is_empty() { EPSILON } else { label });
            if accepting.get(edge.target.as_str()).copied().unwrap_or(false) {
                format!("{src} -> {quoted} {tgt} | {quoted}")
            } else {
                format!("{src} -> {quoted} {tgt}")
            }
        })
        .collect();

    if let Some(start) = start_node(graph) {
        rules.insert(0, format!("# start: {}", sanitize(&start.id)));
    }
    rules
}

/// PDA rules keep stack-operation labels verbatim.
pub fn pda_grammar_from_graph(graph: &GraphData) -> Vec<String> {
    graph
        .edges
        .iter()
        .map(|edge| {
            let src = sanitize(&edge.source);
            let tgt = sanitize(&edge.target);
            let label = edge.label.trim();
            let human = if pda_label_regex().is_match(label) {
                label.to_string()
            } else if label.is_empty() {
                EPSILON.to_string()
            } else {
                quote(label)
            };
            format!("{src} -> {human} {tgt}")
        })
        .collect()
}

// ── Derivation tokens ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Terminal,
    NonTerminal,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationToken {
    pub text: String,
    pub class: TokenClass,
}

pub fn classify_token(token: &str) -> TokenClass {
    if ["proto=", "service=", "state="]
        .iter()
        .any(|prefix| token.starts_with(prefix))
    {
        TokenClass::Terminal
    } else if non_terminal_regex().is_match(token) {
        TokenClass::NonTerminal
    } else {
        TokenClass::Plain
    }
}

/// Split one derivation line on spaces and classify each token.
pub fn tokenize_derivation(step: &str) -> Vec<DerivationToken> {
    step.split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| DerivationToken {
            text: token.to_string(),
            class: classify_token(token),
        })
        .collect()
}
