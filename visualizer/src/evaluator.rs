//! HTTP client for the evaluator backend.
//!
//! The evaluator computes graphs, grammars, derivations and traces. This
//! module only moves its JSON over HTTP; no retries, no caching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    DerivationRequest, DerivationResponse, GrammarResponse, GraphData, Packet,
    PdaDerivationRequest, ProcessRequest, RequestResult, TraceKind,
};

pub const DEFAULT_EVALUATOR_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluatorError {
    #[error("{0}")]
    Transport(String),

    /// Non-success status. `message` is the response body, or a per-endpoint
    /// default when the body was empty.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid evaluator response: {0}")]
    Decode(String),
}

impl EvaluatorError {
    fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }

    fn decode(err: reqwest::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Everything the controller and API need from the evaluator.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn fetch_graph(&self, kind: TraceKind) -> Result<GraphData, EvaluatorError>;

    async fn fetch_grammar(&self, kind: TraceKind) -> Result<GrammarResponse, EvaluatorError>;

    async fn process_request(
        &self,
        request: &ProcessRequest,
    ) -> Result<RequestResult, EvaluatorError>;

    async fn derivation(&self, packet: &Packet) -> Result<DerivationResponse, EvaluatorError>;

    async fn pda_derivation(
        &self,
        packets: &[Packet],
    ) -> Result<DerivationResponse, EvaluatorError>;
}

// ── Endpoints ────────────────────────────────────────────────────────────────

struct Endpoint {
    method: Method,
    path: &'static str,
    default_error: &'static str,
}

fn graph_endpoint(kind: TraceKind) -> Endpoint {
    match kind {
        TraceKind::Dfa => Endpoint {
            method: Method::GET,
            path: "graph",
            default_error: "Failed to fetch graph",
        },
        TraceKind::Pda => Endpoint {
            method: Method::GET,
            path: "pda/graph",
            default_error: "Failed to fetch PDA graph",
        },
    }
}

fn grammar_endpoint(kind: TraceKind) -> Endpoint {
    match kind {
        TraceKind::Dfa => Endpoint {
            method: Method::GET,
            path: "grammar",
            default_error: "Failed to fetch grammar",
        },
        TraceKind::Pda => Endpoint {
            method: Method::GET,
            path: "pda/grammar",
            default_error: "Failed to fetch PDA grammar",
        },
    }
}

const PROCESS_REQUEST: Endpoint = Endpoint {
    method: Method::POST,
    path: "request/process",
    default_error: "Failed to send request",
};

const DERIVATION: Endpoint = Endpoint {
    method: Method::POST,
    path: "derivation",
    default_error: "Failed to fetch derivation",
};

const PDA_DERIVATION: Endpoint = Endpoint {
    method: Method::POST,
    path: "pda/derivation",
    default_error: "Failed to fetch PDA derivation",
};

// ── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EvaluatorClient {
    http: Client,
    base_url: String,
}

impl EvaluatorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn call<B, T>(&self, endpoint: Endpoint, body: Option<&B>) -> Result<T, EvaluatorError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint.path);
        let mut request = self.http.request(endpoint.method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            tracing::warn!(url = %url, error = %err, "Evaluator request failed");
            EvaluatorError::transport(err)
        })?;

        if !response.status().is_success() {
            let err = describe_http_error(response, endpoint.default_error).await;
            tracing::warn!(url = %url, error = %err, "Evaluator returned an error status");
            return Err(err);
        }

        response.json::<T>().await.map_err(EvaluatorError::decode)
    }
}

async fn describe_http_error(response: Response, default_message: &str) -> EvaluatorError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        default_message.to_string()
    } else {
        body
    };
    EvaluatorError::Status { status, message }
}

#[async_trait]
impl Evaluator for EvaluatorClient {
    async fn fetch_graph(&self, kind: TraceKind) -> Result<GraphData, EvaluatorError> {
        self.call::<(), _>(graph_endpoint(kind), None).await
    }

    async fn fetch_grammar(&self, kind: TraceKind) -> Result<GrammarResponse, EvaluatorError> {
        self.call::<(), _>(grammar_endpoint(kind), None).await
    }

    async fn process_request(
        &self,
        request: &ProcessRequest,
    ) -> Result<RequestResult, EvaluatorError> {
        self.call(PROCESS_REQUEST, Some(request)).await
    }

    async fn derivation(&self, packet: &Packet) -> Result<DerivationResponse, EvaluatorError> {
        let body = DerivationRequest {
            packet: packet.clone(),
        };
        self.call(DERIVATION, Some(&body)).await
    }

    async fn pda_derivation(
        &self,
        packets: &[Packet],
    ) -> Result<DerivationResponse, EvaluatorError> {
        let body = PdaDerivationRequest {
            packets: packets.to_vec(),
        };
        self.call(PDA_DERIVATION, Some(&body)).await
    }
}
