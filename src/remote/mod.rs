//! Sequential chunked dispatch to the remote assistant API

use crate::chunk::{assemble, Chunker};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// JSON payload shapes accepted by the remote endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RemoteRequest {
    /// `/convert_to_notes`
    ConvertToNotes { text: String },
    /// `/summarize_selection`
    Summarize { selected_text: String },
    /// `/generate_podcast`
    Podcast { paper_content: String },
    /// `/chat_with_paper`
    Chat {
        paper_content: String,
        question: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        selected_text: Option<String>,
    },
}

impl RemoteRequest {
    /// Path of the endpoint this payload is posted to
    pub fn endpoint(&self) -> &'static str {
        match self {
            RemoteRequest::ConvertToNotes { .. } => "/convert_to_notes",
            RemoteRequest::Summarize { .. } => "/summarize_selection",
            RemoteRequest::Podcast { .. } => "/generate_podcast",
            RemoteRequest::Chat { .. } => "/chat_with_paper",
        }
    }
}

/// Failure reported by the transport for a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{endpoint}: {message}")]
pub struct TransportError {
    pub endpoint: String,
    pub message: String,
}

impl TransportError {
    pub fn new(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

/// External collaborator carrying requests to the remote API.
///
/// The real page hands requests to `fetch`; tests use recording mocks.
pub trait Transport {
    fn send(&mut self, request: &RemoteRequest) -> Result<String, TransportError>;
}

/// Batch failure: one failed chunk aborts the whole operation and its
/// partial results are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("request {index} of {total} failed: {source}")]
    Chunk {
        index: usize,
        total: usize,
        #[source]
        source: TransportError,
    },
    #[error(transparent)]
    Request(#[from] TransportError),
}

/// Pacing between consecutive chunk requests
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Pacer that blocks the calling thread
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct ThreadPacer;

#[cfg(not(target_arch = "wasm32"))]
impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Pacer that never waits (hosts that pace their own request loop)
#[derive(Debug, Default)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn pause(&mut self, _delay: Duration) {}
}

#[cfg(not(target_arch = "wasm32"))]
fn default_pacer() -> Box<dyn Pacer> {
    Box::new(ThreadPacer)
}

#[cfg(target_arch = "wasm32")]
fn default_pacer() -> Box<dyn Pacer> {
    Box::new(NoopPacer)
}

/// How one chunked operation shards and paces its requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Maximum characters per outbound chunk
    pub max_chunk_chars: usize,
    /// Pause between consecutive requests, never before the first
    pub inter_request_delay: Duration,
}

impl DispatchPolicy {
    pub fn new(max_chunk_chars: usize, inter_request_delay: Duration) -> Self {
        Self {
            max_chunk_chars: max_chunk_chars.max(1),
            inter_request_delay,
        }
    }

    /// Summary endpoint: 4000-character threshold, no pacing
    pub fn summarize() -> Self {
        Self::new(4_000, Duration::ZERO)
    }

    /// Notes conversion: 5000-character threshold, no pacing
    pub fn notes() -> Self {
        Self::new(5_000, Duration::ZERO)
    }

    /// Podcast path: 5000-character threshold, one second between requests
    /// for the downstream rate limit
    pub fn podcast() -> Self {
        Self::new(5_000, Duration::from_secs(1))
    }
}

/// Sends one chunk at a time, strictly in order, and joins the responses.
///
/// One request is in flight at any moment, so reassembly order trivially
/// matches request order.
pub struct SequentialDispatcher {
    policy: DispatchPolicy,
    chunker: Chunker,
    pacer: Box<dyn Pacer>,
}

impl SequentialDispatcher {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            chunker: Chunker::new(policy.max_chunk_chars),
            policy,
            pacer: default_pacer(),
        }
    }

    /// Replace the pacer (tests, hosts with their own timers)
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// Chunk `text`, send each piece through `make` and the transport in
    /// order, and join the responses with a blank line. Any failed chunk
    /// aborts the batch.
    pub fn run(
        &mut self,
        transport: &mut dyn Transport,
        text: &str,
        make: impl Fn(String) -> RemoteRequest,
    ) -> Result<String, DispatchError> {
        let chunks = self.chunker.chunk(text);
        let total = chunks.len();
        let mut responses = Vec::with_capacity(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            if index > 0 && !self.policy.inter_request_delay.is_zero() {
                self.pacer.pause(self.policy.inter_request_delay);
            }

            let request = make(chunk);
            tracing::debug!(endpoint = request.endpoint(), index, total, "dispatching chunk");

            let response = transport
                .send(&request)
                .map_err(|source| DispatchError::Chunk {
                    index,
                    total,
                    source,
                })?;
            responses.push(response);
        }

        Ok(assemble(&responses))
    }
}

/// Session-lifetime result cache keyed by the full source text.
///
/// First result wins; entries live until the owning assistant is dropped
/// (a page reload in the browser).
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: FxHashMap<String, String>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a result; a later insert under the same key is ignored
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
