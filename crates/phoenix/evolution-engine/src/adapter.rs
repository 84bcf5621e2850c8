use crate::backend::{GenerationRequest, ModelBackend};
use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::Instrument;

/// A generation call as seen by planners and code generators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub task: String,
    pub spec_hash: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub seed: u64,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub latency_ms: u64,
    pub generated_tokens: Option<u32>,
    pub timeout: bool,
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub metrics: ResponseMetrics,
}

/// Bounds every backend call: one call at a time, a hard timeout, and an
/// output size cap.
pub struct ModelAdapter {
    backend: Arc<dyn ModelBackend>,
    timeout: Duration,
    max_output_chars: usize,
    top_p: f64,
    worker: Semaphore,
}

impl ModelAdapter {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            timeout: Duration::from_millis(30_000),
            max_output_chars: 16_000,
            top_p: 0.9,
            worker: Semaphore::new(1),
        }
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_max_output_chars(mut self, n: usize) -> Self {
        self.max_output_chars = n;
        self
    }

    pub fn with_top_p(mut self, p: f64) -> Self {
        self.top_p = p;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    pub async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, GenerationError> {
        let span = tracing::debug_span!(
            "inference",
            task = %request.task,
            spec_hash = %request.spec_hash,
            metadata = ?request.metadata,
        );
        self.bounded(request).instrument(span).await
    }

    async fn bounded(&self, request: ModelRequest) -> Result<ModelResponse, GenerationError> {
        let _permit = self
            .worker
            .acquire()
            .await
            .map_err(|_| GenerationError::Backend("inference worker closed".into()))?;
        let start = Instant::now();
        let gen = GenerationRequest {
            prompt: request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: self.top_p,
            seed: request.seed,
        };

        // Dropping the backend future on timeout cancels the call.
        let result = match tokio::time::timeout(self.timeout, self.backend.generate(&gen)).await {
            Ok(r) => r?,
            Err(_) => {
                tracing::warn!(
                    task = %request.task,
                    backend = self.backend.name(),
                    timeout_ms = self.timeout_ms(),
                    "inference timed out"
                );
                return Err(GenerationError::InferenceTimeout(self.timeout_ms()));
            }
        };

        let mut text = result.text;
        let truncated = match text.char_indices().nth(self.max_output_chars) {
            Some((cut, _)) => {
                text.truncate(cut);
                true
            }
            None => false,
        };
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(task = %request.task, latency_ms, truncated, "inference completed");

        Ok(ModelResponse {
            text,
            metrics: ResponseMetrics {
                latency_ms,
                generated_tokens: result.generated_tokens,
                timeout: false,
                truncated,
            },
        })
    }
}
