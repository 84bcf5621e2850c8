//! Inference backends.

use crate::error::GenerationError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Sampling request handed to a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub seed: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InferenceResult {
    pub text: String,
    /// Not every backend reports a token count.
    pub generated_tokens: Option<u32>,
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<InferenceResult, GenerationError>;

    fn name(&self) -> &str;
}

const STDERR_TAIL: usize = 400;

/// Runs a local inference command (llama.cpp style flags) per request.
///
/// The child is killed if the returned future is dropped, so a caller-side
/// timeout cancels the inference.
#[derive(Clone, Debug)]
pub struct LocalProcessBackend {
    command: String,
    model_path: PathBuf,
    context_length: u32,
}

impl LocalProcessBackend {
    pub fn new(command: impl Into<String>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            model_path: model_path.into(),
            context_length: 4096,
        }
    }

    pub fn with_context_length(mut self, n: u32) -> Self {
        self.context_length = n;
        self
    }

    fn args(&self, request: &GenerationRequest) -> Vec<String> {
        vec![
            "-m".into(),
            self.model_path.display().to_string(),
            "-c".into(),
            self.context_length.to_string(),
            "-n".into(),
            request.max_tokens.to_string(),
            "--temp".into(),
            request.temperature.to_string(),
            "--top-p".into(),
            request.top_p.to_string(),
            "--seed".into(),
            request.seed.to_string(),
            "--no-display-prompt".into(),
            "-p".into(),
            request.prompt.clone(),
        ]
    }
}

#[async_trait]
impl ModelBackend for LocalProcessBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<InferenceResult, GenerationError> {
        let output = Command::new(&self.command)
            .args(self.args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| GenerationError::Backend(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(STDERR_TAIL)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(GenerationError::Backend(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                tail.trim()
            )));
        }

        Ok(InferenceResult {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            generated_tokens: None,
        })
    }

    fn name(&self) -> &str {
        &self.command
    }
}
