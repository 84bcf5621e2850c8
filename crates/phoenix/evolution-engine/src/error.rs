/// Errors raised while planning or generating code.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("JSON extraction failed: {0}")]
    Extraction(String),
    #[error("schema validation failed: {0}")]
    Schema(String),
    #[error("inference timed out after {0}ms")]
    InferenceTimeout(u64),
    #[error("model backend error: {0}")]
    Backend(String),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::InferenceTimeout(_))
    }
}
