/// Errors from the swap gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    #[error("load failed for {version_id}: {reason}")]
    LoadFailed { version_id: String, reason: String },
}

impl SwapError {
    pub fn load_failed(version_id: &str, reason: impl ToString) -> Self {
        Self::LoadFailed {
            version_id: version_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
