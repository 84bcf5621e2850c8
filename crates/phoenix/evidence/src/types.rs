use serde::{Deserialize, Serialize};

/// Result of a single regression check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    /// Failure reason, if any.
    pub error: Option<String>,
}

impl CheckResult {
    /// One-line description used in test report details.
    pub fn detail(&self) -> String {
        match &self.error {
            Some(e) => format!("{}: {e}", self.name),
            None => format!("{}: ok", self.name),
        }
    }
}
