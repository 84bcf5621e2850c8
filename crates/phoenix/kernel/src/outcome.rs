use phoenix_types::Decision;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage of an iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationStage {
    Plan,
    Generate,
    VerifySource,
    Compile,
    VerifyArtifact,
    Load,
    Test,
    Shadow,
}

impl fmt::Display for IterationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plan => "PLAN",
            Self::Generate => "GENERATE",
            Self::VerifySource => "VERIFY_SOURCE",
            Self::Compile => "COMPILE",
            Self::VerifyArtifact => "VERIFY_ARTIFACT",
            Self::Load => "LOAD",
            Self::Test => "TEST",
            Self::Shadow => "SHADOW",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationOutcome {
    pub iteration: u32,
    pub version_id: String,
    pub decision: Decision,
    /// Stage that rejected the candidate.
    pub failed_stage: Option<IterationStage>,
    pub error: Option<String>,
}

impl IterationOutcome {
    pub fn is_accepted(&self) -> bool {
        self.decision == Decision::Accepted
    }
}

/// Summary of one kernel run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub iterations: Vec<IterationOutcome>,
    pub accepted_version: Option<String>,
    /// Version serving when the run ended.
    pub active_version: String,
}

impl RunOutcome {
    /// True when some iteration was accepted or an implementation, default or
    /// previously accepted, is still serving.
    pub fn succeeded(&self) -> bool {
        self.accepted_version.is_some() || !self.active_version.is_empty()
    }
}
