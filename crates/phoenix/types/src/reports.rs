use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a verifier pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub passed: bool,
    pub findings: Vec<String>,
}

impl VerificationReport {
    /// Builds a report that passes iff there are no findings.
    pub fn from_findings(findings: Vec<String>) -> Self {
        Self {
            passed: findings.is_empty(),
            findings,
        }
    }

    /// Placeholder for a pass that never ran because an earlier stage failed.
    pub fn not_run() -> Self {
        Self {
            passed: false,
            findings: Vec::new(),
        }
    }
}

/// Output of compiling a source bundle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilationResult {
    pub success: bool,
    /// Unit name to compiled artifact bytes.
    pub artifacts: BTreeMap<String, Vec<u8>>,
    /// Collected for every unit regardless of outcome.
    pub diagnostics: Vec<String>,
}

impl CompilationResult {
    pub fn failed(diagnostics: Vec<String>) -> Self {
        Self {
            success: false,
            artifacts: BTreeMap::new(),
            diagnostics,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub passed: bool,
    pub details: Vec<String>,
}

impl TestReport {
    pub fn new(passed: bool, details: Vec<String>) -> Self {
        Self { passed, details }
    }

    pub fn not_run() -> Self {
        Self::default()
    }

    /// Both reports must pass; details are concatenated in order.
    pub fn merge(self, other: TestReport) -> TestReport {
        let mut details = self.details;
        details.extend(other.details);
        TestReport {
            passed: self.passed && other.passed,
            details,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowReport {
    pub passed: bool,
    pub mismatches: Vec<String>,
}

impl ShadowReport {
    pub fn from_mismatches(mismatches: Vec<String>) -> Self {
        Self {
            passed: mismatches.is_empty(),
            mismatches,
        }
    }

    pub fn not_run() -> Self {
        Self::default()
    }
}
