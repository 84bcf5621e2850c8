use crate::hash::ContentHash;
use crate::plan::Plan;
use crate::reports::{ShadowReport, TestReport, VerificationReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error messages stored in a record are cut at this many characters.
pub const MAX_ERROR_CHARS: usize = 500;

/// Final decision for one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// One append-only audit entry per kernel iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub version_id: String,
    pub timestamp: DateTime<Utc>,
    pub spec_hash: ContentHash,
    pub plan_summary: Vec<String>,
    pub source_verification: VerificationReport,
    pub artifact_verification: VerificationReport,
    pub compilation_diagnostics: Vec<String>,
    pub test_report: TestReport,
    pub shadow_report: ShadowReport,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RegistryRecord {
    /// Builds a record stamped now. The error message is truncated here and
    /// never afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        version_id: impl Into<String>,
        spec_hash: ContentHash,
        plan: &Plan,
        source_verification: VerificationReport,
        artifact_verification: VerificationReport,
        compilation_diagnostics: Vec<String>,
        test_report: TestReport,
        shadow_report: ShadowReport,
        decision: Decision,
        error_message: Option<String>,
    ) -> Self {
        Self {
            version_id: version_id.into(),
            timestamp: Utc::now(),
            spec_hash,
            plan_summary: plan.tasks.clone(),
            source_verification,
            artifact_verification,
            compilation_diagnostics,
            test_report,
            shadow_report,
            decision,
            error_message: error_message.map(|m| truncate_error(&m)),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.decision == Decision::Accepted
    }
}

/// Cuts `message` to [`MAX_ERROR_CHARS`] characters plus `...`.
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_CHARS {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(MAX_ERROR_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            version_id: "v1-00ff".into(),
            target_unit_name: "impl::v1::service".into(),
            tasks: vec!["Analyze functional requirements".into()],
        }
    }

    #[test]
    fn truncation_boundary() {
        let exact = "e".repeat(MAX_ERROR_CHARS);
        assert_eq!(truncate_error(&exact), exact);
        let long = "x".repeat(MAX_ERROR_CHARS + 1);
        let cut = truncate_error(&long);
        assert_eq!(cut.len(), MAX_ERROR_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_CHARS + 10);
        let cut = truncate_error(&long);
        assert_eq!(cut.chars().count(), MAX_ERROR_CHARS + 3);
    }

    #[test]
    fn record_serializes_camel_case() {
        let rec = RegistryRecord::build(
            "v1-00ff",
            ContentHash::hash(b"spec"),
            &plan(),
            VerificationReport::from_findings(vec![]),
            VerificationReport::not_run(),
            vec![],
            TestReport::not_run(),
            ShadowReport::not_run(),
            Decision::Rejected,
            Some("Compilation failed".into()),
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["versionId"], "v1-00ff");
        assert_eq!(json["decision"], "rejected");
        assert_eq!(json["errorMessage"], "Compilation failed");
        assert!(json.get("planSummary").is_some());
        let restored: RegistryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(restored, rec);
    }

    #[test]
    fn accepted_record_omits_error() {
        let rec = RegistryRecord::build(
            "v2",
            ContentHash::hash(b"spec"),
            &plan(),
            VerificationReport::default(),
            VerificationReport::default(),
            vec![],
            TestReport::default(),
            ShadowReport::default(),
            Decision::Accepted,
            None,
        );
        assert!(rec.is_accepted());
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("errorMessage").is_none());
    }
}
