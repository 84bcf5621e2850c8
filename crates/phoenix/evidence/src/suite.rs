use crate::checks;
use crate::types::CheckResult;
use std::time::Instant;

pub type CheckFn = fn() -> Result<(), String>;

#[derive(Clone, Copy, Debug)]
pub struct RegressionCheck {
    pub name: &'static str,
    pub run: CheckFn,
}

/// An ordered list of named checks.
#[derive(Clone, Debug, Default)]
pub struct RegressionSuite {
    checks: Vec<RegressionCheck>,
}

impl RegressionSuite {
    pub fn new() -> Self {
        Self::default()
    }

    /// The checks run on every kernel iteration.
    pub fn standard() -> Self {
        Self::new()
            .with_check("verifier_denylist", checks::verifier_denylist)
            .with_check("verifier_artifact_rescan", checks::verifier_artifact_rescan)
            .with_check("compiler_reference_program", checks::compiler_reference_program)
            .with_check("sandbox_refuses_privileged_imports", checks::sandbox_refuses_privileged_imports)
            .with_check("default_service", checks::default_service)
            .with_check("json_extraction", checks::json_extraction)
            .with_check("registry_error_truncation", checks::registry_error_truncation)
            .with_check("shadow_corpus_determinism", checks::shadow_corpus_determinism)
    }

    pub fn with_check(mut self, name: &'static str, run: CheckFn) -> Self {
        self.checks.push(RegressionCheck { name, run });
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name)
    }

    pub fn run(&self) -> Vec<CheckResult> {
        self.checks
            .iter()
            .map(|check| {
                let start = Instant::now();
                let outcome = (check.run)();
                CheckResult {
                    name: check.name.to_string(),
                    passed: outcome.is_ok(),
                    duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    error: outcome.err(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_suite_passes() {
        let results = RegressionSuite::standard().run();
        assert_eq!(results.len(), RegressionSuite::standard().len());
        for r in &results {
            assert!(r.passed, "{}", r.detail());
        }
    }

    #[test]
    fn failing_check_is_reported() {
        let suite = RegressionSuite::new()
            .with_check("ok", || Ok(()))
            .with_check("broken", || Err("expected 1, got 2".into()));
        let results = suite.run();
        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert_eq!(results[1].detail(), "broken: expected 1, got 2");
    }

    #[test]
    fn names_keep_order() {
        let names: Vec<_> = RegressionSuite::standard().names().collect();
        assert_eq!(names.first(), Some(&"verifier_denylist"));
        assert_eq!(names.last(), Some(&"shadow_corpus_determinism"));
    }
}
