use crate::suite::RegressionSuite;
use async_trait::async_trait;
use phoenix_compiler::{ExecutionContext, Value};
use phoenix_swap_gate::SELF_CHECK_HOOK;
use phoenix_types::{Request, TestReport};

/// Produces the test evidence for a candidate.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Runs the fixed regression suite.
    async fn run_regression_suite(&self) -> TestReport;

    /// Invokes `<target_unit>::self_check` if the candidate exports it.
    async fn run_self_check(&self, context: &ExecutionContext, target_unit: &str) -> TestReport;
}

/// Runs a [`RegressionSuite`] in-process.
#[derive(Clone, Debug)]
pub struct SuiteTestRunner {
    suite: RegressionSuite,
}

impl SuiteTestRunner {
    pub fn new() -> Self {
        Self::with_suite(RegressionSuite::standard())
    }

    pub fn with_suite(suite: RegressionSuite) -> Self {
        Self { suite }
    }

    pub fn suite(&self) -> &RegressionSuite {
        &self.suite
    }
}

impl Default for SuiteTestRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TestRunner for SuiteTestRunner {
    async fn run_regression_suite(&self) -> TestReport {
        let results = self.suite.run();
        let failed: Vec<String> = results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.detail())
            .collect();
        let passed = failed.is_empty();
        if !passed {
            tracing::warn!(failed = failed.len(), "regression suite failed");
        }
        let mut details = vec![format!(
            "regression suite: {}/{} checks passed",
            results.len() - failed.len(),
            results.len()
        )];
        details.extend(failed);
        TestReport::new(passed, details)
    }

    async fn run_self_check(&self, context: &ExecutionContext, target_unit: &str) -> TestReport {
        match context.export_arity(target_unit, SELF_CHECK_HOOK) {
            None => TestReport::new(true, vec![format!("No {SELF_CHECK_HOOK} hook present")]),
            Some(0) => {
                match context.call(target_unit, SELF_CHECK_HOOK, Vec::new(), &Request::empty()) {
                    Ok(Value::Bool(false)) => TestReport::new(
                        false,
                        vec!["Self-check failed: hook returned false".to_string()],
                    ),
                    Ok(_) => {
                        tracing::info!(target_unit, "self-check executed");
                        TestReport::new(true, vec![format!("Self-check passed for {target_unit}")])
                    }
                    Err(e) => TestReport::new(false, vec![format!("Self-check failed: {e}")]),
                }
            }
            Some(n) => TestReport::new(
                false,
                vec![format!(
                    "Self-check failed: {SELF_CHECK_HOOK} must take no arguments, takes {n}"
                )],
            ),
        }
    }
}
