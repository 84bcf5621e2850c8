#![deny(unsafe_code)]
//! # phoenix-evidence
//!
//! Test evidence gathered before a candidate may be promoted.
//!
//! - [`RegressionSuite`]: named checks of the toolchain itself, run on every
//!   iteration so a broken verifier or interpreter can never wave a candidate
//!   through.
//! - [`TestRunner`] / [`SuiteTestRunner`]: runs the suite and the candidate's
//!   optional `self_check` hook.

pub mod checks;
pub mod suite;
pub mod test_runner;
pub mod types;

pub use suite::{RegressionCheck, RegressionSuite};
pub use test_runner::{SuiteTestRunner, TestRunner};
pub use types::CheckResult;
