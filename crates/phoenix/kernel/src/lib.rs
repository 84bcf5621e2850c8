#![deny(unsafe_code)]
//! # phoenix-kernel
//!
//! Drives the per-iteration pipeline:
//!
//! PLAN → GENERATE → VERIFY_SOURCE → COMPILE → VERIFY_ARTIFACT → LOAD → TEST →
//! SHADOW → ACCEPT | REJECT
//!
//! Every iteration ends in exactly one registry record. Only ACCEPT touches
//! the active implementation; a rejected iteration leaves whatever was serving
//! before the run in place.

pub mod config;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod outcome;

pub use config::{KernelConfig, LlmConfig, LlmMode, LoggingConfig, RunSettings};
pub use error::{ConfigError, KernelError};
pub use kernel::Kernel;
pub use metrics::KernelMetrics;
pub use outcome::{IterationOutcome, IterationStage, RunOutcome};
