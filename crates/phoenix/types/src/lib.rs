#![deny(unsafe_code)]
//! # phoenix-types
//!
//! Shared data model for the Phoenix self-improving service runtime.
//!
//! Everything that flows between pipeline stages lives here: the parsed
//! requirements, plans and source bundles, stage reports, the registry record,
//! and the single-method service contract every candidate implements.

pub mod hash;
pub mod plan;
pub mod record;
pub mod reports;
pub mod requirements;
pub mod seed;
pub mod service;

pub use hash::{ContentHash, ContentHashError};
pub use plan::{GeneratedSourceBundle, Plan};
pub use record::{truncate_error, Decision, RegistryRecord, MAX_ERROR_CHARS};
pub use reports::{CompilationResult, ShadowReport, TestReport, VerificationReport};
pub use requirements::{
    ConstraintSpec, ExampleSpec, FunctionalRequirement, InvariantKind, InvariantSpec, Meta,
    StructuredRequirements,
};
pub use seed::derive_seed;
pub use service::{DefaultService, Request, Response, Service, ServiceError};
