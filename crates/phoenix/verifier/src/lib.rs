#![deny(unsafe_code)]
//! # phoenix-verifier
//!
//! Two independent policy passes:
//!
//! - [`PolicyVerifier::verify_sources`] scans source text before compilation.
//! - [`PolicyVerifier::verify_artifact`] rescans the compiled symbol tables,
//!   catching references hidden from the textual pass by aliasing or token
//!   spacing. It is a coarse substring match, not a sandbox; the linker's
//!   refusal of privileged host functions remains the enforcement point.

pub mod policy;
pub mod verifier;

pub use policy::{
    normalize_package, ALWAYS_DENIED_IN_ARTIFACTS, HARD_DENYLIST, PROCESS_MARKERS,
    REFLECTION_MARKERS,
};
pub use verifier::PolicyVerifier;
