#![deny(unsafe_code)]
//! # phoenix-spec
//!
//! Reads a specification document, hashes its raw bytes, and validates that
//! every required group is present before handing out
//! [`StructuredRequirements`](phoenix_types::StructuredRequirements).

pub mod error;
pub mod loader;

pub use error::SpecError;
pub use loader::SpecLoader;
