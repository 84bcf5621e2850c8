#![deny(unsafe_code)]
//! # phoenix-registry
//!
//! Append-only audit log of every kernel iteration.
//!
//! [`JsonFileRegistry`] keeps the whole history as one JSON array and
//! rewrites it atomically (temp file, then rename) on every append.
//! [`InMemoryRegistry`] backs tests.

pub mod error;
pub mod store;

pub use error::RegistryError;
pub use store::{InMemoryRegistry, JsonFileRegistry, VersionRegistry};
