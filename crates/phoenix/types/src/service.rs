//! The single-method service contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub input: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Request {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: Some(input.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub output: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Response {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            metadata: BTreeMap::new(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Failure raised by a service implementation while handling a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("runtime fault: {0}")]
    Fault(String),
    #[error("resource limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("check failed: {0}")]
    CheckFailed(String),
}

/// A service implementation. Implementations must be safe to call from any
/// number of threads at once.
pub trait Service: Send + Sync {
    fn process(&self, request: &Request) -> Result<Response, ServiceError>;

    /// Identifies the implementation in logs and response metadata.
    fn name(&self) -> &str;
}

/// The built-in implementation serving before any candidate is promoted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultService;

impl Service for DefaultService {
    fn process(&self, request: &Request) -> Result<Response, ServiceError> {
        let input = request.input.as_deref().unwrap_or("");
        Ok(Response::new(format!("OK:{input}:default")))
    }

    fn name(&self) -> &str {
        "default"
    }
}
