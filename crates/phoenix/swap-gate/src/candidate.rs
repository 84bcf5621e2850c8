use phoenix_compiler::{ExecutionContext, Value};
use phoenix_types::{Request, Response, Service, ServiceError};
use std::fmt;
use std::sync::Arc;

/// Function every target unit must export, taking the request input.
pub const ENTRY_POINT: &str = "process";

/// Optional zero-argument hook run by the test stage.
pub const SELF_CHECK_HOOK: &str = "self_check";

/// A service backed by a linked unit-script program.
pub struct ScriptService {
    version_id: String,
    target_unit: String,
    context: Arc<ExecutionContext>,
}

impl ScriptService {
    pub fn new(
        version_id: impl Into<String>,
        target_unit: impl Into<String>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            version_id: version_id.into(),
            target_unit: target_unit.into(),
            context,
        }
    }
}

impl Service for ScriptService {
    fn process(&self, request: &Request) -> Result<Response, ServiceError> {
        let input = Value::from(request.input.clone());
        let out = self
            .context
            .call(&self.target_unit, ENTRY_POINT, vec![input], request)?;
        let response = match out {
            Value::Nil => Response::none(),
            Value::Str(s) => Response::new(s),
            other => Response::new(other.to_string()),
        };
        Ok(response.with_metadata("version", &self.version_id))
    }

    fn name(&self) -> &str {
        &self.version_id
    }
}

/// A loaded, not necessarily promoted, candidate.
#[derive(Clone)]
pub struct CandidateHandle {
    pub version_id: String,
    pub target_unit: String,
    /// Owned by this candidate alone.
    pub context: Arc<ExecutionContext>,
    pub service: Arc<dyn Service>,
}

impl fmt::Debug for CandidateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateHandle")
            .field("version_id", &self.version_id)
            .field("target_unit", &self.target_unit)
            .finish_non_exhaustive()
    }
}
