use crate::error::SpecError;
use phoenix_types::{
    ConstraintSpec, ContentHash, ExampleSpec, FunctionalRequirement, InvariantSpec, Meta,
    StructuredRequirements,
};
use serde::Deserialize;
use std::path::Path;

/// Wire form of the document. Groups are optional here so that absence can
/// be reported by name rather than as a generic parse error.
#[derive(Debug, Deserialize)]
struct SpecDocument {
    meta: Option<Meta>,
    functional_requirements: Option<Vec<FunctionalRequirement>>,
    invariants: Option<Vec<InvariantSpec>>,
    examples: Option<Vec<ExampleSpec>>,
    constraints: Option<ConstraintSpec>,
}

/// Loads and validates specification documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecLoader;

impl SpecLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<StructuredRequirements, SpecError> {
        let bytes = std::fs::read(path).map_err(|source| SpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.parse_bytes(&bytes)
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<StructuredRequirements, SpecError> {
        let spec_hash = ContentHash::hash(bytes);
        let doc: SpecDocument = serde_json::from_slice(bytes)?;

        let meta = doc.meta.ok_or(SpecError::Missing("meta"))?;
        let functional_requirements = doc
            .functional_requirements
            .filter(|frs| !frs.is_empty())
            .ok_or(SpecError::Missing("functional_requirements"))?;
        let invariants = doc.invariants.ok_or(SpecError::Missing("invariants"))?;
        let examples = doc.examples.ok_or(SpecError::Missing("examples"))?;
        let constraints = doc.constraints.ok_or(SpecError::Missing("constraints"))?;

        tracing::info!(spec_hash = %spec_hash, name = %meta.name, "parsed spec");
        Ok(StructuredRequirements {
            spec_hash,
            meta,
            functional_requirements,
            invariants,
            examples,
            constraints,
        })
    }
}
