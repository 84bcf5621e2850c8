//! Strict validation of model JSON into pipeline types.

use crate::error::GenerationError;
use phoenix_types::{GeneratedSourceBundle, Plan};
use serde_json::Value;

/// Validated code generation reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeGenOutput {
    pub version_id: String,
    pub bundle: GeneratedSourceBundle,
    pub notes: String,
}

fn schema(msg: impl Into<String>) -> GenerationError {
    GenerationError::Schema(msg.into())
}

fn non_blank<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub fn parse_plan(v: &Value) -> Result<Plan, GenerationError> {
    if !v.is_object() {
        return Err(schema("plan JSON must be an object"));
    }
    let (Some(version_id), Some(target)) = (non_blank(v, "versionId"), non_blank(v, "targetUnit"))
    else {
        return Err(schema("plan JSON missing versionId or targetUnit"));
    };
    let units = v
        .get("units")
        .and_then(Value::as_array)
        .ok_or_else(|| schema("plan JSON missing units array"))?;
    let invariants = v
        .get("invariants")
        .and_then(Value::as_array)
        .ok_or_else(|| schema("plan JSON missing invariants array"))?;
    let notes = v
        .get("notes")
        .and_then(Value::as_str)
        .ok_or_else(|| schema("plan JSON missing notes"))?;

    let mut tasks = Vec::with_capacity(units.len() + invariants.len() + 1);
    for unit in units {
        let (Some(name), Some(role)) = (non_blank(unit, "name"), non_blank(unit, "role")) else {
            return Err(schema("plan units entries must include name and role"));
        };
        tasks.push(format!("Generate {name} ({role})"));
    }
    tasks.extend(
        invariants
            .iter()
            .filter_map(Value::as_str)
            .map(|inv| format!("Invariant: {inv}")),
    );
    if !notes.trim().is_empty() {
        tasks.push(format!("Notes: {notes}"));
    }

    Ok(Plan {
        version_id: version_id.to_string(),
        target_unit_name: target.to_string(),
        tasks,
    })
}

pub fn parse_codegen(v: &Value) -> Result<CodeGenOutput, GenerationError> {
    if !v.is_object() {
        return Err(schema("codegen JSON must be an object"));
    }
    let version_id =
        non_blank(v, "versionId").ok_or_else(|| schema("codegen JSON missing versionId"))?;
    let units = v
        .get("units")
        .and_then(Value::as_object)
        .ok_or_else(|| schema("codegen JSON missing units object"))?;
    let notes = v
        .get("notes")
        .and_then(Value::as_str)
        .ok_or_else(|| schema("codegen JSON missing notes"))?;

    let mut bundle = GeneratedSourceBundle::new();
    for (name, source) in units {
        let source = source
            .as_str()
            .ok_or_else(|| schema("codegen unit sources must be strings"))?;
        bundle.insert(name.clone(), source);
    }
    if bundle.is_empty() {
        return Err(schema("codegen JSON has no units"));
    }

    Ok(CodeGenOutput {
        version_id: version_id.to_string(),
        bundle,
        notes: notes.to_string(),
    })
}
