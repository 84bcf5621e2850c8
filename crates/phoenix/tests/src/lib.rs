//! Shared fixtures for the Phoenix workspace tests.

use phoenix_spec::SpecLoader;
use phoenix_types::StructuredRequirements;
use serde_json::{json, Value};

/// Minimal valid document: one requirement, no invariants, one example
/// expecting `"OK"` for `"hello"`.
pub fn hello_spec() -> Value {
    json!({
        "meta": {"name": "hello", "version": "1.0", "description": "greets"},
        "functional_requirements": [
            {"id": "FR-1", "title": "Respond", "description": "answer with OK"}
        ],
        "invariants": [],
        "examples": [
            {"id": "EX-1", "input": "hello", "expected_output_contains": ["OK"]}
        ],
        "constraints": {"forbidden_packages": [], "forbidden_classes": [], "allowed_packages": []}
    })
}

/// `hello_spec` plus an example whose input contains every token the stub
/// generator can poison, so the first iteration always trips on it.
pub fn poisoned_spec() -> Value {
    let mut doc = hello_spec();
    let tokens: Vec<String> = (0..97).map(|n| format!("seed-{n}")).collect();
    if let Some(examples) = doc["examples"].as_array_mut() {
        examples.push(json!({
            "id": "EX-POISON",
            "input": tokens.join(" "),
            "expected_output_contains": ["OK"]
        }));
    }
    doc
}

pub fn to_bytes(doc: &Value) -> Vec<u8> {
    serde_json::to_vec_pretty(doc).unwrap_or_default()
}

/// Parses a fixture document the same way the kernel does.
pub fn requirements(doc: &Value) -> StructuredRequirements {
    match SpecLoader::new().parse_bytes(&to_bytes(doc)) {
        Ok(req) => req,
        Err(e) => panic!("fixture spec is invalid: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_parse() {
        assert_eq!(requirements(&hello_spec()).examples.len(), 1);
        assert_eq!(requirements(&poisoned_spec()).examples.len(), 2);
    }

    #[test]
    fn fixture_hashes_differ() {
        assert_ne!(
            requirements(&hello_spec()).spec_hash,
            requirements(&poisoned_spec()).spec_hash
        );
    }
}
