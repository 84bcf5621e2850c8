//! Parsed requirements model.
//!
//! Field names follow the snake_case layout of the specification document so
//! the same types serve both parsing and prompt rendering.

use crate::hash::ContentHash;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fully validated requirements for one kernel run. Immutable after loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequirements {
    /// BLAKE3 digest of the raw specification bytes.
    pub spec_hash: ContentHash,
    pub meta: Meta,
    pub functional_requirements: Vec<FunctionalRequirement>,
    pub invariants: Vec<InvariantSpec>,
    pub examples: Vec<ExampleSpec>,
    pub constraints: ConstraintSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalRequirement {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

/// Checkable property kinds evaluated by the shadow runner.
///
/// Serialized as SCREAMING_SNAKE_CASE; parsing ignores ASCII case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvariantKind {
    NonNull,
    Determinism,
    ContainsSubstring,
    Regex,
}

impl InvariantKind {
    const NAMES: &'static [&'static str] =
        &["NON_NULL", "DETERMINISM", "CONTAINS_SUBSTRING", "REGEX"];
}

impl<'de> Deserialize<'de> for InvariantKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_uppercase().as_str() {
            "NON_NULL" => Ok(Self::NonNull),
            "DETERMINISM" => Ok(Self::Determinism),
            "CONTAINS_SUBSTRING" => Ok(Self::ContainsSubstring),
            "REGEX" => Ok(Self::Regex),
            _ => Err(de::Error::unknown_variant(&raw, Self::NAMES)),
        }
    }
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NonNull => "NON_NULL",
            Self::Determinism => "DETERMINISM",
            Self::ContainsSubstring => "CONTAINS_SUBSTRING",
            Self::Regex => "REGEX",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: InvariantKind,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl InvariantSpec {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSpec {
    #[serde(default)]
    pub id: String,
    pub input: String,
    #[serde(default)]
    pub expected_output_contains: Vec<String>,
}

/// Policy constraints applied by both verifier passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(default)]
    pub forbidden_packages: Vec<String>,
    /// Forbidden symbol names.
    #[serde(default)]
    pub forbidden_classes: Vec<String>,
    #[serde(default)]
    pub allowed_packages: Vec<String>,
}
