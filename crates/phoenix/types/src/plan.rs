use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A planner's output for one iteration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub version_id: String,
    /// Unit that must export the service entry point.
    pub target_unit_name: String,
    pub tasks: Vec<String>,
}

impl Plan {
    pub fn summary(&self) -> String {
        format!(
            "version={} target={} tasks={}",
            self.version_id,
            self.target_unit_name,
            self.tasks.join("; ")
        )
    }
}

/// Unit name to source text. Keys are unique; a sorted map keeps iteration
/// order reproducible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSourceBundle {
    pub units: BTreeMap<String, String>,
}

impl GeneratedSourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.units.insert(name.into(), source.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.units.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.units.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
