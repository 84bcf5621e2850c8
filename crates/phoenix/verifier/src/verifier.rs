use crate::policy::{
    normalize_package, ALWAYS_DENIED_IN_ARTIFACTS, HARD_DENYLIST, PROCESS_MARKERS,
    REFLECTION_MARKERS,
};
use phoenix_compiler::artifact::{decode_artifact, decode_symbols};
use phoenix_compiler::{Constant, SymbolKind};
use phoenix_types::{ConstraintSpec, GeneratedSourceBundle, VerificationReport};
use std::collections::{BTreeMap, BTreeSet};

/// Static policy checker.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyVerifier;

impl PolicyVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Textual pass over every unit of `bundle`. Each finding names its unit.
    pub fn verify_sources(
        &self,
        bundle: &GeneratedSourceBundle,
        constraints: &ConstraintSpec,
    ) -> VerificationReport {
        let packages: Vec<String> = constraints
            .forbidden_packages
            .iter()
            .map(|p| normalize_package(p))
            .filter(|p| !p.is_empty())
            .collect();
        let symbols: Vec<&str> = constraints
            .forbidden_classes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let mut findings = Vec::new();
        for (unit, source) in bundle.iter() {
            for pkg in &packages {
                if source.contains(&format!("use {pkg}")) || source.contains(&format!("{pkg}::")) {
                    findings.push(format!("{unit}: references forbidden package {pkg}"));
                }
            }
            for sym in &symbols {
                if source.contains(sym) {
                    findings.push(format!("{unit}: references forbidden symbol {sym}"));
                }
            }
            for hard in HARD_DENYLIST {
                if source.contains(hard) {
                    findings.push(format!("{unit}: references hard-denied namespace {hard}"));
                }
            }
            if let Some(marker) = REFLECTION_MARKERS.iter().find(|m| source.contains(*m)) {
                findings.push(format!("{unit}: contains reflection use ({marker})"));
            }
            if let Some(marker) = PROCESS_MARKERS.iter().find(|m| source.contains(*m)) {
                findings.push(format!("{unit}: contains process execution ({marker})"));
            }
        }

        tracing::debug!(units = bundle.len(), findings = findings.len(), "source verification");
        VerificationReport::from_findings(findings)
    }

    /// Symbol-table pass over compiled artifacts (unit name to bytes).
    ///
    /// An artifact whose symbol table cannot be read is a finding.
    pub fn verify_artifact(
        &self,
        artifacts: &BTreeMap<String, Vec<u8>>,
        constraints: &ConstraintSpec,
    ) -> VerificationReport {
        let mut denied: BTreeSet<String> = constraints
            .forbidden_packages
            .iter()
            .map(|p| normalize_package(p))
            .chain(constraints.forbidden_classes.iter().map(|s| s.trim().to_string()))
            .filter(|t| !t.is_empty())
            .collect();
        denied.extend(HARD_DENYLIST.iter().map(|s| s.to_string()));
        denied.extend(ALWAYS_DENIED_IN_ARTIFACTS.iter().map(|s| s.to_string()));

        let allowed: Vec<String> = constraints
            .allowed_packages
            .iter()
            .map(|p| normalize_package(p))
            .filter(|p| !p.is_empty())
            .collect();

        let mut findings = Vec::new();
        for (unit, bytes) in artifacts {
            let Some(scan) = scan_artifact(bytes) else {
                findings.push(format!("{unit}: artifact symbol table is unreadable"));
                continue;
            };
            let mut seen = BTreeSet::new();
            for token in &scan.tokens {
                for forbidden in &denied {
                    if token.contains(forbidden.as_str()) && seen.insert(forbidden.clone()) {
                        findings.push(format!(
                            "{unit}: artifact references forbidden token {forbidden}"
                        ));
                    }
                }
            }
            if !allowed.is_empty() {
                for host in &scan.host_symbols {
                    let permitted = allowed
                        .iter()
                        .any(|a| host == a || host.starts_with(&format!("{a}::")));
                    if !permitted {
                        findings.push(format!(
                            "{unit}: artifact imports {host} outside the allowed packages"
                        ));
                    }
                }
            }
        }

        tracing::debug!(
            units = artifacts.len(),
            findings = findings.len(),
            "artifact verification"
        );
        VerificationReport::from_findings(findings)
    }
}

struct ArtifactScan {
    tokens: Vec<String>,
    host_symbols: Vec<String>,
}

/// Full decode when possible, otherwise the symbol table alone.
fn scan_artifact(bytes: &[u8]) -> Option<ArtifactScan> {
    if let Ok(artifact) = decode_artifact(bytes) {
        let host_symbols = artifact
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Host)
            .map(|s| s.name.clone())
            .collect();
        let mut tokens: Vec<String> = artifact.symbols.into_iter().map(|s| s.name).collect();
        tokens.extend(artifact.constants.into_iter().filter_map(|c| match c {
            Constant::Str(s) => Some(s),
            Constant::Int(_) => None,
        }));
        tokens.extend(artifact.functions.into_iter().map(|f| f.name));
        return Some(ArtifactScan {
            tokens,
            host_symbols,
        });
    }
    let (_, symbols) = decode_symbols(bytes).ok()?;
    let host_symbols = symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Host)
        .map(|s| s.name.clone())
        .collect();
    Some(ArtifactScan {
        tokens: symbols.into_iter().map(|s| s.name).collect(),
        host_symbols,
    })
}
