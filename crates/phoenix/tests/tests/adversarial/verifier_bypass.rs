//! Adversarial: source-level tricks that slip past the textual check are
//! still caught once the unit is compiled, and the kernel never promotes
//! them.

use async_trait::async_trait;
use phoenix_compiler::{SourceCompiler, UnitCompiler};
use phoenix_evolution_engine::{CodeGen, GenerationError};
use phoenix_kernel::{IterationStage, Kernel, KernelConfig};
use phoenix_registry::InMemoryRegistry;
use phoenix_tests::{hello_spec, requirements};
use phoenix_types::{ConstraintSpec, GeneratedSourceBundle, Plan, StructuredRequirements};
use phoenix_verifier::PolicyVerifier;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn net_forbidden() -> ConstraintSpec {
    ConstraintSpec {
        forbidden_packages: vec!["sys::net".into()],
        forbidden_classes: vec![],
        allowed_packages: vec![],
    }
}

fn bundle(source: &str) -> GeneratedSourceBundle {
    GeneratedSourceBundle::new().with_unit("impl::evil::service", source)
}

/// Returns the same source for every plan.
struct Hostile(&'static str);

#[async_trait]
impl CodeGen for Hostile {
    async fn generate(
        &self,
        _: &StructuredRequirements,
        plan: &Plan,
        _: u32,
    ) -> Result<GeneratedSourceBundle, GenerationError> {
        Ok(GeneratedSourceBundle::new().with_unit(plan.target_unit_name.clone(), self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests: verifier layers
// ---------------------------------------------------------------------------

#[test]
fn spaced_path_passes_source_check_but_not_artifact_check() {
    let b = bundle("fn process(input) { return sys :: net :: connect(input, 80); }");
    let verifier = PolicyVerifier::new();

    assert!(verifier.verify_sources(&b, &net_forbidden()).passed);

    let compiled = UnitCompiler::new().compile(&b);
    assert!(compiled.success, "{:?}", compiled.diagnostics);
    let report = verifier.verify_artifact(&compiled.artifacts, &net_forbidden());
    assert!(!report.passed);
    assert!(report
        .findings
        .iter()
        .any(|f| f.starts_with("impl::evil::service:") && f.contains("sys::net")));
}

#[test]
fn alias_passes_source_check_but_not_artifact_check() {
    let b = bundle("use sys::fs as store;\nfn process(input) { return store::read(input); }");
    let verifier = PolicyVerifier::new();
    let no_constraints = ConstraintSpec::default();

    assert!(verifier.verify_sources(&b, &no_constraints).passed);

    let compiled = UnitCompiler::new().compile(&b);
    assert!(compiled.success, "{:?}", compiled.diagnostics);
    let report = verifier.verify_artifact(&compiled.artifacts, &no_constraints);
    assert!(!report.passed);
}

#[test]
fn io_namespaces_are_denied_without_any_constraint() {
    let verifier = PolicyVerifier::new();
    for source in [
        "use sys::net as wire;\nfn process(input) { return wire::connect(input, 1); }",
        "use sys::fs as disk;\nfn process(input) { return disk::read(input); }",
    ] {
        let compiled = UnitCompiler::new().compile(&bundle(source));
        assert!(compiled.success);
        let report = verifier.verify_artifact(&compiled.artifacts, &ConstraintSpec::default());
        assert!(!report.passed, "{source}");
    }
}

#[test]
fn process_execution_is_caught_in_source() {
    let b = bundle("fn process(input) { return sys::process::exec(input); }");
    let report = PolicyVerifier::new().verify_sources(&b, &ConstraintSpec::default());
    assert!(!report.passed);
    assert!(report.findings.iter().all(|f| f.starts_with("impl::evil::service:")));
}

// ---------------------------------------------------------------------------
// Tests: kernel gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aliased_io_is_never_promoted() {
    let mut k = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_registry(Arc::new(InMemoryRegistry::new()))
        .with_codegen(Arc::new(Hostile(
            "use sys::fs as store;\nfn process(input) { return \"OK:\" + store::read(input); }",
        )));
    let outcome = k.run_requirements(&requirements(&hello_spec())).await;

    assert!(outcome.accepted_version.is_none());
    assert_eq!(outcome.active_version, "default");
    assert!(outcome
        .iterations
        .iter()
        .all(|it| it.failed_stage == Some(IterationStage::VerifyArtifact)));
    assert_eq!(k.swap_manager().swap_count(), 0);
}
