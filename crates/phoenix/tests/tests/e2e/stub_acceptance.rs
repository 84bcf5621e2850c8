//! End-to-end: a clean spec in stub mode is accepted on the first iteration
//! and served through the facade afterwards.

use phoenix_kernel::{Kernel, KernelConfig};
use phoenix_registry::{JsonFileRegistry, VersionRegistry};
use phoenix_tests::{hello_spec, to_bytes};
use phoenix_types::{Request, Service};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Workspace {
    _dir: tempfile::TempDir,
    spec: std::path::PathBuf,
    registry: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("spec.json");
    std::fs::write(&spec, to_bytes(&hello_spec())).unwrap();
    let registry = dir.path().join("var").join("registry.json");
    Workspace {
        _dir: dir,
        spec,
        registry,
    }
}

fn kernel(registry: &std::path::Path) -> Kernel {
    let mut config = KernelConfig::default();
    config.kernel.registry_path = registry.to_path_buf();
    Kernel::new(config).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_iteration_is_accepted() {
    let ws = workspace();
    let mut k = kernel(&ws.registry);
    let outcome = k.run(&ws.spec).await.unwrap();

    assert_eq!(outcome.iterations.len(), 1);
    assert!(outcome.iterations[0].is_accepted());
    assert_eq!(outcome.accepted_version.as_deref(), Some(outcome.active_version.as_str()));

    let response = k.facade().process(&Request::new("hello")).unwrap();
    assert!(response.output.unwrap().contains("OK"));
}

#[tokio::test]
async fn registry_file_holds_one_accepted_record() {
    let ws = workspace();
    let mut k = kernel(&ws.registry);
    let outcome = k.run(&ws.spec).await.unwrap();

    let registry = JsonFileRegistry::new(&ws.registry);
    let records = registry.load_all().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.is_accepted());
    assert_eq!(Some(record.version_id.clone()), outcome.accepted_version);
    assert!(record.source_verification.passed);
    assert!(record.artifact_verification.passed);
    assert!(record.test_report.passed);
    assert!(record.shadow_report.passed);
    assert!(!record.plan_summary.is_empty());

    let raw = std::fs::read_to_string(&ws.registry).unwrap();
    assert!(raw.contains("\"versionId\""));
    assert!(raw.contains("\"decision\": \"accepted\""));
}

#[tokio::test]
async fn repeated_runs_pick_the_same_version() {
    let ws = workspace();
    let first = kernel(&ws.registry).run(&ws.spec).await.unwrap();
    let second = kernel(&ws.registry).run(&ws.spec).await.unwrap();
    assert_eq!(first.accepted_version, second.accepted_version);

    let registry = JsonFileRegistry::new(&ws.registry);
    assert_eq!(registry.load_all().unwrap().len(), 2);
    assert_eq!(
        registry.load_last_good().unwrap().map(|r| r.version_id),
        second.accepted_version
    );
}
