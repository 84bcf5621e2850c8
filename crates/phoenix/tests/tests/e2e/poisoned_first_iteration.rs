//! End-to-end: the stub injects a fault on iteration 0 for inputs carrying
//! the poison token. When an example collides with it, shadow evaluation
//! rejects iteration 0 and iteration 1 is promoted.

use phoenix_evolution_engine::poison_token;
use phoenix_kernel::{IterationStage, Kernel, KernelConfig};
use phoenix_registry::{InMemoryRegistry, VersionRegistry};
use phoenix_tests::{poisoned_spec, requirements};
use phoenix_types::{Decision, Request, Service};
use std::sync::Arc;

#[tokio::test]
async fn shadow_rejects_then_second_iteration_wins() {
    let req = requirements(&poisoned_spec());
    let registry = Arc::new(InMemoryRegistry::new());
    let mut k = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_registry(registry.clone());

    let outcome = k.run_requirements(&req).await;
    assert_eq!(outcome.iterations.len(), 2);

    let first = &outcome.iterations[0];
    assert_eq!(first.decision, Decision::Rejected);
    assert_eq!(first.failed_stage, Some(IterationStage::Shadow));

    let second = &outcome.iterations[1];
    assert!(second.is_accepted());
    assert_ne!(first.version_id, second.version_id);
    assert_eq!(outcome.active_version, second.version_id);

    let records = registry.load_all().unwrap();
    assert_eq!(records.len(), 2);
    assert!(!records[0].shadow_report.mismatches.is_empty());
    assert!(records[0]
        .shadow_report
        .mismatches
        .iter()
        .any(|m| m.contains("EX-POISON")));
    assert_eq!(
        registry.load_last_good().unwrap().map(|r| r.version_id),
        Some(second.version_id.clone())
    );
}

#[tokio::test]
async fn promoted_version_handles_poison_input() {
    let req = requirements(&poisoned_spec());
    let token = poison_token(&req.spec_hash);
    let mut k = Kernel::new(KernelConfig::default())
        .unwrap()
        .with_registry(Arc::new(InMemoryRegistry::new()));
    k.run_requirements(&req).await;

    let response = k.facade().process(&Request::new(token.as_str())).unwrap();
    let output = response.output.unwrap();
    assert!(output.starts_with("OK:"));
    assert!(output.contains(&token));
}

#[tokio::test]
async fn rejection_keeps_default_serving() {
    let req = requirements(&poisoned_spec());
    let mut config = KernelConfig::default();
    config.kernel.max_iterations = 1;
    let mut k = Kernel::new(config)
        .unwrap()
        .with_registry(Arc::new(InMemoryRegistry::new()));

    let outcome = k.run_requirements(&req).await;
    assert!(outcome.accepted_version.is_none());
    assert_eq!(outcome.active_version, "default");
    assert_eq!(k.metrics().rollbacks, 0);
    assert_eq!(k.swap_manager().swap_count(), 0);

    let response = k.facade().process(&Request::new("hello")).unwrap();
    assert_eq!(response.output.as_deref(), Some("OK:hello:default"));
}
