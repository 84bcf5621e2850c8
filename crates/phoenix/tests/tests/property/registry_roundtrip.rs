//! Property tests: the registry preserves append order and reports the most
//! recent accepted record as last good.

use phoenix_registry::{InMemoryRegistry, JsonFileRegistry, VersionRegistry};
use phoenix_types::{
    ContentHash, Decision, Plan, RegistryRecord, ShadowReport, TestReport, VerificationReport,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Accepted), Just(Decision::Rejected)]
}

fn record(index: usize, decision: Decision) -> RegistryRecord {
    let version_id = format!("v{index}");
    let error = match decision {
        Decision::Accepted => None,
        Decision::Rejected => Some("Shadow run failed".to_string()),
    };
    RegistryRecord::build(
        version_id.clone(),
        ContentHash::hash(b"roundtrip"),
        &Plan {
            version_id,
            target_unit_name: format!("impl::v{index}::service"),
            tasks: vec![format!("task {index}")],
        },
        VerificationReport::from_findings(vec![]),
        VerificationReport::not_run(),
        vec![],
        TestReport::not_run(),
        ShadowReport::not_run(),
        decision,
        error,
    )
}

fn check_roundtrip(registry: &dyn VersionRegistry, decisions: &[Decision]) -> Result<(), TestCaseError> {
    for (i, d) in decisions.iter().enumerate() {
        registry.append(&record(i, *d)).unwrap();
    }
    let loaded = registry.load_all().unwrap();
    prop_assert_eq!(loaded.len(), decisions.len());
    for (i, (r, d)) in loaded.iter().zip(decisions).enumerate() {
        prop_assert_eq!(&r.version_id, &format!("v{i}"));
        prop_assert_eq!(r.decision, *d);
        prop_assert_eq!(r.error_message.is_some(), *d == Decision::Rejected);
    }

    let expected = decisions
        .iter()
        .rposition(|d| *d == Decision::Accepted)
        .map(|i| format!("v{i}"));
    prop_assert_eq!(
        registry.load_last_good().unwrap().map(|r| r.version_id),
        expected
    );
    Ok(())
}

proptest! {
    #[test]
    fn in_memory_registry_roundtrip(decisions in prop::collection::vec(arb_decision(), 0..12)) {
        check_roundtrip(&InMemoryRegistry::new(), &decisions)?;
    }

    #[test]
    fn json_file_registry_roundtrip(decisions in prop::collection::vec(arb_decision(), 0..8)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.json");
        check_roundtrip(&JsonFileRegistry::new(&path), &decisions)?;

        // a fresh handle sees the same history
        let reopened = JsonFileRegistry::new(&path).load_all().unwrap();
        prop_assert_eq!(reopened.len(), decisions.len());
    }
}
