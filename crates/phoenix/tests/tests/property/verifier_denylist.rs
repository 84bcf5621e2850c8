//! Property tests: a unit naming a hard-denied API always fails the source
//! check, with a finding that names that unit.

use phoenix_types::{ConstraintSpec, GeneratedSourceBundle};
use phoenix_verifier::PolicyVerifier;
use proptest::prelude::*;

fn arb_denied_call() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("sys::process::exec(input)"),
        Just("sys::process::spawn(input)"),
        Just("sys::reflect::lookup(input)"),
        Just("sys::unsafe::peek(input)"),
    ]
}

proptest! {
    #[test]
    fn denied_api_always_fails(
        call in arb_denied_call(),
        unit_suffix in "[a-z]{1,8}",
        clean_units in 0usize..4,
    ) {
        let bad_unit = format!("impl::{unit_suffix}::bad");
        let mut bundle = GeneratedSourceBundle::new()
            .with_unit(&bad_unit, format!("fn process(input) {{ return {call}; }}"));
        for i in 0..clean_units {
            bundle.insert(format!("impl::clean{i}::helper"), "fn suffix() { return \"ok\"; }");
        }

        let report = PolicyVerifier::new().verify_sources(&bundle, &ConstraintSpec::default());
        prop_assert!(!report.passed);
        let bad_prefix = format!("{bad_unit}:");
        prop_assert!(report.findings.iter().any(|f| f.starts_with(&bad_prefix)));
        prop_assert!(report.findings.iter().all(|f| !f.starts_with("impl::clean")));
    }

    #[test]
    fn forbidden_symbol_from_constraints_fails(symbol in "[A-Z][a-zA-Z]{3,10}") {
        let constraints = ConstraintSpec {
            forbidden_packages: vec![],
            forbidden_classes: vec![symbol.clone()],
            allowed_packages: vec![],
        };
        let bundle = GeneratedSourceBundle::new()
            .with_unit("impl::v::service", format!("fn process(input) {{ return \"{symbol}\"; }}"));
        let report = PolicyVerifier::new().verify_sources(&bundle, &constraints);
        prop_assert!(!report.passed);
        prop_assert!(report.findings[0].starts_with("impl::v::service:"));
    }
}
