//! Property tests: everything seeded from the spec hash is reproducible.

use phoenix_evolution_engine::{CodeGen, Planner, StubCodeGen, StubPlanner};
use phoenix_swap_gate::{build_corpus, SYNTHETIC_INPUTS};
use phoenix_tests::{hello_spec, requirements};
use proptest::prelude::*;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// A valid spec document with a random name and example set.
fn arb_spec() -> impl Strategy<Value = Value> {
    (
        "[a-z][a-z0-9-]{0,15}",
        prop::collection::vec("[a-zA-Z0-9 ]{1,24}", 1..5),
    )
        .prop_map(|(name, inputs)| {
            let mut doc = hello_spec();
            doc["meta"]["name"] = Value::String(name);
            doc["examples"] = inputs
                .iter()
                .enumerate()
                .map(|(i, input)| {
                    serde_json::json!({
                        "id": format!("EX-{i}"),
                        "input": input,
                        "expected_output_contains": ["OK"]
                    })
                })
                .collect();
            doc
        })
}

proptest! {
    /// Same spec bytes and iteration give byte-identical plans and bundles.
    #[test]
    fn stub_generation_is_reproducible(doc in arb_spec(), iteration in 0u32..6) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let a = requirements(&doc);
            let b = requirements(&doc);
            prop_assert_eq!(a.spec_hash, b.spec_hash);

            let plan_a = StubPlanner::new().plan(&a, iteration).await.unwrap();
            let plan_b = StubPlanner::new().plan(&b, iteration).await.unwrap();
            prop_assert_eq!(&plan_a, &plan_b);

            let bundle_a = StubCodeGen::new().generate(&a, &plan_a, iteration).await.unwrap();
            let bundle_b = StubCodeGen::new().generate(&b, &plan_b, iteration).await.unwrap();
            prop_assert_eq!(bundle_a, bundle_b);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Consecutive iterations never reuse a version id.
    #[test]
    fn iterations_get_distinct_versions(doc in arb_spec(), iteration in 0u32..6) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let req = requirements(&doc);
            let this = StubPlanner::new().plan(&req, iteration).await.unwrap();
            let next = StubPlanner::new().plan(&req, iteration + 1).await.unwrap();
            prop_assert_ne!(this.version_id, next.version_id);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Same spec hash gives the same examples-then-synthetic corpus.
    #[test]
    fn shadow_corpus_is_reproducible(doc in arb_spec()) {
        let req = requirements(&doc);
        let a = build_corpus(&req);
        let b = build_corpus(&requirements(&doc));
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), req.examples.len() + SYNTHETIC_INPUTS);
        for (input, example) in a.iter().zip(&req.examples) {
            prop_assert_eq!(input, &example.input);
        }
        prop_assert!(a[req.examples.len()..].iter().all(|s| s.starts_with("syn-")));
    }
}
