//! Adversarial: live traffic through the facade while candidates are swapped
//! in and rolled back never observes a missing or partial implementation.

use phoenix_compiler::{SourceCompiler, UnitCompiler};
use phoenix_swap_gate::{CandidateHandle, HotSwapManager};
use phoenix_types::{GeneratedSourceBundle, Request, Service};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn candidate(swap: &HotSwapManager, tag: &str) -> CandidateHandle {
    let unit = format!("impl::{tag}::service");
    let source = format!("fn process(input) {{ return \"OK:\" + input + \":{tag}\"; }}");
    let compiled = UnitCompiler::new().compile(&GeneratedSourceBundle::new().with_unit(&unit, source));
    assert!(compiled.success, "{:?}", compiled.diagnostics);
    swap.load_candidate(&compiled.artifacts, &unit, tag).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn facade_sees_whole_versions_during_swaps() {
    let swap = Arc::new(HotSwapManager::new());
    let a = candidate(&swap, "a");
    let b = candidate(&swap, "b");
    let initial = swap.active();
    let stop = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..4 {
        let facade = swap.facade();
        let stop = Arc::clone(&stop);
        readers.push(tokio::task::spawn_blocking(move || {
            let mut calls = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let out = facade.process(&Request::new("x")).unwrap().output.unwrap();
                assert!(
                    matches!(out.as_str(), "OK:x:default" | "OK:x:a" | "OK:x:b"),
                    "torn response {out}"
                );
                calls += 1;
            }
            calls
        }));
    }

    for i in 0..200 {
        match i % 3 {
            0 => swap.switch_to(&a),
            1 => swap.switch_to(&b),
            _ => {
                swap.rollback_to(&initial);
            }
        }
        tokio::task::yield_now().await;
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
}

#[test]
fn failed_load_leaves_active_untouched() {
    let swap = HotSwapManager::new();
    let before = swap.active();
    let compiled = UnitCompiler::new().compile(
        &GeneratedSourceBundle::new().with_unit("impl::x::service", "fn handle(input) { return input; }"),
    );
    assert!(swap
        .load_candidate(&compiled.artifacts, "impl::x::service", "x")
        .is_err());
    assert!(Arc::ptr_eq(&before, &swap.active()));
    assert_eq!(swap.facade().active_version(), "default");
}

#[test]
fn promoted_candidate_survives_after_handles_drop() {
    let swap = HotSwapManager::new();
    {
        let c = candidate(&swap, "kept");
        swap.switch_to(&c);
    }
    let out = swap.facade().process(&Request::new("y")).unwrap();
    assert_eq!(out.output.as_deref(), Some("OK:y:kept"));
    assert_eq!(swap.facade().active_version(), "kept");
}
