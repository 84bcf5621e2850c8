//! End-to-end: model-backed generators that always time out fall back to the
//! stub on every call, and the run ends exactly as a pure stub run would.

use async_trait::async_trait;
use phoenix_evolution_engine::{
    GenerationError, GenerationRequest, InferenceResult, ModelAdapter, ModelBackend,
    ModelCodeGen, ModelPlanner, SamplingSettings,
};
use phoenix_kernel::{Kernel, KernelConfig};
use phoenix_registry::InMemoryRegistry;
use phoenix_tests::{hello_spec, poisoned_spec, requirements};
use phoenix_types::StructuredRequirements;
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct HangingBackend;

#[async_trait]
impl ModelBackend for HangingBackend {
    async fn generate(&self, _: &GenerationRequest) -> Result<InferenceResult, GenerationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(InferenceResult {
            text: String::new(),
            generated_tokens: None,
        })
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

fn model_backed_kernel() -> Kernel {
    let adapter = Arc::new(ModelAdapter::new(Arc::new(HangingBackend)).with_timeout_ms(20));
    let settings = SamplingSettings {
        max_tokens: 64,
        temperature: 0.2,
        seed: None,
    };
    Kernel::new(KernelConfig::default())
        .unwrap()
        .with_registry(Arc::new(InMemoryRegistry::new()))
        .with_planner(Arc::new(ModelPlanner::new(Arc::clone(&adapter), settings.clone())))
        .with_codegen(Arc::new(ModelCodeGen::new(adapter, settings)))
}

fn stub_kernel() -> Kernel {
    Kernel::new(KernelConfig::default())
        .unwrap()
        .with_registry(Arc::new(InMemoryRegistry::new()))
}

async fn assert_same_outcome(req: &StructuredRequirements) {
    let mut model = model_backed_kernel();
    let mut stub = stub_kernel();
    let a = model.run_requirements(req).await;
    let b = stub.run_requirements(req).await;

    assert_eq!(a.accepted_version, b.accepted_version);
    assert_eq!(a.active_version, b.active_version);
    assert_eq!(a.iterations.len(), b.iterations.len());
    for (x, y) in a.iterations.iter().zip(&b.iterations) {
        assert_eq!(x.version_id, y.version_id);
        assert_eq!(x.decision, y.decision);
        assert_eq!(x.failed_stage, y.failed_stage);
    }
    // one planner and one codegen fallback per iteration
    assert_eq!(
        model.metrics().generation_fallbacks,
        2 * a.iterations.len() as u64
    );
    assert_eq!(stub.metrics().generation_fallbacks, 0);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeouts_match_stub_run() {
    assert_same_outcome(&requirements(&hello_spec())).await;
}

#[tokio::test]
async fn timeouts_match_stub_run_with_rejection() {
    assert_same_outcome(&requirements(&poisoned_spec())).await;
}
