use crate::config::{KernelConfig, LlmConfig, LlmMode};
use crate::error::KernelError;
use crate::metrics::KernelMetrics;
use crate::outcome::{IterationOutcome, IterationStage, RunOutcome};
use phoenix_compiler::{SourceCompiler, UnitCompiler};
use phoenix_evidence::{SuiteTestRunner, TestRunner};
use phoenix_evolution_engine::{
    CodeGen, LocalProcessBackend, ModelAdapter, ModelCodeGen, ModelPlanner, Planner,
    SamplingSettings, StubCodeGen, StubPlanner,
};
use phoenix_registry::{JsonFileRegistry, VersionRegistry};
use phoenix_spec::SpecLoader;
use phoenix_swap_gate::{
    ActiveSlot, CorpusShadowRunner, HotSwapManager, ShadowRunner, StableFacade, SwapError,
};
use phoenix_types::{
    Decision, GeneratedSourceBundle, Plan, RegistryRecord, ShadowReport, StructuredRequirements,
    TestReport, VerificationReport,
};
use phoenix_verifier::PolicyVerifier;
use std::path::Path;
use std::sync::Arc;

/// Reports gathered by one iteration. Stages that never ran keep their
/// not-run placeholder.
struct Evidence {
    source: VerificationReport,
    artifact: VerificationReport,
    diagnostics: Vec<String>,
    tests: TestReport,
    shadow: ShadowReport,
}

impl Evidence {
    fn new() -> Self {
        Self {
            source: VerificationReport::not_run(),
            artifact: VerificationReport::not_run(),
            diagnostics: Vec::new(),
            tests: TestReport::not_run(),
            shadow: ShadowReport::not_run(),
        }
    }
}

/// Terminal state of one iteration before it is recorded.
struct Verdict {
    decision: Decision,
    failed_stage: Option<IterationStage>,
    error: Option<String>,
}

impl Verdict {
    fn accepted() -> Self {
        Self {
            decision: Decision::Accepted,
            failed_stage: None,
            error: None,
        }
    }

    fn rejected(stage: IterationStage, error: impl Into<String>) -> Self {
        Self {
            decision: Decision::Rejected,
            failed_stage: Some(stage),
            error: Some(error.into()),
        }
    }
}

/// The iteration pipeline orchestrator.
pub struct Kernel {
    config: KernelConfig,
    loader: SpecLoader,
    planner: Arc<dyn Planner>,
    codegen: Arc<dyn CodeGen>,
    fallback_planner: StubPlanner,
    fallback_codegen: StubCodeGen,
    verifier: PolicyVerifier,
    compiler: Arc<dyn SourceCompiler>,
    test_runner: Arc<dyn TestRunner>,
    shadow_runner: Arc<dyn ShadowRunner>,
    registry: Arc<dyn VersionRegistry>,
    swap: Arc<HotSwapManager>,
    metrics: KernelMetrics,
}

impl Kernel {
    /// Builds a kernel from validated configuration. Generators are chosen by
    /// `llm.mode`; the registry is a JSON file at `kernel.registry_path`.
    pub fn new(config: KernelConfig) -> Result<Self, KernelError> {
        config.validate()?;
        let (planner, codegen) = generators(&config.llm);
        let registry = Arc::new(JsonFileRegistry::new(config.kernel.registry_path.clone()));
        Ok(Self {
            config,
            loader: SpecLoader::new(),
            planner,
            codegen,
            fallback_planner: StubPlanner::new(),
            fallback_codegen: StubCodeGen::new(),
            verifier: PolicyVerifier::new(),
            compiler: Arc::new(UnitCompiler::new()),
            test_runner: Arc::new(SuiteTestRunner::new()),
            shadow_runner: Arc::new(CorpusShadowRunner::new()),
            registry,
            swap: Arc::new(HotSwapManager::new()),
            metrics: KernelMetrics::new(),
        })
    }

    pub fn with_registry(mut self, registry: Arc<dyn VersionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_codegen(mut self, codegen: Arc<dyn CodeGen>) -> Self {
        self.codegen = codegen;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn SourceCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_test_runner(mut self, runner: Arc<dyn TestRunner>) -> Self {
        self.test_runner = runner;
        self
    }

    pub fn with_shadow_runner(mut self, runner: Arc<dyn ShadowRunner>) -> Self {
        self.shadow_runner = runner;
        self
    }

    /// Shares an existing swap manager, e.g. one whose facade already
    /// serves traffic.
    pub fn with_swap_manager(mut self, swap: Arc<HotSwapManager>) -> Self {
        self.swap = swap;
        self
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn metrics(&self) -> &KernelMetrics {
        &self.metrics
    }

    pub fn swap_manager(&self) -> &Arc<HotSwapManager> {
        &self.swap
    }

    /// Entry point for live traffic; stays valid across swaps.
    pub fn facade(&self) -> StableFacade {
        self.swap.facade()
    }

    /// Loads the specification at `spec_path` and runs the pipeline. An
    /// invalid specification aborts before any iteration.
    pub async fn run(&mut self, spec_path: &Path) -> Result<RunOutcome, KernelError> {
        let req = match self.loader.load(spec_path) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(path = %spec_path.display(), error = %e, "failed to load spec");
                return Err(e.into());
            }
        };
        Ok(self.run_requirements(&req).await)
    }

    pub async fn run_requirements(&mut self, req: &StructuredRequirements) -> RunOutcome {
        match self.registry.load_last_good() {
            Ok(Some(record)) => {
                tracing::info!(version_id = %record.version_id, "last good version");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read registry history"),
        }

        let previous = self.swap.active();
        let mut iterations = Vec::new();
        let mut accepted_version = None;

        for iteration in 0..self.config.kernel.max_iterations {
            let outcome = self.iterate(req, iteration, &previous).await;
            let accepted = outcome.is_accepted();
            if accepted {
                accepted_version = Some(outcome.version_id.clone());
            }
            iterations.push(outcome);
            if accepted {
                break;
            }
        }

        if accepted_version.is_none() {
            tracing::warn!("no candidate accepted, retaining last good implementation");
        }
        RunOutcome {
            iterations,
            accepted_version,
            active_version: self.swap.active().version_id().to_string(),
        }
    }

    async fn iterate(
        &mut self,
        req: &StructuredRequirements,
        iteration: u32,
        previous: &Arc<ActiveSlot>,
    ) -> IterationOutcome {
        let mut evidence = Evidence::new();

        let plan = match self.plan(req, iteration).await {
            Ok(plan) => plan,
            Err(e) => {
                let plan = Plan {
                    version_id: format!("iteration-{iteration}"),
                    target_unit_name: String::new(),
                    tasks: Vec::new(),
                };
                let verdict = Verdict::rejected(IterationStage::Plan, format!("Planning failed: {e}"));
                return self.finish(req, iteration, &plan, evidence, verdict);
            }
        };
        tracing::info!(iteration, version_id = %plan.version_id, "plan ready");

        let bundle = match self.generate(req, &plan, iteration).await {
            Ok(bundle) => bundle,
            Err(e) => {
                let verdict =
                    Verdict::rejected(IterationStage::Generate, format!("Generation failed: {e}"));
                return self.finish(req, iteration, &plan, evidence, verdict);
            }
        };

        evidence.source = self.verifier.verify_sources(&bundle, &req.constraints);
        if !evidence.source.passed {
            let verdict = Verdict::rejected(IterationStage::VerifySource, "Source verification failed");
            return self.finish(req, iteration, &plan, evidence, verdict);
        }
        tracing::info!(iteration, stage = %IterationStage::VerifySource, "stage passed");

        let compiled = self.compiler.compile(&bundle);
        evidence.diagnostics = compiled.diagnostics.clone();
        if !compiled.success {
            let verdict = Verdict::rejected(IterationStage::Compile, "Compilation failed");
            return self.finish(req, iteration, &plan, evidence, verdict);
        }
        tracing::debug!(iteration, diagnostics = ?compiled.diagnostics, "compiler output");
        tracing::info!(
            iteration,
            stage = %IterationStage::Compile,
            units = compiled.artifacts.len(),
            "stage passed"
        );

        evidence.artifact = self.verifier.verify_artifact(&compiled.artifacts, &req.constraints);
        if !evidence.artifact.passed {
            let verdict =
                Verdict::rejected(IterationStage::VerifyArtifact, "Artifact verification failed");
            return self.finish(req, iteration, &plan, evidence, verdict);
        }

        let candidate = match self.swap.load_candidate(
            &compiled.artifacts,
            &plan.target_unit_name,
            &plan.version_id,
        ) {
            Ok(candidate) => candidate,
            Err(SwapError::LoadFailed { reason, .. }) => {
                let verdict = Verdict::rejected(IterationStage::Load, format!("Load failed: {reason}"));
                return self.finish(req, iteration, &plan, evidence, verdict);
            }
        };
        tracing::info!(
            iteration,
            stage = %IterationStage::Load,
            version_id = %candidate.version_id,
            "stage passed"
        );

        // From here on a candidate is loaded; every rejection restores `previous`.
        let suite = self.test_runner.run_regression_suite().await;
        let self_check = self
            .test_runner
            .run_self_check(&candidate.context, &candidate.target_unit)
            .await;
        evidence.tests = suite.merge(self_check);
        if !evidence.tests.passed {
            self.rollback(previous);
            let verdict = Verdict::rejected(IterationStage::Test, "Tests failed");
            return self.finish(req, iteration, &plan, evidence, verdict);
        }

        evidence.shadow = self
            .shadow_runner
            .run(
                req,
                Some(previous.service.as_ref()),
                candidate.service.as_ref(),
                self.config.kernel.require_backward_compat,
            )
            .await;
        if !evidence.shadow.passed {
            self.rollback(previous);
            let verdict = Verdict::rejected(IterationStage::Shadow, "Shadow run failed");
            return self.finish(req, iteration, &plan, evidence, verdict);
        }

        self.swap.switch_to(&candidate);
        tracing::info!(iteration, version_id = %candidate.version_id, "candidate promoted");
        self.finish(req, iteration, &plan, evidence, Verdict::accepted())
    }

    async fn plan(
        &mut self,
        req: &StructuredRequirements,
        iteration: u32,
    ) -> Result<Plan, phoenix_evolution_engine::GenerationError> {
        match self.planner.plan(req, iteration).await {
            Ok(plan) => Ok(plan),
            Err(e) => {
                tracing::warn!(iteration, error = %e, "planner failed, falling back to stub");
                self.metrics.record_fallback();
                self.fallback_planner.plan(req, iteration).await
            }
        }
    }

    async fn generate(
        &mut self,
        req: &StructuredRequirements,
        plan: &Plan,
        iteration: u32,
    ) -> Result<GeneratedSourceBundle, phoenix_evolution_engine::GenerationError> {
        match self.codegen.generate(req, plan, iteration).await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                tracing::warn!(iteration, error = %e, "code generation failed, falling back to stub");
                self.metrics.record_fallback();
                self.fallback_codegen.generate(req, plan, iteration).await
            }
        }
    }

    fn rollback(&mut self, previous: &Arc<ActiveSlot>) {
        if self.swap.rollback_to(previous) {
            self.metrics.record_rollback();
        }
    }

    /// Writes the iteration's record and folds it into the metrics. A
    /// registry failure is logged and never changes the outcome.
    fn finish(
        &mut self,
        req: &StructuredRequirements,
        iteration: u32,
        plan: &Plan,
        evidence: Evidence,
        verdict: Verdict,
    ) -> IterationOutcome {
        let record = RegistryRecord::build(
            plan.version_id.clone(),
            req.spec_hash,
            plan,
            evidence.source,
            evidence.artifact,
            evidence.diagnostics,
            evidence.tests,
            evidence.shadow,
            verdict.decision,
            verdict.error.clone(),
        );
        if let Err(e) = self.registry.append(&record) {
            tracing::error!(version_id = %plan.version_id, error = %e, "registry write failed");
            self.metrics.record_registry_failure();
        }

        match verdict.decision {
            Decision::Accepted => self.metrics.record_accept(),
            Decision::Rejected => {
                self.metrics.record_reject();
                tracing::warn!(
                    iteration,
                    version_id = %plan.version_id,
                    stage = ?verdict.failed_stage,
                    error = verdict.error.as_deref().unwrap_or(""),
                    "iteration rejected"
                );
            }
        }

        IterationOutcome {
            iteration,
            version_id: plan.version_id.clone(),
            decision: verdict.decision,
            failed_stage: verdict.failed_stage,
            error: record.error_message,
        }
    }
}

fn generators(llm: &LlmConfig) -> (Arc<dyn Planner>, Arc<dyn CodeGen>) {
    match llm.mode {
        LlmMode::Stub => (Arc::new(StubPlanner::new()), Arc::new(StubCodeGen::new())),
        LlmMode::ModelBacked => {
            let backend = LocalProcessBackend::new(
                llm.command.clone(),
                llm.model_path.clone().unwrap_or_default(),
            )
            .with_context_length(llm.context_length);
            let adapter = Arc::new(
                ModelAdapter::new(Arc::new(backend))
                    .with_timeout_ms(llm.timeout_ms)
                    .with_max_output_chars(llm.max_output_chars)
                    .with_top_p(llm.top_p),
            );
            let settings = SamplingSettings {
                max_tokens: llm.max_tokens,
                temperature: llm.temperature,
                seed: llm.seed,
            };
            (
                Arc::new(ModelPlanner::new(Arc::clone(&adapter), settings.clone())),
                Arc::new(ModelCodeGen::new(adapter, settings)),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phoenix_evolution_engine::{poison_token, GenerationError};
    use phoenix_registry::InMemoryRegistry;
    use phoenix_types::{Request, Service};

    const SPEC: &str = r#"{
        "meta": {"name": "echo", "version": "1.0", "description": "echo service"},
        "functional_requirements": [{"id": "FR-1", "title": "Echo", "description": "prefix with OK"}],
        "invariants": [
            {"id": "INV-1", "description": "never null", "type": "NON_NULL", "params": {}},
            {"id": "INV-2", "description": "stable", "type": "DETERMINISM", "params": {}},
            {"id": "INV-3", "description": "prefixed", "type": "CONTAINS_SUBSTRING", "params": {"substring": "OK:"}}
        ],
        "examples": [{"id": "EX-1", "input": "hello", "expected_output_contains": ["hello"]}],
        "constraints": {"forbidden_packages": [], "forbidden_classes": [], "allowed_packages": []}
    }"#;

    fn requirements(spec: &str) -> StructuredRequirements {
        SpecLoader::new().parse_bytes(spec.as_bytes()).unwrap()
    }

    /// Adds an example whose input carries every possible poison token.
    fn poisoned_requirements() -> StructuredRequirements {
        let all_tokens: Vec<String> = (0..97).map(|n| format!("seed-{n}")).collect();
        let mut doc: serde_json::Value = serde_json::from_str(SPEC).unwrap();
        doc["examples"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({"id": "EX-P", "input": all_tokens.join(" "), "expected_output_contains": ["OK:"]}));
        requirements(&doc.to_string())
    }

    fn kernel(registry: Arc<InMemoryRegistry>) -> Kernel {
        Kernel::new(KernelConfig::default()).unwrap().with_registry(registry)
    }

    struct FailingPlanner;

    #[async_trait]
    impl Planner for FailingPlanner {
        async fn plan(&self, _: &StructuredRequirements, _: u32) -> Result<Plan, GenerationError> {
            Err(GenerationError::InferenceTimeout(10))
        }
    }

    /// Emits the same fixed bundle every iteration.
    struct FixedCodeGen(&'static str);

    #[async_trait]
    impl CodeGen for FixedCodeGen {
        async fn generate(
            &self,
            _: &StructuredRequirements,
            plan: &Plan,
            _: u32,
        ) -> Result<GeneratedSourceBundle, GenerationError> {
            Ok(GeneratedSourceBundle::new().with_unit(plan.target_unit_name.clone(), self.0))
        }
    }

    #[tokio::test]
    async fn clean_spec_accepts_first_iteration() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone());
        let req = requirements(SPEC);
        let outcome = k.run_requirements(&req).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.iterations.len(), 1);
        let accepted = outcome.accepted_version.clone().unwrap();
        assert!(accepted.starts_with("v1-"));
        assert_eq!(outcome.active_version, accepted);

        let out = k.facade().process(&Request::new("hello")).unwrap();
        assert_eq!(out.output.as_deref(), Some("OK:hello:v1"));

        let records = registry.load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_accepted());
        assert!(records[0].test_report.passed);
        assert!(records[0].error_message.is_none());
    }

    #[tokio::test]
    async fn poisoned_first_iteration_is_rejected_then_recovered() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone());
        let req = poisoned_requirements();
        let token = poison_token(&req.spec_hash);
        let outcome = k.run_requirements(&req).await;

        assert_eq!(outcome.iterations.len(), 2);
        assert_eq!(outcome.iterations[0].failed_stage, Some(IterationStage::Shadow));
        assert!(outcome.iterations[1].is_accepted());
        assert!(outcome.active_version.starts_with("v2-"));

        let records = registry.load_all().unwrap();
        assert!(!records[0].shadow_report.passed);
        assert!(records[0].test_report.passed);
        assert_eq!(records[0].error_message.as_deref(), Some("Shadow run failed"));

        let out = k.facade().process(&Request::new(token.as_str())).unwrap();
        assert_eq!(out.output, Some(format!("OK:{token}:v1")));
        assert_eq!(k.metrics().rejected, 1);
        assert_eq!(k.metrics().accepted, 1);
    }

    #[tokio::test]
    async fn forbidden_source_never_swaps() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone()).with_codegen(Arc::new(FixedCodeGen(
            "fn process(input) { return sys::process::exec(input); }",
        )));
        let outcome = k.run_requirements(&requirements(SPEC)).await;

        assert!(outcome.accepted_version.is_none());
        assert!(outcome.succeeded());
        assert_eq!(outcome.active_version, "default");
        assert_eq!(outcome.iterations.len(), 3);
        for it in &outcome.iterations {
            assert_eq!(it.failed_stage, Some(IterationStage::VerifySource));
        }

        let records = registry.load_all().unwrap();
        assert_eq!(records.len(), 3);
        assert!(!records[0].artifact_verification.passed);
        assert!(records[0].compilation_diagnostics.is_empty());
        assert!(!records[0].test_report.passed);
        let out = k.facade().process(&Request::new("x")).unwrap();
        assert_eq!(out.output.as_deref(), Some("OK:x:default"));
    }

    #[tokio::test]
    async fn compile_failure_records_diagnostics() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone())
            .with_codegen(Arc::new(FixedCodeGen("fn process(input) { return input + ; }")));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert_eq!(outcome.iterations[0].failed_stage, Some(IterationStage::Compile));
        let records = registry.load_all().unwrap();
        assert!(!records[0].compilation_diagnostics.is_empty());
        assert!(records[0].source_verification.passed);
    }

    #[tokio::test]
    async fn aliased_io_is_caught_after_compilation() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone()).with_codegen(Arc::new(FixedCodeGen(
            "use sys::fs as store;\nfn process(input) { return store::read(input); }",
        )));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert_eq!(
            outcome.iterations[0].failed_stage,
            Some(IterationStage::VerifyArtifact)
        );
        let records = registry.load_all().unwrap();
        assert!(records[0].source_verification.passed);
        assert!(!records[0].artifact_verification.passed);
    }

    #[tokio::test]
    async fn missing_entry_point_fails_load() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone())
            .with_codegen(Arc::new(FixedCodeGen("fn handle(input) { return input; }")));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert_eq!(outcome.iterations[0].failed_stage, Some(IterationStage::Load));
        assert!(outcome.iterations[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Load failed:"));
    }

    #[tokio::test]
    async fn runaway_string_growth_is_rejected_at_shadow() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone()).with_codegen(Arc::new(FixedCodeGen(
            "fn process(input) { let s = \"OK:\" + input; let i = 0; while i < 40 { s = s + s; i = i + 1; } return s; }",
        )));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert_eq!(outcome.iterations[0].failed_stage, Some(IterationStage::Shadow));
        let records = registry.load_all().unwrap();
        assert!(records[0].shadow_report.mismatches[0].contains("string too large"));
        assert_eq!(outcome.active_version, "default");
        assert_eq!(k.facade().process(&Request::new("x")).unwrap().output.as_deref(), Some("OK:x:default"));
    }

    #[tokio::test]
    async fn failing_self_check_rejects_at_test() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry.clone()).with_codegen(Arc::new(FixedCodeGen(
            "fn process(input) { return \"OK:\" + input; }\nfn self_check() { return false; }",
        )));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert_eq!(outcome.iterations[0].failed_stage, Some(IterationStage::Test));
        let records = registry.load_all().unwrap();
        assert!(!records[0].shadow_report.passed);
        assert!(records[0].shadow_report.mismatches.is_empty());
        assert_eq!(outcome.active_version, "default");
    }

    #[tokio::test]
    async fn planner_failure_falls_back_to_stub() {
        let registry = Arc::new(InMemoryRegistry::new());
        let mut k = kernel(registry).with_planner(Arc::new(FailingPlanner));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert!(outcome.accepted_version.is_some());
        assert_eq!(k.metrics().generation_fallbacks, 1);
    }

    #[tokio::test]
    async fn invalid_spec_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"meta\": {}}").unwrap();
        let mut k = kernel(Arc::new(InMemoryRegistry::new()));
        let err = k.run(file.path()).await.unwrap_err();
        assert!(matches!(err, KernelError::SpecInvalid(_)));
        assert_eq!(k.metrics().iterations, 0);
    }

    #[tokio::test]
    async fn registry_failure_does_not_block_promotion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "not json").unwrap();
        let mut k = Kernel::new(KernelConfig::default())
            .unwrap()
            .with_registry(Arc::new(JsonFileRegistry::new(&path)));
        let outcome = k.run_requirements(&requirements(SPEC)).await;
        assert!(outcome.accepted_version.is_some());
        assert_eq!(k.metrics().registry_write_failures, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[tokio::test]
    async fn second_run_keeps_serving_previous_version() {
        let registry = Arc::new(InMemoryRegistry::new());
        let swap = Arc::new(HotSwapManager::new());
        let mut first = kernel(registry.clone()).with_swap_manager(Arc::clone(&swap));
        let accepted = first
            .run_requirements(&requirements(SPEC))
            .await
            .accepted_version
            .unwrap();

        let mut second = kernel(registry.clone())
            .with_swap_manager(Arc::clone(&swap))
            .with_codegen(Arc::new(FixedCodeGen("fn process(input) { return nil; }")));
        let outcome = second.run_requirements(&requirements(SPEC)).await;
        assert!(outcome.accepted_version.is_none());
        assert_eq!(outcome.active_version, accepted);
        assert_eq!(registry.load_last_good().unwrap().unwrap().version_id, accepted);
    }

    #[test]
    fn model_backed_config_without_model_is_rejected() {
        let mut config = KernelConfig::default();
        config.llm.mode = LlmMode::ModelBacked;
        assert!(matches!(Kernel::new(config), Err(KernelError::Config(_))));
    }
}
