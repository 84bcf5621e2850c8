//! Model-backed planner and code generator.

use crate::adapter::{ModelAdapter, ModelRequest};
use crate::error::GenerationError;
use crate::extract::extract_json;
use crate::generator::{CodeGen, Planner};
use crate::prompt::{PromptAssembler, PromptKind};
use crate::schema::{parse_codegen, parse_plan};
use async_trait::async_trait;
use phoenix_types::{derive_seed, GeneratedSourceBundle, Plan, StructuredRequirements};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-request sampling parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingSettings {
    pub max_tokens: u32,
    pub temperature: f64,
    /// Fixed base seed; derived from the spec hash when absent.
    pub seed: Option<u64>,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
            seed: None,
        }
    }
}

impl SamplingSettings {
    fn seed_for(&self, req: &StructuredRequirements, iteration: u32) -> u64 {
        self.seed
            .unwrap_or_else(|| derive_seed(&req.spec_hash, "model", 0))
            .wrapping_add(u64::from(iteration))
    }

    fn request(
        &self,
        task: &str,
        req: &StructuredRequirements,
        prompt: String,
        iteration: u32,
        metadata: BTreeMap<String, String>,
    ) -> ModelRequest {
        ModelRequest {
            task: task.to_string(),
            spec_hash: req.spec_hash.to_hex(),
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            seed: self.seed_for(req, iteration),
            metadata,
        }
    }
}

pub struct ModelPlanner {
    adapter: Arc<ModelAdapter>,
    settings: SamplingSettings,
    prompts: PromptAssembler,
}

impl ModelPlanner {
    pub fn new(adapter: Arc<ModelAdapter>, settings: SamplingSettings) -> Self {
        Self {
            adapter,
            settings,
            prompts: PromptAssembler::new(),
        }
    }
}

#[async_trait]
impl Planner for ModelPlanner {
    async fn plan(
        &self,
        req: &StructuredRequirements,
        iteration: u32,
    ) -> Result<Plan, GenerationError> {
        let prompt = self.prompts.assemble(req, PromptKind::Plan, iteration, None);
        let metadata = BTreeMap::from([("iteration".to_string(), iteration.to_string())]);
        let response = self
            .adapter
            .generate(self.settings.request("plan", req, prompt, iteration, metadata))
            .await?;
        let plan = parse_plan(&extract_json(&response.text)?)?;
        tracing::info!(version_id = %plan.version_id, iteration, "model plan generated");
        Ok(plan)
    }
}

pub struct ModelCodeGen {
    adapter: Arc<ModelAdapter>,
    settings: SamplingSettings,
    prompts: PromptAssembler,
}

impl ModelCodeGen {
    pub fn new(adapter: Arc<ModelAdapter>, settings: SamplingSettings) -> Self {
        Self {
            adapter,
            settings,
            prompts: PromptAssembler::new(),
        }
    }
}

#[async_trait]
impl CodeGen for ModelCodeGen {
    async fn generate(
        &self,
        req: &StructuredRequirements,
        plan: &Plan,
        iteration: u32,
    ) -> Result<GeneratedSourceBundle, GenerationError> {
        let prompt = self.prompts.assemble(
            req,
            PromptKind::CodeGen,
            iteration,
            Some(&plan.target_unit_name),
        );
        let metadata = BTreeMap::from([
            ("iteration".to_string(), iteration.to_string()),
            ("planVersionId".to_string(), plan.version_id.clone()),
            ("targetUnit".to_string(), plan.target_unit_name.clone()),
        ]);
        let response = self
            .adapter
            .generate(self.settings.request("codegen", req, prompt, iteration, metadata))
            .await?;
        let out = parse_codegen(&extract_json(&response.text)?)?;
        if out.version_id != plan.version_id {
            tracing::warn!(
                plan = %plan.version_id,
                codegen = %out.version_id,
                "codegen version mismatch"
            );
        }
        Ok(out.bundle)
    }
}
