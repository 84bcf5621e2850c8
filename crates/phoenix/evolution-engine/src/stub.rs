//! Deterministic generators used when no model is configured and as the
//! fallback when a model call fails.

use crate::error::GenerationError;
use crate::generator::{CodeGen, Planner};
use async_trait::async_trait;
use phoenix_types::{derive_seed, ContentHash, GeneratedSourceBundle, Plan, StructuredRequirements};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Input token that trips the defect injected on the first iteration.
pub fn poison_token(spec_hash: &ContentHash) -> String {
    format!("seed-{}", spec_hash.byte_sum() % 97)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StubPlanner;

impl StubPlanner {
    pub fn new() -> Self {
        Self
    }

    fn build(req: &StructuredRequirements, iteration: u32) -> Plan {
        let mut rng = StdRng::seed_from_u64(derive_seed(&req.spec_hash, "planner", iteration));
        let n = u64::from(iteration) + 1;
        let target = format!("impl::v{n}::service");
        let tasks = vec![
            "Analyze functional requirements".to_string(),
            format!("Generate implementation unit {target}"),
            "Ensure invariants are enforced".to_string(),
            "Prepare self-check hook".to_string(),
        ];
        Plan {
            version_id: format!("v{n}-{:x}", rng.gen_range(0..1_000_000u32)),
            target_unit_name: target,
            tasks,
        }
    }
}

#[async_trait]
impl Planner for StubPlanner {
    async fn plan(
        &self,
        req: &StructuredRequirements,
        iteration: u32,
    ) -> Result<Plan, GenerationError> {
        Ok(Self::build(req, iteration))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StubCodeGen;

impl StubCodeGen {
    pub fn new() -> Self {
        Self
    }

    fn helper_unit(target: &str) -> String {
        match target.rsplit_once("::") {
            Some((ns, _)) => format!("{ns}::helper"),
            None => format!("{target}_helper"),
        }
    }

    fn helper_source() -> String {
        "fn suffix() {\n    return \"v1\";\n}\n".to_string()
    }

    fn service_source(helper: &str, poison: Option<&str>) -> String {
        let bug = match poison {
            Some(token) => format!(
                "    if std::text::contains(input, \"{token}\") {{\n        return \"BAD\";\n    }}\n"
            ),
            None => String::new(),
        };
        format!(
            "use {helper} as helper;\n\n\
             fn process(input) {{\n\
             {bug}    return \"OK:\" + input + \":\" + helper::suffix();\n\
             }}\n\n\
             fn self_check() {{\n    return helper::suffix() == \"v1\";\n}}\n"
        )
    }

    fn build(req: &StructuredRequirements, plan: &Plan, iteration: u32) -> GeneratedSourceBundle {
        let helper = Self::helper_unit(&plan.target_unit_name);
        let poison = (iteration == 0).then(|| poison_token(&req.spec_hash));
        GeneratedSourceBundle::new()
            .with_unit(helper.clone(), Self::helper_source())
            .with_unit(
                plan.target_unit_name.clone(),
                Self::service_source(&helper, poison.as_deref()),
            )
    }
}

#[async_trait]
impl CodeGen for StubCodeGen {
    async fn generate(
        &self,
        req: &StructuredRequirements,
        plan: &Plan,
        iteration: u32,
    ) -> Result<GeneratedSourceBundle, GenerationError> {
        Ok(Self::build(req, plan, iteration))
    }
}
