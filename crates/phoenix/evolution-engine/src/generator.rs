use crate::error::GenerationError;
use async_trait::async_trait;
use phoenix_types::{GeneratedSourceBundle, Plan, StructuredRequirements};

/// Produces the plan for one iteration.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(
        &self,
        req: &StructuredRequirements,
        iteration: u32,
    ) -> Result<Plan, GenerationError>;
}

/// Produces unit sources implementing a plan.
#[async_trait]
pub trait CodeGen: Send + Sync {
    async fn generate(
        &self,
        req: &StructuredRequirements,
        plan: &Plan,
        iteration: u32,
    ) -> Result<GeneratedSourceBundle, GenerationError>;
}
