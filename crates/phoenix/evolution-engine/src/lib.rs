#![deny(unsafe_code)]
//! # phoenix-evolution-engine
//!
//! Produces a [`Plan`](phoenix_types::Plan) and a
//! [`GeneratedSourceBundle`](phoenix_types::GeneratedSourceBundle) for each
//! kernel iteration.
//!
//! Two families sit behind the [`Planner`] and [`CodeGen`] traits:
//!
//! - [`StubPlanner`] / [`StubCodeGen`]: pure functions of the requirements and
//!   the iteration. The first iteration carries a deliberate defect so the
//!   rejection path is exercised end to end.
//! - [`ModelPlanner`] / [`ModelCodeGen`]: prompt a local model through a
//!   [`ModelAdapter`], pull the first JSON document out of the reply and
//!   validate it against a fixed schema.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod extract;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod schema;
pub mod stub;

pub use adapter::{ModelAdapter, ModelRequest, ModelResponse, ResponseMetrics};
pub use backend::{GenerationRequest, InferenceResult, LocalProcessBackend, ModelBackend};
pub use error::GenerationError;
pub use extract::extract_json;
pub use generator::{CodeGen, Planner};
pub use model::{ModelCodeGen, ModelPlanner, SamplingSettings};
pub use prompt::{PromptAssembler, PromptKind};
pub use schema::{parse_codegen, parse_plan, CodeGenOutput};
pub use stub::{poison_token, StubCodeGen, StubPlanner};
