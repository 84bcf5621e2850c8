#![deny(unsafe_code)]
//! # phoenix-swap-gate
//!
//! Promotion machinery for candidate implementations.
//!
//! - [`HotSwapManager`] loads candidates into isolated execution contexts and
//!   publishes them through a single atomic cell.
//! - [`StableFacade`] is the entry point live callers hold; every call reads
//!   the cell once, so a swap is never observed half applied.
//! - [`ShadowRunner`] compares a candidate against the requirements and the
//!   current implementation before promotion.

pub mod candidate;
pub mod error;
pub mod facade;
pub mod manager;
pub mod shadow;

pub use candidate::{CandidateHandle, ScriptService, ENTRY_POINT, SELF_CHECK_HOOK};
pub use error::SwapError;
pub use facade::StableFacade;
pub use manager::{ActiveSlot, HotSwapManager};
pub use shadow::{build_corpus, CorpusShadowRunner, ShadowRunner, SYNTHETIC_INPUTS};
