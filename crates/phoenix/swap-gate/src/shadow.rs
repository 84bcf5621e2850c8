//! Shadow evaluation of a candidate against requirements and the live
//! implementation.

use async_trait::async_trait;
use phoenix_types::{
    derive_seed, InvariantKind, Request, Service, ShadowReport, StructuredRequirements,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

/// Synthetic inputs appended to the example inputs.
pub const SYNTHETIC_INPUTS: usize = 20;

const SYNTHETIC_RANGE: u32 = 10_000;

/// Example inputs followed by seeded synthetic inputs. Identical requirements
/// always yield the identical corpus.
pub fn build_corpus(req: &StructuredRequirements) -> Vec<String> {
    corpus_with(req, SYNTHETIC_INPUTS)
}

fn corpus_with(req: &StructuredRequirements, synthetic: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(derive_seed(&req.spec_hash, "shadow", 0));
    let mut corpus: Vec<String> = req.examples.iter().map(|e| e.input.clone()).collect();
    corpus.extend((0..synthetic).map(|_| format!("syn-{}", rng.gen_range(0..SYNTHETIC_RANGE))));
    corpus
}

#[async_trait]
pub trait ShadowRunner: Send + Sync {
    async fn run(
        &self,
        req: &StructuredRequirements,
        current: Option<&dyn Service>,
        candidate: &dyn Service,
        require_backward_compat: bool,
    ) -> ShadowReport;
}

/// Replays the corpus through both implementations.
#[derive(Debug, Clone)]
pub struct CorpusShadowRunner {
    synthetic_inputs: usize,
}

impl CorpusShadowRunner {
    pub fn new() -> Self {
        Self {
            synthetic_inputs: SYNTHETIC_INPUTS,
        }
    }

    pub fn with_synthetic_inputs(mut self, n: usize) -> Self {
        self.synthetic_inputs = n;
        self
    }

    fn evaluate(
        &self,
        req: &StructuredRequirements,
        current: Option<&dyn Service>,
        candidate: &dyn Service,
        require_backward_compat: bool,
    ) -> Vec<String> {
        let mut mismatches = Vec::new();
        for input in corpus_with(req, self.synthetic_inputs) {
            let request = Request::new(input.as_str());
            let (first, second) = match (candidate.process(&request), candidate.process(&request))
            {
                (Ok(a), Ok(b)) => (a.output, b.output),
                (Err(e), _) | (_, Err(e)) => {
                    mismatches.push(format!("Candidate fault for input {input}: {e}"));
                    continue;
                }
            };
            // A fault in the live implementation counts as no output.
            let live = current.and_then(|c| c.process(&request).ok().and_then(|r| r.output));

            for inv in &req.invariants {
                if let Some(m) = check_invariant(inv, &input, first.as_deref(), second.as_deref())
                {
                    mismatches.push(m);
                }
            }

            for ex in req.examples.iter().filter(|e| e.input == input) {
                for expected in &ex.expected_output_contains {
                    let hit = first.as_deref().is_some_and(|o| o.contains(expected.as_str()));
                    if !hit {
                        mismatches.push(format!(
                            "{} failed: output missing expected substring {expected}",
                            ex.id
                        ));
                    }
                }
            }

            if require_backward_compat {
                if let (Some(live), Some(out)) = (live.as_deref(), first.as_deref()) {
                    if live != out {
                        mismatches.push(format!("Backward compatibility mismatch for input {input}"));
                    }
                }
            }
        }
        mismatches
    }
}

impl Default for CorpusShadowRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn check_invariant(
    inv: &phoenix_types::InvariantSpec,
    input: &str,
    first: Option<&str>,
    second: Option<&str>,
) -> Option<String> {
    let id = &inv.id;
    match inv.kind {
        InvariantKind::NonNull => first
            .is_none()
            .then(|| format!("{id} failed: output null for input {input}")),
        InvariantKind::Determinism => (first != second)
            .then(|| format!("{id} failed: non-deterministic output for input {input}")),
        InvariantKind::ContainsSubstring => {
            let needle = inv.param("substring")?;
            let hit = first.is_some_and(|o| o.contains(needle));
            (!hit).then(|| format!("{id} failed: output missing substring {needle}"))
        }
        InvariantKind::Regex => {
            let pattern = inv.param("regex")?;
            let hit = match Regex::new(pattern) {
                Ok(re) => first.is_some_and(|o| re.is_match(o)),
                Err(_) => false,
            };
            (!hit).then(|| format!("{id} failed: output does not match regex {pattern}"))
        }
    }
}

#[async_trait]
impl ShadowRunner for CorpusShadowRunner {
    async fn run(
        &self,
        req: &StructuredRequirements,
        current: Option<&dyn Service>,
        candidate: &dyn Service,
        require_backward_compat: bool,
    ) -> ShadowReport {
        let mismatches = self.evaluate(req, current, candidate, require_backward_compat);
        if mismatches.is_empty() {
            tracing::debug!(candidate = candidate.name(), "shadow evaluation clean");
        } else {
            tracing::warn!(
                candidate = candidate.name(),
                mismatches = mismatches.len(),
                "shadow evaluation found mismatches"
            );
        }
        ShadowReport::from_mismatches(mismatches)
    }
}
