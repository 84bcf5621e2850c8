#[path = "e2e/stub_acceptance.rs"]
mod stub_acceptance;

#[path = "e2e/poisoned_first_iteration.rs"]
mod poisoned_first_iteration;

#[path = "e2e/invalid_spec.rs"]
mod invalid_spec;

#[path = "e2e/model_timeout_fallback.rs"]
mod model_timeout_fallback;
