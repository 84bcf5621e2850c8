#[path = "adversarial/verifier_bypass.rs"]
mod verifier_bypass;

#[path = "adversarial/concurrent_swap.rs"]
mod concurrent_swap;
