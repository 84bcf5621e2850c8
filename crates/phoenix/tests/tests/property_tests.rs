#[path = "property/determinism.rs"]
mod determinism;

#[path = "property/registry_roundtrip.rs"]
mod registry_roundtrip;

#[path = "property/verifier_denylist.rs"]
mod verifier_denylist;
