//! End-to-end: a malformed spec aborts before any iteration and leaves the
//! registry untouched.

use phoenix_kernel::{Kernel, KernelConfig, KernelError};
use phoenix_registry::{JsonFileRegistry, VersionRegistry};
use phoenix_spec::SpecError;
use phoenix_tests::{hello_spec, to_bytes};

#[tokio::test]
async fn missing_constraints_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc = hello_spec();
    doc.as_object_mut().unwrap().remove("constraints");
    let spec = dir.path().join("spec.json");
    std::fs::write(&spec, to_bytes(&doc)).unwrap();

    let registry_path = dir.path().join("registry.json");
    let mut config = KernelConfig::default();
    config.kernel.registry_path = registry_path.clone();
    let mut k = Kernel::new(config).unwrap();

    let err = k.run(&spec).await.unwrap_err();
    assert!(matches!(
        err,
        KernelError::SpecInvalid(SpecError::Missing("constraints"))
    ));
    assert_eq!(k.metrics().iterations, 0);
    assert!(!registry_path.exists());
    assert!(JsonFileRegistry::new(&registry_path).load_all().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_spec_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = KernelConfig::default();
    config.kernel.registry_path = dir.path().join("registry.json");
    let mut k = Kernel::new(config).unwrap();
    let err = k.run(&dir.path().join("absent.json")).await.unwrap_err();
    assert!(matches!(err, KernelError::SpecInvalid(_)));
    assert_eq!(k.facade().active_version(), "default");
}
