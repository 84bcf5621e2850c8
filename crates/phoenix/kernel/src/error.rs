use phoenix_spec::SpecError;

/// Errors that abort a whole kernel run.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("specification invalid: {0}")]
    SpecInvalid(#[from] SpecError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from loading or validating [`KernelConfig`](crate::KernelConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = KernelError::from(SpecError::Missing("meta"));
        assert_eq!(e.to_string(), "specification invalid: spec.meta is required");
        let e = KernelError::from(ConfigError::Invalid("llm.timeout_ms must be positive".into()));
        assert!(e.to_string().contains("timeout_ms"));
    }
}
