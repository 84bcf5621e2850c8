/// Errors from the version registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("registry file {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },
    #[error("registry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("registry lock poisoned")]
    LockPoisoned,
}
