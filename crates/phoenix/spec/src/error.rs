/// Errors from loading a specification. All of them are fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("cannot read spec {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spec is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("spec.{0} is required")]
    Missing(&'static str),
}
