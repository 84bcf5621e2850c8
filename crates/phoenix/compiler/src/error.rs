/// Errors raised while compiling a single unit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompilerError {
    #[error("{unit}:{line}:{col}: syntax error: {message}")]
    Syntax {
        unit: String,
        line: u32,
        col: u32,
        message: String,
    },
    #[error("{unit}:{line}:{col}: {message}")]
    Resolve {
        unit: String,
        line: u32,
        col: u32,
        message: String,
    },
    #[error("{unit}: limit exceeded: {message}")]
    Limit { unit: String, message: String },
}

/// Errors decoding a compiled artifact.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact truncated while reading {0}")]
    Truncated(&'static str),
    #[error("bad artifact magic")]
    BadMagic,
    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u16),
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),
    #[error("invalid tag {tag} in {what}")]
    InvalidTag { what: &'static str, tag: u8 },
    #[error("artifact string is not valid UTF-8")]
    InvalidUtf8,
    #[error("{0} trailing bytes after artifact")]
    TrailingBytes(usize),
    #[error("too many {0} for the artifact format")]
    TooLarge(&'static str),
}

/// Errors linking artifacts into an execution context.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("unit {unit}: {source}")]
    Artifact {
        unit: String,
        #[source]
        source: ArtifactError,
    },
    #[error("artifact keyed {key} declares unit {declared}")]
    UnitMismatch { key: String, declared: String },
    #[error("unit {unit} imports {symbol}, which is not linkable in a sandbox")]
    ForbiddenImport { unit: String, symbol: String },
    #[error("unit {unit} references unknown symbol {symbol}")]
    UnknownSymbol { unit: String, symbol: String },
    #[error("unit {unit} has an out-of-range {what} index {index}")]
    BadReference {
        unit: String,
        what: &'static str,
        index: usize,
    },
}
