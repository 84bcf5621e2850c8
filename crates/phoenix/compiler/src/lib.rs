#![deny(unsafe_code)]
//! # phoenix-compiler
//!
//! Toolchain for unit scripts, the language candidate implementations are
//! written in.
//!
//! - [`lexer`] and [`parser`] turn source text into an [`ast::UnitAst`].
//! - [`codegen`] resolves calls across every unit of a bundle and emits one
//!   [`bytecode::UnitArtifact`] per unit.
//! - [`artifact`] is the binary codec for compiled units (`PHXU`).
//! - [`context`] links artifacts against the sandboxed [`host`] library into
//!   an isolated [`ExecutionContext`]; [`vm`] runs calls within fuel and
//!   depth limits.

pub mod artifact;
pub mod ast;
pub mod bytecode;
pub mod codegen;
pub mod compiler;
pub mod context;
pub mod error;
pub mod host;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod vm;

pub use artifact::{decode_artifact, encode_artifact};
pub use bytecode::{Constant, Function, Op, Symbol, SymbolKind, UnitArtifact};
pub use compiler::{SourceCompiler, UnitCompiler};
pub use context::{ExecutionContext, ExecutionLimits};
pub use error::{ArtifactError, CompilerError, LinkError};
pub use host::{HostFunction, HostLibrary};
pub use value::Value;
