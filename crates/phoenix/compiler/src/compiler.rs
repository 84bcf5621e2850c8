use crate::artifact::encode_artifact;
use crate::ast::UnitAst;
use crate::codegen::{build_index, generate};
use crate::error::CompilerError;
use crate::host::HostLibrary;
use crate::parser::parse_unit;
use phoenix_types::{CompilationResult, GeneratedSourceBundle};
use std::collections::BTreeMap;

/// Compiles a source bundle into per-unit artifacts.
///
/// Implementations never fail outright: problems are reported through
/// [`CompilationResult::diagnostics`] with `success == false`.
pub trait SourceCompiler: Send + Sync {
    fn compile(&self, bundle: &GeneratedSourceBundle) -> CompilationResult;
}

/// In-process compiler for unit scripts.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitCompiler;

impl UnitCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl SourceCompiler for UnitCompiler {
    fn compile(&self, bundle: &GeneratedSourceBundle) -> CompilationResult {
        if bundle.is_empty() {
            return CompilationResult::failed(vec!["error: bundle contains no units".into()]);
        }

        let mut diagnostics = Vec::new();
        let mut parsed: BTreeMap<&str, UnitAst> = BTreeMap::new();
        let mut failed = false;

        for (name, source) in bundle.iter() {
            match parse_unit(name, source) {
                Ok(ast) => {
                    parsed.insert(name, ast);
                }
                Err(e) => {
                    failed = true;
                    diagnostics.push(format_diagnostic(&e));
                }
            }
        }

        let index = build_index(parsed.iter().map(|(n, a)| (*n, a)));
        let host = HostLibrary::global();
        let mut artifacts = BTreeMap::new();

        for (name, ast) in &parsed {
            let encoded = generate(name, ast, &index, host).and_then(|artifact| {
                let bytes = encode_artifact(&artifact).map_err(|e| CompilerError::Limit {
                    unit: name.to_string(),
                    message: e.to_string(),
                })?;
                Ok((artifact, bytes))
            });
            match encoded {
                Ok((artifact, bytes)) => {
                    diagnostics.push(format!(
                        "{name}: compiled {} functions, {} symbols",
                        artifact.functions.len(),
                        artifact.symbols.len()
                    ));
                    artifacts.insert(name.to_string(), bytes);
                }
                Err(e) => {
                    failed = true;
                    diagnostics.push(format_diagnostic(&e));
                }
            }
        }

        if failed {
            tracing::debug!(units = bundle.len(), "compilation failed");
            return CompilationResult::failed(diagnostics);
        }
        CompilationResult {
            success: true,
            artifacts,
            diagnostics,
        }
    }
}

/// Renders a compiler error the way diagnostics list it.
pub fn format_diagnostic(e: &CompilerError) -> String {
    format!("error: {e}")
}
