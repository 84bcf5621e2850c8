//! Per-candidate isolated execution context.

use crate::artifact::decode_artifact;
use crate::bytecode::{Constant, Function, Op, SymbolKind};
use crate::error::LinkError;
use crate::host::{CallEnv, HostFunction, HostLibrary};
use crate::value::Value;
use crate::vm;
use phoenix_types::{Request, ServiceError};
use std::collections::{BTreeMap, HashMap};

/// Resource bounds applied to every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Instructions per top-level call.
    pub fuel: u64,
    pub max_call_depth: usize,
    pub max_stack: usize,
    /// Largest string, in bytes, a call may build.
    pub max_string_bytes: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            fuel: 100_000,
            max_call_depth: 64,
            max_stack: 10_000,
            max_string_bytes: 1 << 20,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Resolved {
    Host(&'static HostFunction),
    Unit { unit: usize, func: usize },
    Import,
}

#[derive(Debug)]
pub(crate) struct LinkedUnit {
    pub(crate) name: String,
    pub(crate) functions: Vec<Function>,
    pub(crate) constants: Vec<Value>,
    pub(crate) symbols: Vec<Resolved>,
}

/// The linked program of one candidate. Immutable after [`link`](Self::link),
/// so it can be shared across threads; each call gets private VM state.
#[derive(Debug)]
pub struct ExecutionContext {
    pub(crate) units: Vec<LinkedUnit>,
    by_name: HashMap<String, usize>,
    pub(crate) limits: ExecutionLimits,
}

impl ExecutionContext {
    /// Decodes and links `artifacts` (unit name to bytes) against the
    /// sandboxed host library.
    pub fn link(artifacts: &BTreeMap<String, Vec<u8>>) -> Result<Self, LinkError> {
        let host = HostLibrary::global();
        let mut decoded = Vec::with_capacity(artifacts.len());
        for (key, bytes) in artifacts {
            let artifact = decode_artifact(bytes).map_err(|source| LinkError::Artifact {
                unit: key.clone(),
                source,
            })?;
            if &artifact.unit_name != key {
                return Err(LinkError::UnitMismatch {
                    key: key.clone(),
                    declared: artifact.unit_name,
                });
            }
            decoded.push(artifact);
        }

        let by_name: HashMap<String, usize> = decoded
            .iter()
            .enumerate()
            .map(|(i, a)| (a.unit_name.clone(), i))
            .collect();

        let mut units = Vec::with_capacity(decoded.len());
        for artifact in &decoded {
            let mut symbols = Vec::with_capacity(artifact.symbols.len());
            for sym in &artifact.symbols {
                let resolved = match sym.kind {
                    SymbolKind::Import => Resolved::Import,
                    SymbolKind::Host => {
                        let f = host.lookup(&sym.name).ok_or_else(|| LinkError::UnknownSymbol {
                            unit: artifact.unit_name.clone(),
                            symbol: sym.name.clone(),
                        })?;
                        if !f.linkable {
                            return Err(LinkError::ForbiddenImport {
                                unit: artifact.unit_name.clone(),
                                symbol: sym.name.clone(),
                            });
                        }
                        Resolved::Host(f)
                    }
                    SymbolKind::Unit => {
                        let unknown = || LinkError::UnknownSymbol {
                            unit: artifact.unit_name.clone(),
                            symbol: sym.name.clone(),
                        };
                        let (unit_name, fn_name) = sym.name.rsplit_once("::").ok_or_else(unknown)?;
                        let unit = *by_name.get(unit_name).ok_or_else(unknown)?;
                        let (func, _) = decoded[unit].function(fn_name).ok_or_else(unknown)?;
                        Resolved::Unit { unit, func }
                    }
                };
                symbols.push(resolved);
            }
            let constants = artifact
                .constants
                .iter()
                .map(|c| match c {
                    Constant::Int(i) => Value::Int(*i),
                    Constant::Str(s) => Value::Str(s.clone()),
                })
                .collect();
            units.push(LinkedUnit {
                name: artifact.unit_name.clone(),
                functions: artifact.functions.clone(),
                constants,
                symbols,
            });
        }

        let ctx = Self {
            units,
            by_name,
            limits: ExecutionLimits::default(),
        };
        ctx.validate()?;
        tracing::debug!(units = ctx.units.len(), "linked execution context");
        Ok(ctx)
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    pub fn has_unit(&self, unit: &str) -> bool {
        self.by_name.contains_key(unit)
    }

    /// Arity of `unit::func`, if it exists.
    pub fn export_arity(&self, unit: &str, func: &str) -> Option<u8> {
        let u = &self.units[*self.by_name.get(unit)?];
        u.functions.iter().find(|f| f.name == func).map(|f| f.arity)
    }

    /// Calls `unit::func` with `args`. `request` is visible to `std::attrs`.
    pub fn call(
        &self,
        unit: &str,
        func: &str,
        args: Vec<Value>,
        request: &Request,
    ) -> Result<Value, ServiceError> {
        let unit_idx = *self
            .by_name
            .get(unit)
            .ok_or_else(|| ServiceError::Fault(format!("no unit {unit}")))?;
        let (func_idx, f) = self.units[unit_idx]
            .functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == func)
            .ok_or_else(|| ServiceError::Fault(format!("no function {unit}::{func}")))?;
        if usize::from(f.arity) != args.len() {
            return Err(ServiceError::Fault(format!(
                "{unit}::{func} takes {} arguments, {} given",
                f.arity,
                args.len()
            )));
        }
        let env = CallEnv {
            request,
            max_string_bytes: self.limits.max_string_bytes,
        };
        vm::run(self, unit_idx, func_idx, args, &env)
    }

    /// Checks every operand so the interpreter never indexes out of range.
    fn validate(&self) -> Result<(), LinkError> {
        for unit in &self.units {
            let bad = |what: &'static str, index: usize| LinkError::BadReference {
                unit: unit.name.clone(),
                what,
                index,
            };
            for f in &unit.functions {
                if f.locals < u16::from(f.arity) {
                    return Err(bad("locals", usize::from(f.locals)));
                }
                if !matches!(f.code.last(), Some(Op::Return | Op::ReturnNil)) {
                    return Err(bad("terminator", f.code.len()));
                }
                for op in &f.code {
                    match *op {
                        Op::Const(i) if usize::from(i) >= unit.constants.len() => {
                            return Err(bad("constant", usize::from(i)))
                        }
                        Op::Load(i) | Op::Store(i) if i >= f.locals => {
                            return Err(bad("local", usize::from(i)))
                        }
                        Op::Jump(t) | Op::JumpIfFalse(t) if t as usize >= f.code.len() => {
                            return Err(bad("jump", t as usize))
                        }
                        Op::CallLocal(i, argc) => match unit.functions.get(usize::from(i)) {
                            Some(callee) if callee.arity == argc => {}
                            _ => return Err(bad("function", usize::from(i))),
                        },
                        Op::CallSymbol(i, argc) => match unit.symbols.get(usize::from(i)) {
                            Some(Resolved::Host(h)) if h.arity.accepts(usize::from(argc)) => {}
                            Some(Resolved::Unit { unit: u, func }) => {
                                let arity = self.units[*u].functions[*func].arity;
                                if arity != argc {
                                    return Err(bad("symbol", usize::from(i)));
                                }
                            }
                            _ => return Err(bad("symbol", usize::from(i))),
                        },
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}
