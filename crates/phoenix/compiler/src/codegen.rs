//! Lowers a parsed unit to bytecode.

use crate::ast::{BinOp, Expr, FnDecl, Stmt, UnaryOp, UnitAst};
use crate::bytecode::{Constant, Function, Op, Symbol, SymbolKind, UnitArtifact};
use crate::error::CompilerError;
use crate::host::HostLibrary;
use crate::lexer::Span;
use std::collections::HashMap;

/// Exported functions (name to arity) of every unit in a bundle.
pub type UnitIndex = HashMap<String, HashMap<String, usize>>;

/// Builds the export index from parsed units.
pub fn build_index<'a>(units: impl IntoIterator<Item = (&'a str, &'a UnitAst)>) -> UnitIndex {
    units
        .into_iter()
        .map(|(name, ast)| {
            let exports = ast
                .functions
                .iter()
                .map(|f| (f.name.clone(), f.params.len()))
                .collect();
            (name.to_string(), exports)
        })
        .collect()
}

/// Compiles one unit against the bundle index and host library.
pub fn generate(
    unit: &str,
    ast: &UnitAst,
    index: &UnitIndex,
    host: &HostLibrary,
) -> Result<UnitArtifact, CompilerError> {
    let mut gen = UnitGen {
        unit,
        index,
        host,
        aliases: HashMap::new(),
        local_fns: HashMap::new(),
        symbols: Vec::new(),
        symbol_ids: HashMap::new(),
        constants: Vec::new(),
        constant_ids: HashMap::new(),
    };

    for u in &ast.uses {
        gen.aliases.insert(u.alias.clone(), u.path.clone());
        gen.intern_symbol(SymbolKind::Import, u.path.join("::"))?;
    }
    for (i, f) in ast.functions.iter().enumerate() {
        if u8::try_from(f.params.len()).is_err() {
            return Err(gen.limit(&format!("function `{}` has too many parameters", f.name)));
        }
        if gen
            .local_fns
            .insert(f.name.clone(), (i, f.params.len()))
            .is_some()
        {
            let msg = format!("duplicate function `{}`", f.name);
            return Err(gen.resolve_error(f.span, &msg));
        }
    }
    if u16::try_from(ast.functions.len()).is_err() {
        return Err(gen.limit("too many functions"));
    }

    let mut functions = Vec::with_capacity(ast.functions.len());
    for f in &ast.functions {
        functions.push(gen.function(f)?);
    }

    Ok(UnitArtifact {
        unit_name: unit.to_string(),
        symbols: gen.symbols,
        constants: gen.constants,
        functions,
    })
}

enum CallTarget {
    Local(u16),
    Symbol(u16),
}

struct UnitGen<'a> {
    unit: &'a str,
    index: &'a UnitIndex,
    host: &'a HostLibrary,
    aliases: HashMap<String, Vec<String>>,
    local_fns: HashMap<String, (usize, usize)>,
    symbols: Vec<Symbol>,
    symbol_ids: HashMap<(SymbolKind, String), u16>,
    constants: Vec<Constant>,
    constant_ids: HashMap<ConstKey, u16>,
}

#[derive(PartialEq, Eq, Hash)]
enum ConstKey {
    Int(i64),
    Str(String),
}

struct FnGen {
    code: Vec<Op>,
    scopes: Vec<HashMap<String, u16>>,
    next_slot: u16,
}

impl FnGen {
    fn lookup(&self, name: &str) -> Option<u16> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn here(&self) -> u32 {
        self.code.len() as u32
    }

    fn emit(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    fn patch(&mut self, at: usize, target: u32) {
        match &mut self.code[at] {
            Op::Jump(t) | Op::JumpIfFalse(t) => *t = target,
            _ => {}
        }
    }
}

impl<'a> UnitGen<'a> {
    fn resolve_error(&self, span: Span, message: &str) -> CompilerError {
        CompilerError::Resolve {
            unit: self.unit.to_string(),
            line: span.line,
            col: span.col,
            message: message.to_string(),
        }
    }

    fn limit(&self, message: &str) -> CompilerError {
        CompilerError::Limit {
            unit: self.unit.to_string(),
            message: message.to_string(),
        }
    }

    fn intern_symbol(&mut self, kind: SymbolKind, name: String) -> Result<u16, CompilerError> {
        if let Some(id) = self.symbol_ids.get(&(kind, name.clone())) {
            return Ok(*id);
        }
        let id = u16::try_from(self.symbols.len()).map_err(|_| self.limit("too many symbols"))?;
        self.symbols.push(Symbol {
            kind,
            name: name.clone(),
        });
        self.symbol_ids.insert((kind, name), id);
        Ok(id)
    }

    fn intern_constant(&mut self, c: Constant) -> Result<u16, CompilerError> {
        let key = match &c {
            Constant::Int(i) => ConstKey::Int(*i),
            Constant::Str(s) => ConstKey::Str(s.clone()),
        };
        if let Some(id) = self.constant_ids.get(&key) {
            return Ok(*id);
        }
        let id =
            u16::try_from(self.constants.len()).map_err(|_| self.limit("too many constants"))?;
        self.constants.push(c);
        self.constant_ids.insert(key, id);
        Ok(id)
    }

    fn function(&mut self, f: &FnDecl) -> Result<Function, CompilerError> {
        let mut fg = FnGen {
            code: Vec::new(),
            scopes: vec![HashMap::new()],
            next_slot: 0,
        };
        for p in &f.params {
            if fg.scopes[0].contains_key(p) {
                let msg = format!("duplicate parameter `{p}`");
                return Err(self.resolve_error(f.span, &msg));
            }
            let slot = fg.next_slot;
            fg.scopes[0].insert(p.clone(), slot);
            fg.next_slot += 1;
        }
        self.block(&mut fg, &f.body)?;
        fg.emit(Op::ReturnNil);
        if u32::try_from(fg.code.len()).is_err() {
            return Err(self.limit("function body too large"));
        }
        let arity = u8::try_from(f.params.len())
            .map_err(|_| self.limit(&format!("function `{}` has too many parameters", f.name)))?;
        Ok(Function {
            name: f.name.clone(),
            arity,
            locals: fg.next_slot,
            code: fg.code,
        })
    }

    fn block(&mut self, fg: &mut FnGen, stmts: &[Stmt]) -> Result<(), CompilerError> {
        fg.scopes.push(HashMap::new());
        for s in stmts {
            self.stmt(fg, s)?;
        }
        fg.scopes.pop();
        Ok(())
    }

    fn stmt(&mut self, fg: &mut FnGen, stmt: &Stmt) -> Result<(), CompilerError> {
        match stmt {
            Stmt::Let { name, value, .. } => {
                self.expr(fg, value)?;
                let slot = fg.next_slot;
                fg.next_slot = fg
                    .next_slot
                    .checked_add(1)
                    .ok_or_else(|| self.limit("too many locals"))?;
                if let Some(scope) = fg.scopes.last_mut() {
                    scope.insert(name.clone(), slot);
                }
                fg.emit(Op::Store(slot));
            }
            Stmt::Assign { name, value, span } => {
                let slot = fg.lookup(name).ok_or_else(|| {
                    self.resolve_error(*span, &format!("assignment to undeclared variable `{name}`"))
                })?;
                self.expr(fg, value)?;
                fg.emit(Op::Store(slot));
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(fg, cond)?;
                let to_else = fg.emit(Op::JumpIfFalse(0));
                self.block(fg, then_block)?;
                match else_block {
                    Some(else_stmts) => {
                        let to_end = fg.emit(Op::Jump(0));
                        let else_at = fg.here();
                        fg.patch(to_else, else_at);
                        self.block(fg, else_stmts)?;
                        let end = fg.here();
                        fg.patch(to_end, end);
                    }
                    None => {
                        let end = fg.here();
                        fg.patch(to_else, end);
                    }
                }
            }
            Stmt::While { cond, body } => {
                let start = fg.here();
                self.expr(fg, cond)?;
                let to_end = fg.emit(Op::JumpIfFalse(0));
                self.block(fg, body)?;
                fg.emit(Op::Jump(start));
                let end = fg.here();
                fg.patch(to_end, end);
            }
            Stmt::Return(Some(e)) => {
                self.expr(fg, e)?;
                fg.emit(Op::Return);
            }
            Stmt::Return(None) => {
                fg.emit(Op::ReturnNil);
            }
            Stmt::Expr(e) => {
                self.expr(fg, e)?;
                fg.emit(Op::Pop);
            }
        }
        Ok(())
    }

    fn expr(&mut self, fg: &mut FnGen, expr: &Expr) -> Result<(), CompilerError> {
        match expr {
            Expr::Nil => {
                fg.emit(Op::Nil);
            }
            Expr::Bool(true) => {
                fg.emit(Op::True);
            }
            Expr::Bool(false) => {
                fg.emit(Op::False);
            }
            Expr::Int(i) => {
                let id = self.intern_constant(Constant::Int(*i))?;
                fg.emit(Op::Const(id));
            }
            Expr::Str(s) => {
                let id = self.intern_constant(Constant::Str(s.clone()))?;
                fg.emit(Op::Const(id));
            }
            Expr::Var { name, span } => {
                let slot = fg.lookup(name).ok_or_else(|| {
                    self.resolve_error(*span, &format!("unknown variable `{name}`"))
                })?;
                fg.emit(Op::Load(slot));
            }
            Expr::Unary { op, operand } => {
                self.expr(fg, operand)?;
                fg.emit(match op {
                    UnaryOp::Not => Op::Not,
                    UnaryOp::Neg => Op::Neg,
                });
            }
            Expr::Binary {
                op: BinOp::And,
                lhs,
                rhs,
            } => {
                self.expr(fg, lhs)?;
                let f1 = fg.emit(Op::JumpIfFalse(0));
                self.expr(fg, rhs)?;
                let f2 = fg.emit(Op::JumpIfFalse(0));
                fg.emit(Op::True);
                let to_end = fg.emit(Op::Jump(0));
                let false_at = fg.here();
                fg.patch(f1, false_at);
                fg.patch(f2, false_at);
                fg.emit(Op::False);
                let end = fg.here();
                fg.patch(to_end, end);
            }
            Expr::Binary {
                op: BinOp::Or,
                lhs,
                rhs,
            } => {
                self.expr(fg, lhs)?;
                let to_rhs = fg.emit(Op::JumpIfFalse(0));
                fg.emit(Op::True);
                let end1 = fg.emit(Op::Jump(0));
                let rhs_at = fg.here();
                fg.patch(to_rhs, rhs_at);
                self.expr(fg, rhs)?;
                let to_false = fg.emit(Op::JumpIfFalse(0));
                fg.emit(Op::True);
                let end2 = fg.emit(Op::Jump(0));
                let false_at = fg.here();
                fg.patch(to_false, false_at);
                fg.emit(Op::False);
                let end = fg.here();
                fg.patch(end1, end);
                fg.patch(end2, end);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(fg, lhs)?;
                self.expr(fg, rhs)?;
                fg.emit(match op {
                    BinOp::Add => Op::Add,
                    BinOp::Sub => Op::Sub,
                    BinOp::Mul => Op::Mul,
                    BinOp::Div => Op::Div,
                    BinOp::Rem => Op::Rem,
                    BinOp::Eq => Op::Eq,
                    BinOp::Ne => Op::Ne,
                    BinOp::Lt => Op::Lt,
                    BinOp::Le => Op::Le,
                    BinOp::Gt => Op::Gt,
                    BinOp::Ge => Op::Ge,
                    BinOp::And | BinOp::Or => unreachable!("handled above"),
                });
            }
            Expr::Call { path, args, span } => {
                let argc = u8::try_from(args.len())
                    .map_err(|_| self.resolve_error(*span, "too many arguments"))?;
                let target = self.resolve_call(path, args.len(), *span)?;
                for a in args {
                    self.expr(fg, a)?;
                }
                fg.emit(match target {
                    CallTarget::Local(idx) => Op::CallLocal(idx, argc),
                    CallTarget::Symbol(idx) => Op::CallSymbol(idx, argc),
                });
            }
        }
        Ok(())
    }

    fn resolve_call(
        &mut self,
        path: &[String],
        argc: usize,
        span: Span,
    ) -> Result<CallTarget, CompilerError> {
        let full: Vec<String> = match path {
            [name] => {
                if let Some(&(idx, arity)) = self.local_fns.get(name) {
                    return self.local_target(name, idx, arity, argc, span);
                }
                match self.aliases.get(name) {
                    Some(expanded) => expanded.clone(),
                    None => {
                        return Err(self.resolve_error(span, &format!("unknown function `{name}`")))
                    }
                }
            }
            [first, rest @ ..] => match self.aliases.get(first) {
                Some(expanded) => expanded.iter().chain(rest.iter()).cloned().collect(),
                None => path.to_vec(),
            },
            [] => return Err(self.resolve_error(span, "empty call path")),
        };

        let Some((fn_name, unit_path)) = full.split_last() else {
            return Err(self.resolve_error(span, "empty call path"));
        };
        let unit_name = unit_path.join("::");
        let joined = full.join("::");

        if unit_name == self.unit {
            return match self.local_fns.get(fn_name) {
                Some(&(idx, arity)) => self.local_target(fn_name, idx, arity, argc, span),
                None => Err(self.resolve_error(span, &format!("unknown function `{joined}`"))),
            };
        }
        if let Some(exports) = self.index.get(&unit_name) {
            let arity = exports.get(fn_name).copied().ok_or_else(|| {
                self.resolve_error(
                    span,
                    &format!("unit `{unit_name}` has no function `{fn_name}`"),
                )
            })?;
            if arity != argc {
                return Err(self.resolve_error(
                    span,
                    &format!("`{joined}` takes {arity} arguments, {argc} given"),
                ));
            }
            return Ok(CallTarget::Symbol(self.intern_symbol(SymbolKind::Unit, joined)?));
        }
        if let Some(host_fn) = self.host.lookup(&joined) {
            if !host_fn.arity.accepts(argc) {
                return Err(self.resolve_error(
                    span,
                    &format!("`{joined}` does not accept {argc} arguments"),
                ));
            }
            return Ok(CallTarget::Symbol(self.intern_symbol(SymbolKind::Host, joined)?));
        }
        Err(self.resolve_error(span, &format!("unresolved function `{joined}`")))
    }

    fn local_target(
        &self,
        name: &str,
        idx: usize,
        arity: usize,
        argc: usize,
        span: Span,
    ) -> Result<CallTarget, CompilerError> {
        if arity != argc {
            return Err(self.resolve_error(
                span,
                &format!("`{name}` takes {arity} arguments, {argc} given"),
            ));
        }
        let idx = u16::try_from(idx).map_err(|_| self.limit("too many functions"))?;
        Ok(CallTarget::Local(idx))
    }
}
