//! Compiled form of a unit.

/// Stack machine instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Const(u16),
    Nil,
    True,
    False,
    Load(u16),
    Store(u16),
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Not,
    Neg,
    Jump(u32),
    JumpIfFalse(u32),
    /// Function index within the same unit, argument count.
    CallLocal(u16, u8),
    /// Symbol table index, argument count.
    CallSymbol(u16, u8),
    Return,
    ReturnNil,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    Int(i64),
    Str(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A host library function.
    Host,
    /// A function exported by another unit of the same bundle.
    Unit,
    /// A path named by a `use` declaration.
    Import,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Fully qualified path, e.g. `std::text::concat`.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub arity: u8,
    /// Local slots, parameters included.
    pub locals: u16,
    pub code: Vec<Op>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitArtifact {
    pub unit_name: String,
    pub symbols: Vec<Symbol>,
    pub constants: Vec<Constant>,
    pub functions: Vec<Function>,
}

impl UnitArtifact {
    pub fn function(&self, name: &str) -> Option<(usize, &Function)> {
        self.functions.iter().enumerate().find(|(_, f)| f.name == name)
    }
}
