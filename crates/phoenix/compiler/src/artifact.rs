//! Binary codec for [`UnitArtifact`].
//!
//! Layout (big-endian):
//!
//! ```text
//! "PHXU" u16:version str:unit_name
//! u16:n_symbols  { u8:kind str:name }*
//! u16:n_consts   { u8:tag (0 => i64 | 1 => str) }*
//! u16:n_funcs    { str:name u8:arity u16:locals u32:n_ops { u8:opcode operands }* }*
//! ```
//!
//! Strings are `u32` length-prefixed UTF-8. Decoding rejects trailing bytes.

use crate::bytecode::{Constant, Function, Op, Symbol, SymbolKind, UnitArtifact};
use crate::error::ArtifactError;
use bytes::{Buf, BufMut, BytesMut};

pub const MAGIC: &[u8; 4] = b"PHXU";
pub const FORMAT_VERSION: u16 = 1;

pub fn encode_artifact(artifact: &UnitArtifact) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = BytesMut::with_capacity(256);
    buf.put_slice(MAGIC);
    buf.put_u16(FORMAT_VERSION);
    put_str(&mut buf, &artifact.unit_name);

    buf.put_u16(count(artifact.symbols.len(), "symbols")?);
    for sym in &artifact.symbols {
        buf.put_u8(match sym.kind {
            SymbolKind::Host => 0,
            SymbolKind::Unit => 1,
            SymbolKind::Import => 2,
        });
        put_str(&mut buf, &sym.name);
    }

    buf.put_u16(count(artifact.constants.len(), "constants")?);
    for c in &artifact.constants {
        match c {
            Constant::Int(i) => {
                buf.put_u8(0);
                buf.put_i64(*i);
            }
            Constant::Str(s) => {
                buf.put_u8(1);
                put_str(&mut buf, s);
            }
        }
    }

    buf.put_u16(count(artifact.functions.len(), "functions")?);
    for f in &artifact.functions {
        put_str(&mut buf, &f.name);
        buf.put_u8(f.arity);
        buf.put_u16(f.locals);
        let ops = u32::try_from(f.code.len()).map_err(|_| ArtifactError::TooLarge("function body"))?;
        buf.put_u32(ops);
        for op in &f.code {
            put_op(&mut buf, op);
        }
    }
    Ok(buf.to_vec())
}

fn count(len: usize, what: &'static str) -> Result<u16, ArtifactError> {
    u16::try_from(len).map_err(|_| ArtifactError::TooLarge(what))
}

pub fn decode_artifact(bytes: &[u8]) -> Result<UnitArtifact, ArtifactError> {
    let mut r = Reader { buf: bytes };
    let magic = r.take(4, "magic")?;
    if magic != MAGIC {
        return Err(ArtifactError::BadMagic);
    }
    let version = r.u16("version")?;
    if version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion(version));
    }
    let unit_name = r.string("unit name")?;

    let n_symbols = r.u16("symbol count")?;
    let mut symbols = Vec::with_capacity(usize::from(n_symbols).min(1024));
    for _ in 0..n_symbols {
        let kind = match r.u8("symbol kind")? {
            0 => SymbolKind::Host,
            1 => SymbolKind::Unit,
            2 => SymbolKind::Import,
            tag => {
                return Err(ArtifactError::InvalidTag {
                    what: "symbol",
                    tag,
                })
            }
        };
        let name = r.string("symbol name")?;
        symbols.push(Symbol { kind, name });
    }

    let n_consts = r.u16("constant count")?;
    let mut constants = Vec::with_capacity(usize::from(n_consts).min(1024));
    for _ in 0..n_consts {
        let c = match r.u8("constant tag")? {
            0 => Constant::Int(r.i64("int constant")?),
            1 => Constant::Str(r.string("string constant")?),
            tag => {
                return Err(ArtifactError::InvalidTag {
                    what: "constant",
                    tag,
                })
            }
        };
        constants.push(c);
    }

    let n_funcs = r.u16("function count")?;
    let mut functions = Vec::with_capacity(usize::from(n_funcs).min(1024));
    for _ in 0..n_funcs {
        let name = r.string("function name")?;
        let arity = r.u8("arity")?;
        let locals = r.u16("locals")?;
        let n_ops = r.u32("op count")?;
        let mut code = Vec::with_capacity((n_ops as usize).min(4096));
        for _ in 0..n_ops {
            code.push(r.op()?);
        }
        functions.push(Function {
            name,
            arity,
            locals,
            code,
        });
    }

    if r.buf.has_remaining() {
        return Err(ArtifactError::TrailingBytes(r.buf.remaining()));
    }
    Ok(UnitArtifact {
        unit_name,
        symbols,
        constants,
        functions,
    })
}

/// Reads only the unit name and symbol table; used by scanners that must not
/// depend on the rest of the artifact being well formed.
pub fn decode_symbols(bytes: &[u8]) -> Result<(String, Vec<Symbol>), ArtifactError> {
    let mut r = Reader { buf: bytes };
    if r.take(4, "magic")? != MAGIC {
        return Err(ArtifactError::BadMagic);
    }
    let version = r.u16("version")?;
    if version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion(version));
    }
    let unit_name = r.string("unit name")?;
    let n = r.u16("symbol count")?;
    let mut symbols = Vec::new();
    for _ in 0..n {
        let kind = match r.u8("symbol kind")? {
            0 => SymbolKind::Host,
            1 => SymbolKind::Unit,
            _ => SymbolKind::Import,
        };
        symbols.push(Symbol {
            kind,
            name: r.string("symbol name")?,
        });
    }
    Ok((unit_name, symbols))
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_op(buf: &mut BytesMut, op: &Op) {
    match *op {
        Op::Const(i) => {
            buf.put_u8(0x01);
            buf.put_u16(i);
        }
        Op::Nil => buf.put_u8(0x02),
        Op::True => buf.put_u8(0x03),
        Op::False => buf.put_u8(0x04),
        Op::Load(i) => {
            buf.put_u8(0x05);
            buf.put_u16(i);
        }
        Op::Store(i) => {
            buf.put_u8(0x06);
            buf.put_u16(i);
        }
        Op::Pop => buf.put_u8(0x07),
        Op::Add => buf.put_u8(0x10),
        Op::Sub => buf.put_u8(0x11),
        Op::Mul => buf.put_u8(0x12),
        Op::Div => buf.put_u8(0x13),
        Op::Rem => buf.put_u8(0x14),
        Op::Eq => buf.put_u8(0x15),
        Op::Ne => buf.put_u8(0x16),
        Op::Lt => buf.put_u8(0x17),
        Op::Le => buf.put_u8(0x18),
        Op::Gt => buf.put_u8(0x19),
        Op::Ge => buf.put_u8(0x1a),
        Op::Not => buf.put_u8(0x1b),
        Op::Neg => buf.put_u8(0x1c),
        Op::Jump(t) => {
            buf.put_u8(0x20);
            buf.put_u32(t);
        }
        Op::JumpIfFalse(t) => {
            buf.put_u8(0x21);
            buf.put_u32(t);
        }
        Op::CallLocal(f, argc) => {
            buf.put_u8(0x30);
            buf.put_u16(f);
            buf.put_u8(argc);
        }
        Op::CallSymbol(s, argc) => {
            buf.put_u8(0x31);
            buf.put_u16(s);
            buf.put_u8(argc);
        }
        Op::Return => buf.put_u8(0x40),
        Op::ReturnNil => buf.put_u8(0x41),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn need(&self, n: usize, what: &'static str) -> Result<(), ArtifactError> {
        if self.buf.remaining() < n {
            return Err(ArtifactError::Truncated(what));
        }
        Ok(())
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], ArtifactError> {
        self.need(n, what)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, ArtifactError> {
        self.need(1, what)?;
        Ok(self.buf.get_u8())
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, ArtifactError> {
        self.need(2, what)?;
        Ok(self.buf.get_u16())
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, ArtifactError> {
        self.need(4, what)?;
        Ok(self.buf.get_u32())
    }

    fn i64(&mut self, what: &'static str) -> Result<i64, ArtifactError> {
        self.need(8, what)?;
        Ok(self.buf.get_i64())
    }

    fn string(&mut self, what: &'static str) -> Result<String, ArtifactError> {
        let len = self.u32(what)? as usize;
        let raw = self.take(len, what)?;
        String::from_utf8(raw.to_vec()).map_err(|_| ArtifactError::InvalidUtf8)
    }

    fn op(&mut self) -> Result<Op, ArtifactError> {
        let opcode = self.u8("opcode")?;
        Ok(match opcode {
            0x01 => Op::Const(self.u16("operand")?),
            0x02 => Op::Nil,
            0x03 => Op::True,
            0x04 => Op::False,
            0x05 => Op::Load(self.u16("operand")?),
            0x06 => Op::Store(self.u16("operand")?),
            0x07 => Op::Pop,
            0x10 => Op::Add,
            0x11 => Op::Sub,
            0x12 => Op::Mul,
            0x13 => Op::Div,
            0x14 => Op::Rem,
            0x15 => Op::Eq,
            0x16 => Op::Ne,
            0x17 => Op::Lt,
            0x18 => Op::Le,
            0x19 => Op::Gt,
            0x1a => Op::Ge,
            0x1b => Op::Not,
            0x1c => Op::Neg,
            0x20 => Op::Jump(self.u32("operand")?),
            0x21 => Op::JumpIfFalse(self.u32("operand")?),
            0x30 => Op::CallLocal(self.u16("operand")?, self.u8("operand")?),
            0x31 => Op::CallSymbol(self.u16("operand")?, self.u8("operand")?),
            0x40 => Op::Return,
            0x41 => Op::ReturnNil,
            other => return Err(ArtifactError::InvalidOpcode(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UnitArtifact {
        UnitArtifact {
            unit_name: "impl::v1::service".into(),
            symbols: vec![
                Symbol {
                    kind: SymbolKind::Host,
                    name: "std::text::concat".into(),
                },
                Symbol {
                    kind: SymbolKind::Import,
                    name: "impl::v1::helper".into(),
                },
            ],
            constants: vec![Constant::Str("OK:".into()), Constant::Int(-7)],
            functions: vec![Function {
                name: "process".into(),
                arity: 1,
                locals: 1,
                code: vec![
                    Op::Const(0),
                    Op::Load(0),
                    Op::CallSymbol(0, 2),
                    Op::JumpIfFalse(5),
                    Op::Return,
                    Op::ReturnNil,
                ],
            }],
        }
    }

    #[test]
    fn encode_decode_preserves_artifact() {
        let a = sample();
        let bytes = encode_artifact(&a).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(decode_artifact(&bytes).unwrap(), a);
    }

    #[test]
    fn symbols_only_decode() {
        let bytes = encode_artifact(&sample()).unwrap();
        let (unit, symbols) = decode_symbols(&bytes).unwrap();
        assert_eq!(unit, "impl::v1::service");
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let mut bytes = encode_artifact(&sample()).unwrap();
        bytes[0] = b'X';
        assert_eq!(decode_artifact(&bytes), Err(ArtifactError::BadMagic));

        let mut bytes = encode_artifact(&sample()).unwrap();
        bytes[5] = 9;
        assert!(matches!(
            decode_artifact(&bytes),
            Err(ArtifactError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn every_truncation_is_an_error() {
        let bytes = encode_artifact(&sample()).unwrap();
        for cut in 0..bytes.len() {
            assert!(decode_artifact(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = encode_artifact(&sample()).unwrap();
        bytes.push(0);
        assert_eq!(decode_artifact(&bytes), Err(ArtifactError::TrailingBytes(1)));
    }

    #[test]
    fn oversized_tables_are_refused() {
        let mut a = sample();
        a.constants = vec![Constant::Int(0); usize::from(u16::MAX) + 1];
        assert_eq!(encode_artifact(&a), Err(ArtifactError::TooLarge("constants")));
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(proptest::num::u8::ANY, 0..256)) {
            let _ = decode_artifact(&bytes);
            let _ = decode_symbols(&bytes);
        }

        #[test]
        fn prefixed_garbage_never_panics(tail in proptest::collection::vec(proptest::num::u8::ANY, 0..128)) {
            let mut bytes = MAGIC.to_vec();
            bytes.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
            bytes.extend_from_slice(&tail);
            let _ = decode_artifact(&bytes);
        }
    }
}
