//! Recursive-descent parser for unit scripts.

use crate::ast::{BinOp, Expr, FnDecl, Stmt, UnaryOp, UnitAst, UseDecl};
use crate::error::CompilerError;
use crate::lexer::{tokenize, Span, Token, TokenKind};

/// Nesting limit for blocks and expressions.
const MAX_NESTING: usize = 128;

/// Parses one unit's source text.
pub fn parse_unit(unit: &str, src: &str) -> Result<UnitAst, CompilerError> {
    let tokens = tokenize(src).map_err(|e| CompilerError::Syntax {
        unit: unit.to_string(),
        line: e.span.line,
        col: e.span.col,
        message: e.message,
    })?;
    Parser {
        unit,
        tokens,
        pos: 0,
        depth: 0,
    }
    .parse()
}

struct Parser<'a> {
    unit: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

type PResult<T> = Result<T, CompilerError>;

impl<'a> Parser<'a> {
    fn parse(mut self) -> PResult<UnitAst> {
        let mut uses = Vec::new();
        let mut functions = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Use => uses.push(self.use_decl()?),
                TokenKind::Fn => functions.push(self.fn_decl()?),
                other => {
                    let msg = format!("expected `use` or `fn`, found {other}");
                    return Err(self.error(&msg));
                }
            }
        }
        Ok(UnitAst { uses, functions })
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx].kind
    }

    fn current(&self) -> &Token {
        // tokenize always ends with Eof, so the last index is valid
        let idx = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.current().kind.clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> PResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            let msg = format!("expected {kind}, found {}", self.peek());
            Err(self.error(&msg))
        }
    }

    fn ident(&mut self) -> PResult<String> {
        match self.advance() {
            TokenKind::Ident(name) => Ok(name),
            other => {
                self.pos = self.pos.saturating_sub(1);
                let msg = format!("expected identifier, found {other}");
                Err(self.error(&msg))
            }
        }
    }

    fn error(&self, message: &str) -> CompilerError {
        let span = self.span();
        CompilerError::Syntax {
            unit: self.unit.to_string(),
            line: span.line,
            col: span.col,
            message: message.to_string(),
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn path(&mut self) -> PResult<Vec<String>> {
        let mut segments = vec![self.ident()?];
        while self.eat(&TokenKind::ColonColon) {
            segments.push(self.ident()?);
        }
        Ok(segments)
    }

    fn use_decl(&mut self) -> PResult<UseDecl> {
        let span = self.span();
        self.expect(&TokenKind::Use)?;
        let path = self.path()?;
        let alias = if self.eat(&TokenKind::As) {
            self.ident()?
        } else {
            path.last().cloned().unwrap_or_default()
        };
        self.expect(&TokenKind::Semi)?;
        Ok(UseDecl { path, alias, span })
    }

    fn fn_decl(&mut self) -> PResult<FnDecl> {
        let span = self.span();
        self.expect(&TokenKind::Fn)?;
        let name = self.ident()?;
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        Ok(FnDecl {
            name,
            params,
            body,
            span,
        })
    }

    fn block(&mut self) -> PResult<Vec<Stmt>> {
        self.enter()?;
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error("unclosed block"));
            }
            stmts.push(self.stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        self.leave();
        Ok(stmts)
    }

    fn stmt(&mut self) -> PResult<Stmt> {
        let span = self.span();
        match self.peek().clone() {
            TokenKind::Let => {
                self.advance();
                let name = self.ident()?;
                self.expect(&TokenKind::Assign)?;
                let value = self.expr()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Stmt::Let { name, value, span })
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::While => {
                self.advance();
                let cond = self.expr()?;
                let body = self.block()?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::Return => {
                self.advance();
                if self.eat(&TokenKind::Semi) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.expr()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Stmt::Return(Some(value)))
            }
            TokenKind::Ident(name) if self.peek_at(1) == &TokenKind::Assign => {
                self.advance();
                self.advance();
                let value = self.expr()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Stmt::Assign { name, value, span })
            }
            _ => {
                let expr = self.expr()?;
                self.expect(&TokenKind::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn if_stmt(&mut self) -> PResult<Stmt> {
        self.expect(&TokenKind::If)?;
        let cond = self.expr()?;
        let then_block = self.block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                self.enter()?;
                let nested = self.if_stmt()?;
                self.leave();
                Some(vec![nested])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn expr(&mut self) -> PResult<Expr> {
        self.enter()?;
        let e = self.or_expr();
        self.leave();
        e
    }

    fn binary_level(
        &mut self,
        ops: &[(TokenKind, BinOp)],
        next: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (tok, op) in ops {
                if self.check(tok) {
                    self.advance();
                    let rhs = next(self)?;
                    lhs = Expr::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    };
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn or_expr(&mut self) -> PResult<Expr> {
        self.binary_level(&[(TokenKind::OrOr, BinOp::Or)], Self::and_expr)
    }

    fn and_expr(&mut self) -> PResult<Expr> {
        self.binary_level(&[(TokenKind::AndAnd, BinOp::And)], Self::eq_expr)
    }

    fn eq_expr(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[(TokenKind::EqEq, BinOp::Eq), (TokenKind::NotEq, BinOp::Ne)],
            Self::cmp_expr,
        )
    }

    fn cmp_expr(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Lt, BinOp::Lt),
                (TokenKind::Le, BinOp::Le),
                (TokenKind::Gt, BinOp::Gt),
                (TokenKind::Ge, BinOp::Ge),
            ],
            Self::add_expr,
        )
    }

    fn add_expr(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[(TokenKind::Plus, BinOp::Add), (TokenKind::Minus, BinOp::Sub)],
            Self::mul_expr,
        )
    }

    fn mul_expr(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Star, BinOp::Mul),
                (TokenKind::Slash, BinOp::Div),
                (TokenKind::Percent, BinOp::Rem),
            ],
            Self::unary_expr,
        )
    }

    fn unary_expr(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary_expr()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> PResult<Expr> {
        let span = self.span();
        match self.peek().clone() {
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Int(i) => {
                self.advance();
                Ok(Expr::Int(i))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::LParen => {
                self.advance();
                let e = self.expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::Ident(_) => {
                let path = self.path()?;
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                    return Ok(Expr::Call { path, args, span });
                }
                match <[String; 1]>::try_from(path) {
                    Ok([name]) => Ok(Expr::Var { name, span }),
                    Err(_) => Err(CompilerError::Syntax {
                        unit: self.unit.to_string(),
                        line: span.line,
                        col: span.col,
                        message: "a path must be called".into(),
                    }),
                }
            }
            other => {
                let msg = format!("expected expression, found {other}");
                Err(self.error(&msg))
            }
        }
    }
}
