//! Tokenizer for unit scripts.

use std::fmt;

/// Source position, 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    // keywords
    Fn,
    Let,
    If,
    Else,
    While,
    Return,
    Use,
    As,
    True,
    False,
    Nil,
    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    ColonColon,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Ident(name) => return write!(f, "identifier `{name}`"),
            TokenKind::Str(_) => "string literal",
            TokenKind::Int(_) => "integer literal",
            TokenKind::Fn => "`fn`",
            TokenKind::Let => "`let`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::Return => "`return`",
            TokenKind::Use => "`use`",
            TokenKind::As => "`as`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Nil => "`nil`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semi => "`;`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Assign => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Bang => "`!`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A lexing failure at a position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }
}

/// Splits `src` into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();

    loop {
        while let Some(c) = cur.peek() {
            if c.is_whitespace() {
                cur.bump();
            } else {
                break;
            }
        }
        let span = cur.span();
        let Some(c) = cur.bump() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span,
            });
            return Ok(tokens);
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '%' => TokenKind::Percent,
            '/' => {
                if cur.eat('/') {
                    while let Some(c) = cur.peek() {
                        if c == '\n' {
                            break;
                        }
                        cur.bump();
                    }
                    continue;
                }
                TokenKind::Slash
            }
            ':' => {
                if cur.eat(':') {
                    TokenKind::ColonColon
                } else {
                    return Err(err(span, "expected `::`"));
                }
            }
            '=' => {
                if cur.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if cur.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if cur.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if cur.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if cur.eat('&') {
                    TokenKind::AndAnd
                } else {
                    return Err(err(span, "expected `&&`"));
                }
            }
            '|' => {
                if cur.eat('|') {
                    TokenKind::OrOr
                } else {
                    return Err(err(span, "expected `||`"));
                }
            }
            '"' => TokenKind::Str(lex_string(&mut cur, span)?),
            c if c.is_ascii_digit() => {
                let mut digits = String::from(c);
                while let Some(d) = cur.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        cur.bump();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse::<i64>()
                    .map_err(|_| err(span, "integer literal out of range"))?;
                TokenKind::Int(value)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(d) = cur.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        word.push(d);
                        cur.bump();
                    } else {
                        break;
                    }
                }
                keyword(&word).unwrap_or(TokenKind::Ident(word))
            }
            other => return Err(err(span, &format!("unexpected character {other:?}"))),
        };
        tokens.push(Token { kind, span });
    }
}

fn lex_string(cur: &mut Cursor<'_>, start: Span) -> Result<String, LexError> {
    let mut out = String::new();
    loop {
        match cur.bump() {
            None => return Err(err(start, "unterminated string literal")),
            Some('"') => return Ok(out),
            Some('\\') => {
                let escaped = match cur.bump() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some(other) => {
                        return Err(err(cur.span(), &format!("unknown escape \\{other}")))
                    }
                    None => return Err(err(start, "unterminated string literal")),
                };
                out.push(escaped);
            }
            Some(c) => out.push(c),
        }
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "fn" => TokenKind::Fn,
        "let" => TokenKind::Let,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "use" => TokenKind::Use,
        "as" => TokenKind::As,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "nil" => TokenKind::Nil,
        _ => return None,
    })
}

fn err(span: Span, message: &str) -> LexError {
    LexError {
        span,
        message: message.to_string(),
    }
}
