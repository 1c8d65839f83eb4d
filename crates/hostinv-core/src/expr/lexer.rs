//! Filter expression tokenizer

use std::fmt;

use crate::error::FilterError;
use crate::expr::ast::BinaryOp;

/// Token kinds produced by [`tokenize`]
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Field name
    Ident(String),
    /// Quoted string literal, escapes resolved
    Str(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// `true` / `false`
    Bool(bool),
    /// Logical or comparison operator
    Op(BinaryOp),
    /// `(`
    LParen,
    /// `)`
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "`{name}`"),
            TokenKind::Str(s) => write!(f, "string '{s}'"),
            TokenKind::Int(n) => write!(f, "number {n}"),
            TokenKind::Float(n) => write!(f, "number {n:?}"),
            TokenKind::Bool(b) => write!(f, "`{b}`"),
            TokenKind::Op(op) => write!(f, "`{}`", op.symbol()),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
        }
    }
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split `expression` into tokens, skipping whitespace
///
/// # Errors
/// Returns [`FilterError::Syntax`] at the first unrecognized character
/// sequence.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, FilterError> {
    Lexer::new(expression).collect()
}

/// Whether `name` can be written in a filter without backtick quoting
///
/// A bare field name starts with a letter or `_` and continues with
/// letters, digits, `_`, `.` or `-`. Letters include non-ASCII ones.
/// `true` and `false` are literals, never field names.
#[must_use]
pub fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start)
        && chars.all(is_ident_char)
        && !matches!(name, "true" | "false")
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> FilterError {
        FilterError::Syntax {
            expression: self.input.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Operators are one or two ASCII characters
    fn operator(&mut self, first: char) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        let second = self.peek_second();
        let (op, width) = match (first, second) {
            ('=', Some('=')) => (BinaryOp::Eq, 2),
            ('!', Some('=')) => (BinaryOp::Ne, 2),
            ('<', Some('=')) => (BinaryOp::Le, 2),
            ('>', Some('=')) => (BinaryOp::Ge, 2),
            ('<', _) => (BinaryOp::Lt, 1),
            ('>', _) => (BinaryOp::Gt, 1),
            ('&', Some('&')) => (BinaryOp::And, 2),
            ('|', Some('|')) => (BinaryOp::Or, 2),
            ('=', _) => return Err(self.error(start, "unexpected `=`, did you mean `==`?")),
            ('!', _) => return Err(self.error(start, "negation with `!` is not supported")),
            ('&', _) => return Err(self.error(start, "unexpected `&`, did you mean `&&`?")),
            ('|', _) => return Err(self.error(start, "unexpected `|`, did you mean `||`?")),
            _ => return Err(self.error(start, format!("unexpected character `{first}`"))),
        };
        self.pos += width;
        Ok(TokenKind::Op(op))
    }

    /// Read a quoted run; a backslash escapes a backslash or any quote character
    fn quoted(&mut self, quote: char, what: &str) -> Result<String, FilterError> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut value = String::new();

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(start, format!("unterminated {what}")));
            };
            self.pos += c.len_utf8();
            match c {
                '\\' => {
                    let escape_at = self.pos - 1;
                    match self.peek() {
                        Some(e @ ('\\' | '\'' | '"' | '`')) => {
                            value.push(e);
                            self.pos += 1;
                        }
                        Some(other) => {
                            return Err(
                                self.error(escape_at, format!("unknown escape `\\{other}`"))
                            );
                        }
                        None => return Err(self.error(start, format!("unterminated {what}"))),
                    }
                }
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, FilterError> {
        self.quoted(quote, "string literal").map(TokenKind::Str)
    }

    /// `` `2nd nic` `` names a field that is not a bare identifier
    fn quoted_ident(&mut self) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        let name = self.quoted('`', "quoted field name")?;
        if name.trim().is_empty() {
            return Err(self.error(start, "empty field name"));
        }
        Ok(TokenKind::Ident(name))
    }

    fn number(&mut self) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        let mut end = start;
        let mut prev = None;
        for (i, c) in self.rest().char_indices() {
            let signed_exponent = matches!(c, '+' | '-') && matches!(prev, Some('e' | 'E'));
            let leading_sign = i == 0 && matches!(c, '+' | '-');
            if !(c.is_ascii_alphanumeric() || c == '.' || signed_exponent || leading_sign) {
                break;
            }
            end = start + i + c.len_utf8();
            prev = Some(c);
        }

        let text = &self.input[start..end];
        self.pos = end;

        let digits = text.trim_start_matches(['+', '-']);
        if digits.chars().all(|c| c.is_ascii_digit()) {
            return text
                .parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| self.error(start, format!("integer literal `{text}` is out of range")));
        }
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(TokenKind::Float(n)),
            _ if digits.contains(|c: char| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => {
                Err(self.error(
                    start,
                    format!(
                        "invalid number literal `{text}`, quote field names starting with a digit in backticks"
                    ),
                ))
            }
            _ => Err(self.error(start, format!("invalid number literal `{text}`"))),
        }
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(self.rest().len());
        self.pos += len;
        match &self.input[start..self.pos] {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            name => TokenKind::Ident(name.to_string()),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let offset = self.pos;
        let c = self.peek()?;

        let kind = match c {
            '(' => {
                self.pos += 1;
                Ok(TokenKind::LParen)
            }
            ')' => {
                self.pos += 1;
                Ok(TokenKind::RParen)
            }
            '\'' | '"' => self.string(c),
            c if c.is_ascii_digit() => self.number(),
            '-' | '+'
                if self
                    .peek_second()
                    .is_some_and(|n| n.is_ascii_digit() || n == '.') =>
            {
                self.number()
            }
            '.' if self.peek_second().is_some_and(|n| n.is_ascii_digit()) => self.number(),
            '`' => self.quoted_ident(),
            c if is_ident_start(c) => Ok(self.ident()),
            c => self.operator(c),
        };

        // Stop at the first error so callers see exactly one diagnostic
        if kind.is_err() {
            self.pos = self.input.len();
        }
        Some(kind.map(|kind| Token { kind, offset }))
    }
}
