//! # Lexer for W24 Assembly Language

use logos::Logos;
use std::fmt;

/// Tokens for one line of W24 assembly.
///
/// `!` directives are handled textually before lexing because their file
/// operands are paths, not tokens.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip comments
pub enum Token {
    /// Identifier (mnemonics, registers, labels, `NAMESPACE.LABEL` symbols)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| lex.slice().to_ascii_uppercase())]
    Identifier(String),

    /// Decimal number
    #[regex(r"-?[0-9]+", |lex| literal(lex.slice(), 10))]
    Number(i64),

    /// Hexadecimal number
    #[regex(r"-?0[xX][0-9a-fA-F]+", |lex| literal(lex.slice(), 16))]
    Hex(i64),

    /// Binary number
    #[regex(r"-?0[bB][01]+", |lex| literal(lex.slice(), 2))]
    Binary(i64),

    /// Segment directive (`.CODE`, `.DATA`, ...)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_ascii_uppercase())]
    Directive(String),

    /// Immediate marker
    #[token("#")]
    Hash,

    /// Comma
    #[token(",")]
    Comma,

    /// Colon (for labels)
    #[token(":")]
    Colon,

    /// Left bracket (direct addressing)
    #[token("[")]
    LBracket,

    /// Right bracket
    #[token("]")]
    RBracket,
}

/// Value of a numeric literal with an optional sign and `0x`/`0b` prefix.
/// Literals beyond the i64 range saturate so the parser reports them as out
/// of range rather than as malformed.
fn literal(slice: &str, radix: u32) -> i64 {
    let (sign, body) = match slice.strip_prefix('-') {
        Some(body) => ("-", body),
        None => ("", slice),
    };
    let digits = if radix == 10 { body } else { &body[2..] };
    match i64::from_str_radix(&format!("{sign}{digits}"), radix) {
        Ok(value) => value,
        Err(_) if sign.is_empty() => i64::MAX,
        Err(_) => i64::MIN,
    }
}

/// Write `value` with a radix prefix after the sign
fn write_prefixed(f: &mut fmt::Formatter<'_>, value: i64, prefix: &str, radix: u32) -> fmt::Result {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    match radix {
        16 => write!(f, "{sign}{prefix}{magnitude:x}"),
        _ => write!(f, "{sign}{prefix}{magnitude:b}"),
    }
}

impl Token {
    /// Numeric value of a number token
    pub fn number(&self) -> Option<i64> {
        match self {
            Token::Number(n) | Token::Hex(n) | Token::Binary(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{name}"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Hex(n) => write_prefixed(f, *n, "0x", 16),
            Token::Binary(n) => write_prefixed(f, *n, "0b", 2),
            Token::Directive(name) => write!(f, ".{name}"),
            Token::Hash => write!(f, "#"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
        }
    }
}

/// Lex one line. On failure returns the byte column of the offending text.
pub fn tokenize(line: &str) -> Result<Vec<Token>, usize> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token),
            Err(()) => return Err(lexer.span().start + 1),
        }
    }
    Ok(tokens)
}
