//! Assembly line and operand parser

use crate::error::{AssemblerError, Result};
use crate::lexer::{tokenize, Token};
use w24_spec::{to_word, Address, Import, RegisterId, RegisterTable, Word, MAX_ADDRESS};

/// One parsed source line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// `.NAME`
    Segment(String),
    /// `NAME:` or `:NAME`
    Label(String),
    /// `!IMPORT file [AS alias]`
    Import(Import),
    /// `MNEMONIC [operand[, operand]...]`
    Instruction {
        mnemonic: String,
        operands: Vec<Operand>,
    },
}

/// Instruction operand
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `#n`
    Immediate(Word),
    /// `[...]`
    Direct(Target),
    /// Bare register or port name
    Register(RegisterId),
    /// Bare identifier that is not a register
    Symbol(String),
}

/// What a direct (`[...]`) operand addresses
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// `[0x1000]` or `[#0x1000]`
    Absolute(Address),
    /// `[REA]`: register-indirect
    Register(RegisterId),
    /// `[COUNTER]`: address resolved at link time
    Symbol(String),
}

impl Operand {
    /// Short description used in operand type errors
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Immediate(_) => "immediate",
            Operand::Direct(Target::Absolute(_)) => "direct address",
            Operand::Direct(Target::Register(_)) => "register-indirect address",
            Operand::Direct(Target::Symbol(_)) => "symbolic address",
            Operand::Register(_) => "register",
            Operand::Symbol(_) => "symbol",
        }
    }
}

/// Parse one source line. Blank and comment-only lines yield `None`.
pub fn parse_line(text: &str, line: usize, registers: &RegisterTable) -> Result<Option<Line>> {
    let text = match text.find(';') {
        Some(comment) => &text[..comment],
        None => text,
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if text.starts_with('!') {
        return parse_bang_directive(text, line).map(Some);
    }

    let tokens = tokenize(text).map_err(|column| AssemblerError::SyntaxError {
        line,
        message: format!("unexpected character at column {column}"),
    })?;

    match tokens.as_slice() {
        [Token::Directive(name)] => Ok(Some(Line::Segment(name.clone()))),
        [Token::Directive(name), ..] => Err(AssemblerError::SyntaxError {
            line,
            message: format!("unexpected text after segment directive .{name}"),
        }),
        [Token::Identifier(name), Token::Colon] | [Token::Colon, Token::Identifier(name)] => {
            if name.contains('.') {
                return Err(AssemblerError::SyntaxError {
                    line,
                    message: format!("label {name} must not contain '.'"),
                });
            }
            Ok(Some(Line::Label(name.clone())))
        }
        [Token::Identifier(mnemonic), rest @ ..] => {
            let operands = split_operands(rest)
                .into_iter()
                .map(|group| parse_operand(group, line, registers))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Line::Instruction {
                mnemonic: mnemonic.clone(),
                operands,
            }))
        }
        _ => Err(AssemblerError::SyntaxError {
            line,
            message: format!("expected instruction, label or segment directive, found `{text}`"),
        }),
    }
}

/// `!IMPORT file [AS alias]`
fn parse_bang_directive(text: &str, line: usize) -> Result<Line> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let syntax = |message: String| AssemblerError::SyntaxError { line, message };

    if !words[0].eq_ignore_ascii_case("!IMPORT") {
        return Err(syntax(format!("unknown directive {}", words[0])));
    }

    match words.as_slice() {
        [_, file] => Ok(Line::Import(Import::new(*file, None))),
        [_, file, keyword, alias] if keyword.eq_ignore_ascii_case("AS") => {
            if !is_identifier(alias) {
                return Err(syntax(format!("invalid import alias {alias}")));
            }
            Ok(Line::Import(Import::new(
                *file,
                Some(alias.to_ascii_uppercase()),
            )))
        }
        _ => Err(syntax("expected `!IMPORT file [AS alias]`".to_string())),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split operand tokens on commas. No tokens means no operands; otherwise
/// every comma-separated group (possibly empty) is one operand.
fn split_operands(tokens: &[Token]) -> Vec<&[Token]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    tokens.split(|t| *t == Token::Comma).collect()
}

fn render(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join("")
}

/// Parse a single operand from its tokens
pub fn parse_operand(tokens: &[Token], line: usize, registers: &RegisterTable) -> Result<Operand> {
    let malformed = |message: &str| AssemblerError::OperandSyntax {
        line,
        operand: render(tokens),
        message: message.to_string(),
    };

    match tokens {
        [Token::Hash, value] => {
            let value = value
                .number()
                .ok_or_else(|| malformed("expected a number after `#`"))?;
            let word = to_word(value).ok_or(AssemblerError::ValueOutOfRange { line, value })?;
            Ok(Operand::Immediate(word))
        }
        [Token::Hash, ..] => Err(malformed("expected a number after `#`")),
        [Token::LBracket, inner @ .., Token::RBracket] => {
            parse_target(inner, line, registers).map(Operand::Direct)
        }
        [Token::LBracket, ..] => Err(malformed("unclosed `[`")),
        [Token::Identifier(name)] => Ok(match registers.lookup(name) {
            Some(id) => Operand::Register(id),
            None => Operand::Symbol(name.clone()),
        }),
        [single] if single.number().is_some() => Err(malformed(
            "numbers need `#` for an immediate or `[]` for an address",
        )),
        [] => Err(malformed("empty operand")),
        _ => Err(malformed("unrecognized operand format")),
    }
}

fn parse_target(tokens: &[Token], line: usize, registers: &RegisterTable) -> Result<Target> {
    let address = |value: i64| -> Result<Target> {
        match u32::try_from(value) {
            Ok(address) if address <= MAX_ADDRESS => Ok(Target::Absolute(address)),
            _ => Err(AssemblerError::ValueOutOfRange { line, value }),
        }
    };

    match tokens {
        [value] if value.number().is_some() => address(value.number().unwrap_or_default()),
        [Token::Hash, value] if value.number().is_some() => {
            address(value.number().unwrap_or_default())
        }
        [Token::Identifier(name)] => Ok(match registers.lookup(name) {
            Some(id) => Target::Register(id),
            None => Target::Symbol(name.clone()),
        }),
        _ => Err(AssemblerError::OperandSyntax {
            line,
            operand: format!("[{}]", render(tokens)),
            message: "expected an address, register or symbol inside `[]`".to_string(),
        }),
    }
}
