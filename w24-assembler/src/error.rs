//! Assembler errors
//!
//! Every variant carries the 1-based source line it was raised on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("Unknown instruction at line {line}: {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("{what} outside any segment at line {line}")]
    SegmentScope { line: usize, what: String },

    #[error("Duplicate label {label} at line {line} (first defined at line {first_line})")]
    DuplicateLabel {
        line: usize,
        label: String,
        first_line: usize,
    },

    #[error("Malformed operand `{operand}` at line {line}: {message}")]
    OperandSyntax {
        line: usize,
        operand: String,
        message: String,
    },

    #[error("Invalid operand for {mnemonic} at line {line}: {message}")]
    OperandType {
        line: usize,
        mnemonic: String,
        message: String,
    },

    #[error("{mnemonic} at line {line} expects {expected} operand(s), found {found}")]
    OperandCount {
        line: usize,
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("Value {value} at line {line} does not fit in a 24-bit word")]
    ValueOutOfRange { line: usize, value: i64 },
}

impl AssemblerError {
    /// Source line the error was raised on
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UnknownInstruction { line, .. }
            | AssemblerError::SegmentScope { line, .. }
            | AssemblerError::DuplicateLabel { line, .. }
            | AssemblerError::OperandSyntax { line, .. }
            | AssemblerError::OperandType { line, .. }
            | AssemblerError::OperandCount { line, .. }
            | AssemblerError::ValueOutOfRange { line, .. } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssemblerError::OperandCount {
            line: 3,
            mnemonic: "HALT".to_string(),
            expected: 0,
            found: 1,
        };
        assert_eq!(err.to_string(), "HALT at line 3 expects 0 operand(s), found 1");

        let err = AssemblerError::DuplicateLabel {
            line: 9,
            label: "LOOP".to_string(),
            first_line: 2,
        };
        assert_eq!(
            err.to_string(),
            "Duplicate label LOOP at line 9 (first defined at line 2)"
        );
    }

    #[test]
    fn test_line_accessor() {
        let err = AssemblerError::SegmentScope {
            line: 1,
            what: "Instruction".to_string(),
        };
        assert_eq!(err.line(), 1);
    }
}
