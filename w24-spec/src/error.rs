//! # Error Types for the W24 specification crate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    // Encoding table errors
    #[error("Mnemonic {mnemonic} with form {form} needs {expected} opcode(s), found {found}")]
    OpcodeCount {
        mnemonic: String,
        form: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate mnemonic in instruction set: {0}")]
    DuplicateMnemonic(String),

    #[error("Duplicate register name: {0}")]
    DuplicateRegister(String),

    #[error("Register id {id} for {name} does not fit the 5-bit register field")]
    RegisterOutOfRange { name: String, id: u8 },

    // Object format errors
    #[error("Invalid object {filename}: {reason}")]
    InvalidObject { filename: String, reason: String },

    #[error("Malformed object data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpecError::OpcodeCount {
            mnemonic: "LDI".to_string(),
            form: "load",
            expected: 3,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Mnemonic LDI with form load needs 3 opcode(s), found 1"
        );

        let err = SpecError::InvalidObject {
            filename: "main.asm".to_string(),
            reason: "label LOOP points past segment CODE".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid object main.asm: label LOOP points past segment CODE"
        );
    }
}
