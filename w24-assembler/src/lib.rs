//! W24 Assembler
//!
//! Assemble W24 assembly language into relocatable objects.
//!
//! ## Example
//!
//! ```rust
//! use w24_assembler::assemble;
//!
//! let source = r#"
//!     .CODE
//!     JP LOOP
//! LOOP:
//!     HALT
//! "#;
//!
//! let object = assemble(source, "loop.asm").unwrap();
//! assert_eq!(object.relocations().len(), 1);
//! ```

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use assembler::{assemble, Assembler, AssemblerConfig};
pub use encoder::{encode, Encoded, Extension};
pub use error::{AssemblerError, Result};
pub use parser::{parse_line, parse_operand, Line, Operand, Target};
