//! # W24 Architecture Specification
//!
//! Shared definitions for the 24-bit-word W24 toolchain.
//!
//! ## Contents
//! - 24-bit words addressed over a 2^24-word space
//! - Instruction encoding tables (mnemonic -> opcode variants)
//! - Register and expansion-port name tables
//! - Instruction field packing (opcode, source and destination registers)
//! - The relocatable object format exchanged between assembler and linker

pub mod encoding;
pub mod error;
pub mod isa;
pub mod object;
pub mod register;

pub use error::{Result, SpecError};
pub use isa::{Form, InstructionDef, InstructionSet, Opcode};
pub use object::{
    namespace_for, Import, Location, ObjectBuilder, RelocatableObject, Relocation, RelocationKind,
};
pub use register::{RegisterId, RegisterTable};

/// Word size in bits
pub const WORD_BITS: u32 = 24;

/// Mask selecting the low 24 bits of a value
pub const WORD_MASK: Word = (1 << WORD_BITS) - 1;

/// Number of addressable words (2^24)
pub const ADDRESS_SPACE: u32 = 1 << WORD_BITS;

/// Highest valid address
pub const MAX_ADDRESS: Address = ADDRESS_SPACE - 1;

/// Smallest value accepted as an immediate (two's complement)
pub const MIN_SIGNED_WORD: i64 = -(1 << (WORD_BITS - 1));

/// Largest value accepted as an immediate (unsigned)
pub const MAX_UNSIGNED_WORD: i64 = (1 << WORD_BITS) - 1;

/// Machine word (24 bits stored in a u32)
pub type Word = u32;

/// Absolute address in the 2^24-word space
pub type Address = u32;

/// Truncate a signed value into a 24-bit word.
///
/// Returns `None` when the value fits neither the signed nor the unsigned
/// 24-bit range.
pub fn to_word(value: i64) -> Option<Word> {
    if (MIN_SIGNED_WORD..=MAX_UNSIGNED_WORD).contains(&value) {
        Some((value as u32) & WORD_MASK)
    } else {
        None
    }
}
