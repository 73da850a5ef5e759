//! # Instruction Encoding Constants and Helpers
//!
//! ## Instruction Word (24-bit)
//!
//! ```text
//! | unused(6) | dst(5) | src(5) | opcode(8) |
//!   23..18     17..13   12..8     7..0
//! ```
//!
//! Two-word instructions (LDI/STR direct, LDI immediate, absolute jumps)
//! carry their value or address in the following word.

use crate::{RegisterId, Word, WORD_MASK};

// ============================================================================
// Bit Position Constants
// ============================================================================

/// Opcode field: bits 0-7 (8 bits)
pub const OPCODE_SHIFT: u32 = 0;

/// Source register field: bits 8-12 (5 bits)
pub const SRC_SHIFT: u32 = 8;

/// Destination register field: bits 13-17 (5 bits)
pub const DST_SHIFT: u32 = 13;

// ============================================================================
// Field Masks
// ============================================================================

/// Opcode mask (8 bits)
pub const OPCODE_MASK: u32 = 0xFF;

/// Register field mask (5 bits)
pub const REGISTER_MASK: u32 = 0x1F;

// ============================================================================
// Field Packing
// ============================================================================

/// Source register field for `reg`
#[inline]
pub const fn src_field(reg: RegisterId) -> Word {
    (reg as u32 & REGISTER_MASK) << SRC_SHIFT
}

/// Destination register field for `reg`
#[inline]
pub const fn dst_field(reg: RegisterId) -> Word {
    (reg as u32 & REGISTER_MASK) << DST_SHIFT
}

/// Pack an instruction word from its fields
#[inline]
pub const fn encode_word(opcode: u32, src: RegisterId, dst: RegisterId) -> Word {
    ((opcode & OPCODE_MASK) << OPCODE_SHIFT | src_field(src) | dst_field(dst)) & WORD_MASK
}

// ============================================================================
// Field Extraction
// ============================================================================

/// Extract the opcode (bits 0-7)
#[inline]
pub const fn extract_opcode(word: Word) -> u32 {
    (word >> OPCODE_SHIFT) & OPCODE_MASK
}

/// Extract the source register (bits 8-12)
#[inline]
pub const fn extract_src(word: Word) -> RegisterId {
    ((word >> SRC_SHIFT) & REGISTER_MASK) as RegisterId
}

/// Extract the destination register (bits 13-17)
#[inline]
pub const fn extract_dst(word: Word) -> RegisterId {
    ((word >> DST_SHIFT) & REGISTER_MASK) as RegisterId
}
