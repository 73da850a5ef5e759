//! # Control Word Signals
//!
//! ## Control Word (24-bit)
//!
//! ```text
//! | 23 | 22 | 21..17 | 16 | 15 | 14..12 | 11 | 10 | 9 | 6 | 5 | 4 | 3 | 2 | 1 | 0 |
//!   |    |    |        |    |    |        |    |    |   |   |   |   |   |   |   +- INSTRUCTION_LOAD
//!   |    |    |        |    |    |        |    |    |   |   |   |   |   |   +----- ENABLE_PC
//!   |    |    |        |    |    |        |    |    |   |   |   |   |   +--------- RAM_ADDRESS_LOAD
//!   |    |    |        |    |    |        |    |    |   |   |   |   +------------- RAM_READ
//!   |    |    |        |    |    |        |    |    |   |   |   +----------------- RAM_WRITE
//!   |    |    |        |    |    |        |    |    |   |   +--------------------- ENABLE_SP
//!   |    |    |        |    |    |        |    |    |   +------------------------- DECREMENT_SP
//!   |    |    |        |    |    |        |    |    +----------------------------- SET_AS_DESTINATION
//!   |    |    |        |    |    |        |    +---------------------------------- HALT
//!   |    |    |        |    |    |        +--------------------------------------- INSTRUCTION_READ
//!   |    |    |        |    |    +------------------------------------------------ ALU operation
//!   |    |    |        |    +----------------------------------------------------- ENABLE_RAM_OUTPUT
//!   |    |    |        +---------------------------------------------------------- ENABLE_SOURCE_REGISTER
//!   |    |    +------------------------------------------------------------------- register select
//!   |    +------------------------------------------------------------------------ REGISTER_LOAD
//!   +----------------------------------------------------------------------------- REGISTER_STORE
//! ```

use w24_spec::RegisterId;

/// One clock step of control lines (24 bits used)
pub type ControlWord = u32;

// ============================================================================
// Signals
// ============================================================================

pub const INSTRUCTION_LOAD: ControlWord = 1 << 0;
pub const ENABLE_PC: ControlWord = 1 << 1;
pub const RAM_ADDRESS_LOAD: ControlWord = 1 << 2;
pub const RAM_READ: ControlWord = 1 << 3;
pub const RAM_WRITE: ControlWord = 1 << 4;
pub const ENABLE_SP: ControlWord = 1 << 5;
pub const DECREMENT_SP: ControlWord = 1 << 6;
pub const SET_AS_DESTINATION: ControlWord = 1 << 9;
pub const HALT: ControlWord = 1 << 10;
/// Ends the instruction
pub const INSTRUCTION_READ: ControlWord = 1 << 11;
pub const ENABLE_RAM_OUTPUT: ControlWord = 1 << 15;
pub const ENABLE_SOURCE_REGISTER: ControlWord = 1 << 16;
pub const REGISTER_LOAD: ControlWord = 1 << 22;
pub const REGISTER_STORE: ControlWord = 1 << 23;

/// ALU operation field: bits 12-14
pub const ALU_SHIFT: u32 = 12;
pub const ALU_MASK: ControlWord = 0x7;

/// Register select field: bits 17-21
pub const REGISTER_SHIFT: u32 = 17;
pub const REGISTER_MASK: ControlWord = 0x1F;

/// ALU operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AluOp {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Shl = 4,
    And = 5,
    Or = 6,
    Xor = 7,
}

/// Register select bits for `reg`
#[inline]
pub const fn register(reg: RegisterId) -> ControlWord {
    (reg as ControlWord & REGISTER_MASK) << REGISTER_SHIFT
}

/// ALU operation bits for `op`
#[inline]
pub const fn alu(op: AluOp) -> ControlWord {
    (op as ControlWord & ALU_MASK) << ALU_SHIFT
}

// ============================================================================
// Composite Steps
// ============================================================================

pub const LOAD_PC_AS_RAM_ADDRESS: ControlWord =
    RAM_ADDRESS_LOAD | ENABLE_SOURCE_REGISTER | register(w24_spec::register::PC);

pub const READ_RAM: ControlWord = ENABLE_RAM_OUTPUT | RAM_READ;

/// Use the word at PC as the next RAM address, advancing PC past it
pub const LOAD_ADDRESS_FROM_RAM: ControlWord = READ_RAM | RAM_ADDRESS_LOAD | ENABLE_PC;

pub const STORE_ACC: ControlWord =
    REGISTER_STORE | register(w24_spec::register::ACC) | SET_AS_DESTINATION;

/// Common prefix: fetch the instruction word at PC
pub const FETCH: [ControlWord; 2] = [
    LOAD_PC_AS_RAM_ADDRESS,
    READ_RAM | ENABLE_PC | INSTRUCTION_LOAD,
];

/// Common suffix
pub const END: [ControlWord; 1] = [INSTRUCTION_READ];

/// Full step sequence for an instruction body: fetch, body, end
pub fn sequence(body: &[ControlWord]) -> Vec<ControlWord> {
    FETCH
        .iter()
        .chain(body)
        .chain(END.iter())
        .copied()
        .collect()
}
