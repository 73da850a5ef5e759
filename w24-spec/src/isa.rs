//! # W24 Instruction Set Tables
//!
//! Opcode space shared by the assembler and the microcode generator, and the
//! mnemonic table the assembler encodes against.
//!
//! ## Opcode Map
//!
//! - 0x00-0x01: Control (NOP, HALT)
//! - 0x02-0x06: Data movement (MOV, LDI, LDI [addr], STR [addr], STR [reg])
//! - 0x07-0x0E: ALU (ADD, SUB, MUL, DIV, SHL, AND, OR, XOR)
//! - 0x0F-0x16: Control flow, absolute and register forms (JP, JPZ, JPC, CALL)
//! - 0x17: RTS
//! - 0x18: LDI [reg]

use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Instruction opcode (low 8 bits of an instruction word)
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Opcode {
    // ========== Control ==========
    /// NOP: do nothing
    Nop = 0x00,
    /// HALT: stop the clock
    Halt = 0x01,

    // ========== Data Movement ==========
    /// MOV: dst = src
    Mov = 0x02,
    /// LDI dst, #imm: dst = next word
    LdiImmediate = 0x03,
    /// LDI dst, [addr]: dst = mem[next word]
    LdiDirect = 0x04,
    /// STR [addr], src: mem[next word] = src
    StrDirect = 0x05,
    /// STR [dst], src: mem[dst] = src
    StrIndirect = 0x06,

    // ========== ALU ==========
    /// ADD: ACC = REA + REB
    Add = 0x07,
    /// SUB: ACC = REA - REB
    Sub = 0x08,
    /// MUL: ACC = REA * REB
    Mul = 0x09,
    /// DIV: ACC = REA / REB
    Div = 0x0A,
    /// SHL: ACC = REA << REB
    Shl = 0x0B,
    /// AND: ACC = REA & REB
    And = 0x0C,
    /// OR: ACC = REA | REB
    Or = 0x0D,
    /// XOR: ACC = REA ^ REB
    Xor = 0x0E,

    // ========== Control Flow ==========
    /// JP addr: PC = next word
    Jp = 0x0F,
    /// JP reg: PC = reg
    JpIndirect = 0x10,
    /// JPZ addr: jump if zero flag set
    Jpz = 0x11,
    /// JPZ reg
    JpzIndirect = 0x12,
    /// JPC addr: jump if carry flag set
    Jpc = 0x13,
    /// JPC reg
    JpcIndirect = 0x14,
    /// CALL addr: push PC, PC = next word
    Call = 0x15,
    /// CALL reg: push PC, PC = reg
    CallIndirect = 0x16,
    /// RTS: pop PC
    Rts = 0x17,

    /// LDI dst, [reg]: dst = mem[reg]
    LdiIndirect = 0x18,
}

impl Opcode {
    /// Opcode width in bits inside an instruction word
    pub const BITS: usize = 8;

    /// Opcode mask (0xFF for 8 bits)
    pub const MASK: u32 = 0xFF;

    pub const ALL: [Opcode; 25] = [
        Opcode::Nop,
        Opcode::Halt,
        Opcode::Mov,
        Opcode::LdiImmediate,
        Opcode::LdiDirect,
        Opcode::StrDirect,
        Opcode::StrIndirect,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Shl,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Jp,
        Opcode::JpIndirect,
        Opcode::Jpz,
        Opcode::JpzIndirect,
        Opcode::Jpc,
        Opcode::JpcIndirect,
        Opcode::Call,
        Opcode::CallIndirect,
        Opcode::Rts,
        Opcode::LdiIndirect,
    ];

    /// Try to convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.to_u8() == value)
    }

    /// Convert to u8
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert to the u32 used when packing words
    #[inline]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Extract opcode from an instruction word
    #[inline]
    pub fn from_instruction(instruction: u32) -> Option<Self> {
        Self::from_u8((instruction & Self::MASK) as u8)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:#04x})", self, self.to_u8())
    }
}

/// Encoding family of a mnemonic.
///
/// The form decides how many opcode variants a mnemonic carries and which
/// operand shapes the assembler accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    /// No operands (NOP, HALT, RTS)
    Inherent,
    /// `dst, src` registers (MOV and ALU operations)
    RegisterPair,
    /// LDI: immediate, direct and register-indirect variants
    Load,
    /// STR: direct and register-indirect variants
    Store,
    /// JP/JPZ/JPC/CALL: absolute and register variants
    Jump,
}

impl Form {
    /// Number of opcode variants this form needs
    pub const fn variants(self) -> usize {
        match self {
            Form::Inherent | Form::RegisterPair => 1,
            Form::Load => 3,
            Form::Store | Form::Jump => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Form::Inherent => "inherent",
            Form::RegisterPair => "register pair",
            Form::Load => "load",
            Form::Store => "store",
            Form::Jump => "jump",
        }
    }
}

/// One mnemonic in the instruction set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionDef {
    pub form: Form,
    /// Opcode variants in form order (see [`Form`])
    pub opcodes: Vec<u8>,
}

impl InstructionDef {
    /// Opcode variant `index`. Tables are validated on insert, so every form
    /// index is present.
    pub fn opcode(&self, index: usize) -> u32 {
        u32::from(self.opcodes[index])
    }
}

/// Mnemonic -> opcode table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstructionSet {
    entries: BTreeMap<String, InstructionDef>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The W24 instruction set
    pub fn standard() -> Self {
        use Opcode::*;

        let table: [(&str, Form, &[Opcode]); 18] = [
            ("NOP", Form::Inherent, &[Nop]),
            ("HALT", Form::Inherent, &[Halt]),
            ("RTS", Form::Inherent, &[Rts]),
            ("MOV", Form::RegisterPair, &[Mov]),
            ("LDI", Form::Load, &[LdiImmediate, LdiDirect, LdiIndirect]),
            ("STR", Form::Store, &[StrDirect, StrIndirect]),
            ("ADD", Form::RegisterPair, &[Add]),
            ("SUB", Form::RegisterPair, &[Sub]),
            ("MUL", Form::RegisterPair, &[Mul]),
            ("DIV", Form::RegisterPair, &[Div]),
            ("SHL", Form::RegisterPair, &[Shl]),
            ("AND", Form::RegisterPair, &[And]),
            ("OR", Form::RegisterPair, &[Or]),
            ("XOR", Form::RegisterPair, &[Xor]),
            ("JP", Form::Jump, &[Jp, JpIndirect]),
            ("JPZ", Form::Jump, &[Jpz, JpzIndirect]),
            ("JPC", Form::Jump, &[Jpc, JpcIndirect]),
            ("CALL", Form::Jump, &[Call, CallIndirect]),
        ];

        let entries = table
            .iter()
            .map(|(mnemonic, form, opcodes)| {
                let def = InstructionDef {
                    form: *form,
                    opcodes: opcodes.iter().map(|op| op.to_u8()).collect(),
                };
                (mnemonic.to_string(), def)
            })
            .collect();

        Self { entries }
    }

    /// Add a mnemonic, checking the variant count against its form
    pub fn insert(&mut self, mnemonic: &str, form: Form, opcodes: &[u8]) -> Result<()> {
        let mnemonic = mnemonic.to_ascii_uppercase();
        if opcodes.len() != form.variants() {
            return Err(SpecError::OpcodeCount {
                mnemonic,
                form: form.name(),
                expected: form.variants(),
                found: opcodes.len(),
            });
        }
        if self.entries.contains_key(&mnemonic) {
            return Err(SpecError::DuplicateMnemonic(mnemonic));
        }
        self.entries.insert(
            mnemonic,
            InstructionDef {
                form,
                opcodes: opcodes.to_vec(),
            },
        );
        Ok(())
    }

    /// Look up a mnemonic (case-insensitive)
    pub fn get(&self, mnemonic: &str) -> Option<&InstructionDef> {
        self.entries.get(&mnemonic.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstructionDef)> {
        self.entries.iter().map(|(m, def)| (m.as_str(), def))
    }
}
