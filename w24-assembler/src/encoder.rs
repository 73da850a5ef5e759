//! Instruction encoding to 24-bit words
//!
//! One rule per mnemonic form. Instructions take one word, or two when they
//! carry a value or address; a symbolic second word is left as a zero
//! placeholder for the linker to patch.

use crate::error::{AssemblerError, Result};
use crate::parser::{Operand, Target};
use w24_spec::encoding::{dst_field, encode_word, src_field};
use w24_spec::{Form, InstructionDef, RegisterId, Word};

/// Second word of a two-word instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extension {
    /// Value known at assembly time
    Literal(Word),
    /// Address of a symbol, patched at link time
    Symbol(String),
}

/// Encoded instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub word: Word,
    pub extension: Option<Extension>,
}

impl Encoded {
    fn single(word: Word) -> Self {
        Self {
            word,
            extension: None,
        }
    }

    fn with(word: Word, extension: Extension) -> Self {
        Self {
            word,
            extension: Some(extension),
        }
    }

    /// Number of words emitted
    pub fn word_count(&self) -> usize {
        1 + usize::from(self.extension.is_some())
    }
}

/// Encode `mnemonic` with `operands` according to its table entry
pub fn encode(
    mnemonic: &str,
    def: &InstructionDef,
    operands: &[Operand],
    line: usize,
) -> Result<Encoded> {
    let cx = Context { mnemonic, line };
    cx.expect_count(operands, arity(def.form))?;

    match def.form {
        Form::Inherent => Ok(Encoded::single(def.opcode(0))),
        Form::RegisterPair => encode_register_pair(&cx, def, &operands[0], &operands[1]),
        Form::Load => encode_load(&cx, def, &operands[0], &operands[1]),
        Form::Store => encode_store(&cx, def, &operands[0], &operands[1]),
        Form::Jump => encode_jump(def, &operands[0]),
    }
}

/// Operand count of each form
const fn arity(form: Form) -> usize {
    match form {
        Form::Inherent => 0,
        Form::RegisterPair | Form::Load | Form::Store => 2,
        Form::Jump => 1,
    }
}

struct Context<'a> {
    mnemonic: &'a str,
    line: usize,
}

impl Context<'_> {
    fn expect_count(&self, operands: &[Operand], expected: usize) -> Result<()> {
        if operands.len() != expected {
            return Err(AssemblerError::OperandCount {
                line: self.line,
                mnemonic: self.mnemonic.to_string(),
                expected,
                found: operands.len(),
            });
        }
        Ok(())
    }

    fn register(&self, operand: &Operand, role: &str) -> Result<RegisterId> {
        match operand {
            Operand::Register(id) => Ok(*id),
            other => Err(self.type_error(format!(
                "{role} must be a register, found {}",
                other.kind()
            ))),
        }
    }

    fn type_error(&self, message: String) -> AssemblerError {
        AssemblerError::OperandType {
            line: self.line,
            mnemonic: self.mnemonic.to_string(),
            message,
        }
    }
}

/// MOV / ALU: `dst, src`
/// Format: | dst(5) | src(5) | opcode(8) |
fn encode_register_pair(
    cx: &Context<'_>,
    def: &InstructionDef,
    dst: &Operand,
    src: &Operand,
) -> Result<Encoded> {
    let dst = cx.register(dst, "destination")?;
    let src = cx.register(src, "source")?;
    Ok(Encoded::single(encode_word(def.opcode(0), src, dst)))
}

/// LDI `dst, src`
///
/// - `#imm` / `SYMBOL`: variant 0, value word follows
/// - `[addr]` / `[SYMBOL]`: variant 1, address word follows
/// - `[reg]` / `reg`: variant 2, source register field
fn encode_load(
    cx: &Context<'_>,
    def: &InstructionDef,
    dst: &Operand,
    src: &Operand,
) -> Result<Encoded> {
    let dst = cx.register(dst, "destination")?;
    let immediate = def.opcode(0) | dst_field(dst);
    let direct = def.opcode(1) | dst_field(dst);

    Ok(match src {
        Operand::Immediate(value) => Encoded::with(immediate, Extension::Literal(*value)),
        Operand::Symbol(name) => Encoded::with(immediate, Extension::Symbol(name.clone())),
        Operand::Direct(Target::Absolute(address)) => {
            Encoded::with(direct, Extension::Literal(*address))
        }
        Operand::Direct(Target::Symbol(name)) => {
            Encoded::with(direct, Extension::Symbol(name.clone()))
        }
        Operand::Direct(Target::Register(reg)) | Operand::Register(reg) => {
            Encoded::single(encode_word(def.opcode(2), *reg, dst))
        }
    })
}

/// STR `dst, src`
///
/// - `[addr]` / `[SYMBOL]`: variant 0, source register field, address word follows
/// - `[reg]` / `reg`: variant 1, source and destination register fields
fn encode_store(
    cx: &Context<'_>,
    def: &InstructionDef,
    dst: &Operand,
    src: &Operand,
) -> Result<Encoded> {
    let src = cx.register(src, "source")?;
    let direct = def.opcode(0) | src_field(src);

    match dst {
        Operand::Direct(Target::Absolute(address)) => {
            Ok(Encoded::with(direct, Extension::Literal(*address)))
        }
        Operand::Direct(Target::Symbol(name)) => {
            Ok(Encoded::with(direct, Extension::Symbol(name.clone())))
        }
        Operand::Direct(Target::Register(reg)) | Operand::Register(reg) => {
            Ok(Encoded::single(encode_word(def.opcode(1), src, *reg)))
        }
        Operand::Immediate(_) | Operand::Symbol(_) => Err(cx.type_error(format!(
            "destination must be a direct address or register, found {}",
            dst.kind()
        ))),
    }
}

/// JP / JPZ / JPC / CALL `target`
///
/// - `#addr` / `[addr]`: variant 0, address word follows
/// - `SYMBOL` / `[SYMBOL]`: variant 0, relocated address word follows
/// - `reg` / `[reg]`: variant 1, register in the source field
fn encode_jump(def: &InstructionDef, target: &Operand) -> Result<Encoded> {
    let absolute = def.opcode(0);

    Ok(match target {
        Operand::Immediate(address) | Operand::Direct(Target::Absolute(address)) => {
            Encoded::with(absolute, Extension::Literal(*address))
        }
        Operand::Symbol(name) | Operand::Direct(Target::Symbol(name)) => {
            Encoded::with(absolute, Extension::Symbol(name.clone()))
        }
        Operand::Register(reg) | Operand::Direct(Target::Register(reg)) => {
            Encoded::single(def.opcode(1) | src_field(*reg))
        }
    })
}
