//! Instruction descriptors and the standard microcode table

use std::collections::BTreeMap;

use w24_spec::register::{PC, SP};
use w24_spec::Opcode;

use crate::control::*;
use crate::flags::{FlagConstraints, FlagSet};

/// Microcode for one opcode under one set of flag constraints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionDescriptor {
    pub name: String,
    pub opcode: u8,
    pub flags: FlagConstraints,
    /// Complete step sequence, fetch and end included
    pub steps: Vec<ControlWord>,
}

impl InstructionDescriptor {
    /// Unconditional instruction running `body` between fetch and end
    pub fn new(name: impl Into<String>, opcode: u8, body: &[ControlWord]) -> Self {
        Self {
            name: name.into(),
            opcode,
            flags: FlagConstraints::ANY,
            steps: sequence(body),
        }
    }

    /// Restrict to the flag states allowed by `flags`
    pub fn when(self, flags: FlagConstraints) -> Self {
        Self { flags, ..self }
    }

    /// Replace the step sequence verbatim
    pub fn with_steps(self, steps: Vec<ControlWord>) -> Self {
        Self { steps, ..self }
    }
}

/// Ordered set of instruction descriptors
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Microcode {
    instructions: Vec<InstructionDescriptor>,
}

impl Microcode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: InstructionDescriptor) {
        self.instructions.push(instruction);
    }

    pub fn with(mut self, instruction: InstructionDescriptor) -> Self {
        self.push(instruction);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionDescriptor> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Descriptor name to opcode
    pub fn opcodes(&self) -> BTreeMap<&str, u8> {
        self.instructions
            .iter()
            .map(|instruction| (instruction.name.as_str(), instruction.opcode))
            .collect()
    }

    /// Microcode for the full W24 instruction set
    pub fn standard() -> Self {
        use Opcode::*;

        let jump = [
            LOAD_PC_AS_RAM_ADDRESS,
            register(PC) | SET_AS_DESTINATION | REGISTER_STORE | READ_RAM,
        ];
        let jump_register = [ENABLE_SOURCE_REGISTER | REGISTER_LOAD];
        // Not taken: step over the address word
        let skip_address = [ENABLE_PC];

        let zero_set = FlagConstraints::ANY.zero(FlagSet::Set);
        let zero_clear = FlagConstraints::ANY.zero(FlagSet::Clear);
        let carry_set = FlagConstraints::ANY.carry(FlagSet::Set);
        let carry_clear = FlagConstraints::ANY.carry(FlagSet::Clear);

        let alu_op = |name: &str, opcode: Opcode, op: AluOp| {
            InstructionDescriptor::new(name, opcode.to_u8(), &[STORE_ACC | alu(op)])
        };

        Self::new()
            .with(InstructionDescriptor::new("nop", Nop.to_u8(), &[]))
            .with(InstructionDescriptor::new("halt", Halt.to_u8(), &[HALT]))
            // Data movement
            .with(InstructionDescriptor::new(
                "mov",
                Mov.to_u8(),
                &[ENABLE_SOURCE_REGISTER | REGISTER_STORE],
            ))
            .with(InstructionDescriptor::new(
                "ldi",
                LdiImmediate.to_u8(),
                &[LOAD_PC_AS_RAM_ADDRESS, READ_RAM | REGISTER_STORE | ENABLE_PC],
            ))
            .with(InstructionDescriptor::new(
                "ldi_addr",
                LdiDirect.to_u8(),
                &[
                    LOAD_PC_AS_RAM_ADDRESS,
                    LOAD_ADDRESS_FROM_RAM,
                    READ_RAM | REGISTER_STORE,
                ],
            ))
            .with(InstructionDescriptor::new(
                "ldi_addr_reg",
                LdiIndirect.to_u8(),
                &[
                    ENABLE_SOURCE_REGISTER | RAM_ADDRESS_LOAD,
                    READ_RAM | REGISTER_STORE,
                ],
            ))
            .with(InstructionDescriptor::new(
                "str",
                StrDirect.to_u8(),
                &[
                    LOAD_PC_AS_RAM_ADDRESS,
                    LOAD_ADDRESS_FROM_RAM,
                    ENABLE_SOURCE_REGISTER | RAM_WRITE,
                ],
            ))
            .with(InstructionDescriptor::new(
                "str_addr",
                StrIndirect.to_u8(),
                &[
                    ENABLE_SOURCE_REGISTER | RAM_ADDRESS_LOAD,
                    REGISTER_LOAD | RAM_WRITE,
                ],
            ))
            // ALU
            .with(alu_op("add", Add, AluOp::Add))
            .with(alu_op("sub", Sub, AluOp::Sub))
            .with(alu_op("mul", Mul, AluOp::Mul))
            .with(alu_op("div", Div, AluOp::Div))
            .with(alu_op("shl", Shl, AluOp::Shl))
            .with(alu_op("and", And, AluOp::And))
            .with(alu_op("or", Or, AluOp::Or))
            .with(alu_op("xor", Xor, AluOp::Xor))
            // Control flow
            .with(InstructionDescriptor::new("jp", Jp.to_u8(), &jump))
            .with(InstructionDescriptor::new(
                "jp_addr",
                JpIndirect.to_u8(),
                &jump_register,
            ))
            .with(InstructionDescriptor::new("jpz", Jpz.to_u8(), &jump).when(zero_set))
            .with(
                InstructionDescriptor::new("jpz_false", Jpz.to_u8(), &skip_address)
                    .when(zero_clear),
            )
            .with(
                InstructionDescriptor::new("jpz_addr", JpzIndirect.to_u8(), &jump_register)
                    .when(zero_set),
            )
            // No address word follows the register form, so nothing to skip
            .with(
                InstructionDescriptor::new("jpz_addr_false", JpzIndirect.to_u8(), &[])
                    .when(zero_clear),
            )
            .with(InstructionDescriptor::new("jpc", Jpc.to_u8(), &jump).when(carry_set))
            .with(
                InstructionDescriptor::new("jpc_false", Jpc.to_u8(), &skip_address)
                    .when(carry_clear),
            )
            .with(
                InstructionDescriptor::new("jpc_addr", JpcIndirect.to_u8(), &jump_register)
                    .when(carry_set),
            )
            // No address word follows the register form, so nothing to skip
            .with(
                InstructionDescriptor::new("jpc_addr_false", JpcIndirect.to_u8(), &[])
                    .when(carry_clear),
            )
            .with(InstructionDescriptor::new(
                "call",
                Call.to_u8(),
                &[
                    LOAD_PC_AS_RAM_ADDRESS,
                    RAM_ADDRESS_LOAD | ENABLE_SOURCE_REGISTER | register(SP),
                    RAM_WRITE | ENABLE_SOURCE_REGISTER | register(PC) | ENABLE_SP,
                    LOAD_PC_AS_RAM_ADDRESS,
                    register(PC) | SET_AS_DESTINATION | REGISTER_STORE | READ_RAM,
                ],
            ))
            .with(InstructionDescriptor::new(
                "call_addr",
                CallIndirect.to_u8(),
                &[
                    RAM_ADDRESS_LOAD | ENABLE_SOURCE_REGISTER | register(SP),
                    RAM_WRITE | ENABLE_SOURCE_REGISTER | register(PC) | ENABLE_SP,
                    ENABLE_SOURCE_REGISTER | REGISTER_LOAD,
                ],
            ))
            .with(InstructionDescriptor::new(
                "rts",
                Rts.to_u8(),
                &[
                    DECREMENT_SP | ENABLE_SP,
                    RAM_ADDRESS_LOAD | ENABLE_SOURCE_REGISTER | register(SP),
                    READ_RAM | register(PC) | SET_AS_DESTINATION | REGISTER_STORE,
                    ENABLE_PC,
                    LOAD_PC_AS_RAM_ADDRESS,
                ],
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_every_opcode() {
        let table = Microcode::standard();
        for opcode in Opcode::ALL {
            assert!(
                table.iter().any(|d| d.opcode == opcode.to_u8()),
                "no microcode for {opcode}"
            );
        }
    }

    #[test]
    fn test_standard_sequences_framed() {
        for descriptor in Microcode::standard().iter() {
            assert_eq!(&descriptor.steps[..2], &FETCH, "{}", descriptor.name);
            assert_eq!(descriptor.steps.last(), Some(&INSTRUCTION_READ));
            assert!(descriptor.steps.len() <= 16);
        }
    }

    #[test]
    fn test_conditional_pairs() {
        let table = Microcode::standard();
        let jpz: Vec<_> = table
            .iter()
            .filter(|d| d.opcode == Opcode::Jpz.to_u8())
            .collect();
        assert_eq!(jpz.len(), 2);
        assert_eq!(jpz[0].flags.state_count() + jpz[1].flags.state_count(), 16);
    }

    #[test]
    fn test_opcodes_listing() {
        let microcode = Microcode::standard();
        let opcodes = microcode.opcodes();
        assert_eq!(opcodes["nop"], 0x00);
        assert_eq!(opcodes["ldi_addr_reg"], 0x18);
        assert_eq!(opcodes["rts"], 0x17);
        assert_eq!(opcodes["jpc_addr_false"], 0x14);
    }
}
