//! Expansion of instruction descriptors into ROM addresses

use tracing::{debug, info};

use crate::error::{MicrocodeError, Result};
use crate::flags::FlagState;
use crate::map::MicrocodeMap;
use crate::rom::{RomImage, MAX_ROM_ADDRESS};
use crate::table::{InstructionDescriptor, Microcode};

/// Steps addressable per instruction (4-bit step field)
pub const MAX_STEPS: usize = 16;

pub const FLAG_SHIFT: u32 = 20;
pub const OPCODE_SHIFT: u32 = 4;

/// ROM address of `step` of `opcode` under `flags`
pub fn rom_address(flags: &FlagState, opcode: u8, step: usize) -> u64 {
    (u64::from(flags.nibble()) << FLAG_SHIFT) | (u64::from(opcode) << OPCODE_SHIFT) | step as u64
}

pub struct MicrocodeGenerator {
    table: Microcode,
}

impl MicrocodeGenerator {
    pub fn new(table: Microcode) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Microcode {
        &self.table
    }

    /// Record every (flag state, step) of every descriptor
    pub fn build_map(&self) -> Result<MicrocodeMap> {
        let mut map = MicrocodeMap::new();
        for instruction in self.table.iter() {
            expand(instruction, &mut map)?;
        }
        Ok(map)
    }

    /// Build the full control-store image
    pub fn generate(&self) -> Result<RomImage> {
        let map = self.build_map()?;
        info!(
            instructions = self.table.len(),
            words = map.len(),
            "microcode defined, filling ROM"
        );
        Ok(RomImage::from_map(&map))
    }
}

fn expand(instruction: &InstructionDescriptor, map: &mut MicrocodeMap) -> Result<()> {
    if instruction.steps.len() > MAX_STEPS {
        return Err(MicrocodeError::StepOverflow {
            name: instruction.name.clone(),
            steps: instruction.steps.len(),
            max: MAX_STEPS,
        });
    }

    for flags in instruction.flags.combinations() {
        for (step, &word) in instruction.steps.iter().enumerate() {
            let address = rom_address(&flags, instruction.opcode, step);
            if address > u64::from(MAX_ROM_ADDRESS) {
                return Err(MicrocodeError::RomAddressOverflow {
                    name: instruction.name.clone(),
                    address,
                });
            }
            map.insert(address as u32, &instruction.name, word)?;
        }
    }

    debug!(
        name = %instruction.name,
        opcode = format_args!("{:#04X}", instruction.opcode),
        states = instruction.flags.state_count(),
        steps = instruction.steps.len(),
        "expanded"
    );
    Ok(())
}
