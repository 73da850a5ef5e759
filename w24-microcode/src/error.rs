//! Microcode generation errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MicrocodeError {
    #[error(
        "Microcode address conflict at {address:#08X}: {incoming} collides with {existing}"
    )]
    MicrocodeAddressConflict {
        address: u32,
        existing: String,
        incoming: String,
    },

    #[error("Instruction {name} has {steps} steps, at most {max} fit the step field")]
    StepOverflow { name: String, steps: usize, max: usize },

    #[error("Instruction {name} maps to ROM address {address:#X}, beyond the control store")]
    RomAddressOverflow { name: String, address: u64 },
}

pub type Result<T> = std::result::Result<T, MicrocodeError>;
