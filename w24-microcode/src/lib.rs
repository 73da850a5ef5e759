//! # W24 Microcode Generator
//!
//! Expand a declarative microcode table into the full control-store ROM.
//!
//! Each instruction descriptor gives an opcode, a constraint per condition
//! flag and its step sequence. Every step is written to the ROM under every
//! flag state the constraints allow:
//!
//! ```text
//! address = flags(4) << 20 | opcode(8) << 4 | step(4)
//! ```
//!
//! Two descriptors that reach the same address are rejected, so conditional
//! instructions are described as pairs with disjoint flag constraints.
//!
//! ## Example
//!
//! ```rust,no_run
//! use w24_microcode::{BinaryRomWriter, Microcode, MicrocodeGenerator, RomWriter};
//!
//! let rom = MicrocodeGenerator::new(Microcode::standard()).generate().unwrap();
//! let file = std::fs::File::create("microcode.rom").unwrap();
//! BinaryRomWriter::new(std::io::BufWriter::new(file)).write_rom(&rom).unwrap();
//! ```

pub mod control;
pub mod error;
pub mod flags;
pub mod generator;
pub mod map;
pub mod rom;
pub mod table;

pub use control::{AluOp, ControlWord};
pub use error::{MicrocodeError, Result};
pub use flags::{Combinations, FlagConstraints, FlagSet, FlagState};
pub use generator::{rom_address, MicrocodeGenerator, MAX_STEPS};
pub use map::MicrocodeMap;
pub use rom::{BinaryRomWriter, RomImage, RomWriter, MAX_ROM_ADDRESS, ROM_SIZE};
pub use table::{InstructionDescriptor, Microcode};
