//! Control-store ROM image and writers

use std::io::Write;

use sha2::{Digest, Sha256};
use w24_spec::WORD_MASK;

use crate::control::ControlWord;
use crate::map::MicrocodeMap;

/// Number of ROM entries (2^24)
pub const ROM_SIZE: usize = 1 << 24;

/// Highest ROM address
pub const MAX_ROM_ADDRESS: u32 = (ROM_SIZE - 1) as u32;

/// Dense control-store contents. Unset entries hold the NOP control word (0).
#[derive(Clone, PartialEq, Eq)]
pub struct RomImage {
    words: Vec<ControlWord>,
}

impl RomImage {
    /// ROM with every entry of `map` overlaid on zeros
    pub fn from_map(map: &MicrocodeMap) -> Self {
        let mut words = vec![0; ROM_SIZE];
        for (address, word) in map.iter() {
            if let Some(slot) = words.get_mut(address as usize) {
                *slot = word & WORD_MASK;
            }
        }
        Self { words }
    }

    pub fn get(&self, address: u32) -> ControlWord {
        self.words.get(address as usize).copied().unwrap_or(0)
    }

    pub fn words(&self) -> &[ControlWord] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of non-zero entries
    pub fn populated(&self) -> usize {
        self.words.iter().filter(|&&word| word != 0).count()
    }

    /// SHA-256 over the ROM as 3-byte little-endian words, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for word in &self.words {
            hasher.update(&word.to_le_bytes()[..3]);
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

impl std::fmt::Debug for RomImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomImage")
            .field("len", &self.words.len())
            .field("populated", &self.populated())
            .finish()
    }
}

/// Sink for a finished ROM image
pub trait RomWriter {
    fn write_rom(&mut self, rom: &RomImage) -> std::io::Result<()>;
}

/// Writes each control word as 3 little-endian bytes
#[derive(Debug)]
pub struct BinaryRomWriter<W: Write> {
    out: W,
}

impl<W: Write> BinaryRomWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RomWriter for BinaryRomWriter<W> {
    fn write_rom(&mut self, rom: &RomImage) -> std::io::Result<()> {
        for word in rom.words() {
            self.out.write_all(&word.to_le_bytes()[..3])?;
        }
        self.out.flush()
    }
}
