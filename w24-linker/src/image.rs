//! Sparse memory image

use std::collections::BTreeMap;
use std::io::Write;

use sha2::{Digest, Sha256};
use w24_spec::{Address, Word, ADDRESS_SPACE, WORD_MASK};

/// Header line of the raw image format
pub const IMAGE_HEADER: &str = "v2.0 raw";

/// Words per output line
pub const WORDS_PER_LINE: u32 = 4;

/// Linked memory. Addresses without an entry hold zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryImage {
    words: BTreeMap<Address, Word>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: Address) -> Word {
        self.words.get(&address).copied().unwrap_or(0)
    }

    /// Store `word` (masked to 24 bits). Zero clears the entry.
    pub fn set(&mut self, address: Address, word: Word) {
        let word = word & WORD_MASK;
        if word == 0 {
            self.words.remove(&address);
        } else {
            self.words.insert(address, word);
        }
    }

    /// Number of non-zero words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Non-zero words in address order
    pub fn iter(&self) -> impl Iterator<Item = (Address, Word)> + '_ {
        self.words.iter().map(|(&address, &word)| (address, word))
    }

    /// Write the full address space: the header line, then four words per
    /// line as 6-digit upper-case hex.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{IMAGE_HEADER}")?;

        let mut entries = self.words.iter().peekable();
        for base in (0..ADDRESS_SPACE).step_by(WORDS_PER_LINE as usize) {
            let mut row = [0 as Word; WORDS_PER_LINE as usize];
            while let Some((&address, &word)) =
                entries.next_if(|&(&address, _)| address < base + WORDS_PER_LINE)
            {
                row[(address - base) as usize] = word;
            }
            writeln!(
                out,
                "{:06X} {:06X} {:06X} {:06X}",
                row[0], row[1], row[2], row[3]
            )?;
        }
        out.flush()
    }

    /// SHA-256 over the non-zero entries, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(IMAGE_HEADER.as_bytes());
        for (&address, &word) in &self.words {
            hasher.update(&address.to_le_bytes()[..3]);
            hasher.update(&word.to_le_bytes()[..3]);
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}
