//! # Relocatable Object Format
//!
//! Output of the assembler, input of the linker. One object per assembly
//! unit; objects are built through [`ObjectBuilder`] and never mutated
//! afterwards.
//!
//! JSON layout:
//! ```text
//! {
//!   "filename": "main.asm",
//!   "segments": { "CODE": [15, 0, 1] },
//!   "labels": { "LOOP": ["CODE", 2] },
//!   "relocations": [
//!     { "segment": "CODE", "offset": 1, "type": "absolute", "symbol": "LOOP" }
//!   ],
//!   "imports": [ "lib/math.asm", { "file": "io.asm", "alias": "CON" } ]
//! }
//! ```

use crate::error::{Result, SpecError};
use crate::{Word, WORD_MASK};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// How a relocated word is patched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelocationKind {
    /// The word receives the symbol's absolute address
    Absolute,
}

/// A word whose value is the address of `symbol`, filled in at link time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub segment: String,
    pub offset: u32,
    #[serde(rename = "type")]
    pub kind: RelocationKind,
    pub symbol: String,
}

impl Relocation {
    pub fn absolute(segment: impl Into<String>, offset: u32, symbol: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            offset,
            kind: RelocationKind::Absolute,
            symbol: symbol.into(),
        }
    }
}

/// Segment-relative position of a label, serialized as `[segment, offset]`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, u32)", into = "(String, u32)")]
pub struct Location {
    pub segment: String,
    pub offset: u32,
}

impl Location {
    pub fn new(segment: impl Into<String>, offset: u32) -> Self {
        Self {
            segment: segment.into(),
            offset,
        }
    }
}

impl From<(String, u32)> for Location {
    fn from((segment, offset): (String, u32)) -> Self {
        Self { segment, offset }
    }
}

impl From<Location> for (String, u32) {
    fn from(location: Location) -> Self {
        (location.segment, location.offset)
    }
}

/// `!IMPORT file [AS alias]`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ImportRepr", into = "ImportRepr")]
pub struct Import {
    pub file: String,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(file: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            file: file.into(),
            alias,
        }
    }

    /// Namespace the imported object's labels are qualified with: the alias
    /// if present, otherwise the file stem, upper-cased.
    pub fn namespace(&self) -> String {
        match &self.alias {
            Some(alias) => alias.to_ascii_uppercase(),
            None => namespace_for(&self.file),
        }
    }
}

/// Namespace derived from a file name (`lib/math.obj` -> `MATH`)
pub fn namespace_for(file: impl AsRef<Path>) -> String {
    let file = file.as_ref();
    file.file_stem()
        .or_else(|| file.file_name())
        .map(|stem| stem.to_string_lossy().to_ascii_uppercase())
        .unwrap_or_default()
}

/// Imports without alias stay plain strings in the interchange format
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ImportRepr {
    Bare(String),
    Aliased { file: String, alias: String },
}

impl From<ImportRepr> for Import {
    fn from(repr: ImportRepr) -> Self {
        match repr {
            ImportRepr::Bare(file) => Import { file, alias: None },
            ImportRepr::Aliased { file, alias } => Import {
                file,
                alias: Some(alias),
            },
        }
    }
}

impl From<Import> for ImportRepr {
    fn from(import: Import) -> Self {
        match import.alias {
            None => ImportRepr::Bare(import.file),
            Some(alias) => ImportRepr::Aliased {
                file: import.file,
                alias,
            },
        }
    }
}

/// Compiled assembly unit with unresolved symbol references
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocatableObject {
    filename: String,
    segments: BTreeMap<String, Vec<Word>>,
    labels: BTreeMap<String, Location>,
    relocations: Vec<Relocation>,
    imports: Vec<Import>,
}

impl RelocatableObject {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn segments(&self) -> &BTreeMap<String, Vec<Word>> {
        &self.segments
    }

    pub fn segment(&self, name: &str) -> Option<&[Word]> {
        self.segments.get(name).map(Vec::as_slice)
    }

    pub fn labels(&self) -> &BTreeMap<String, Location> {
        &self.labels
    }

    pub fn label(&self, name: &str) -> Option<&Location> {
        self.labels.get(name)
    }

    pub fn relocations(&self) -> &[Relocation] {
        &self.relocations
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Total number of words across all segments
    pub fn word_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }

    /// Check internal consistency: labels and relocations point into
    /// existing segments and every word fits 24 bits.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SpecError::InvalidObject {
            filename: self.filename.clone(),
            reason,
        };

        for (name, words) in &self.segments {
            if let Some(word) = words.iter().find(|w| **w & !WORD_MASK != 0) {
                return Err(invalid(format!(
                    "segment {name} holds {word:#x}, wider than 24 bits"
                )));
            }
        }

        for (label, location) in &self.labels {
            match self.segments.get(&location.segment) {
                None => {
                    return Err(invalid(format!(
                        "label {label} refers to missing segment {}",
                        location.segment
                    )))
                }
                Some(words) if location.offset as usize > words.len() => {
                    return Err(invalid(format!(
                        "label {label} at offset {} points past segment {} ({} words)",
                        location.offset,
                        location.segment,
                        words.len()
                    )))
                }
                Some(_) => {}
            }
        }

        for reloc in &self.relocations {
            match self.segments.get(&reloc.segment) {
                Some(words) if (reloc.offset as usize) < words.len() => {}
                _ => {
                    return Err(invalid(format!(
                        "relocation for {} at {}+{} is outside its segment",
                        reloc.symbol, reloc.segment, reloc.offset
                    )))
                }
            }
        }

        Ok(())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let object: Self = serde_json::from_str(json)?;
        object.validate()?;
        Ok(object)
    }

    /// Write the object as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read and validate an object file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Incremental constructor for [`RelocatableObject`]
#[derive(Clone, Debug)]
pub struct ObjectBuilder {
    object: RelocatableObject,
}

impl ObjectBuilder {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            object: RelocatableObject {
                filename: filename.into(),
                segments: BTreeMap::new(),
                labels: BTreeMap::new(),
                relocations: Vec::new(),
                imports: Vec::new(),
            },
        }
    }

    /// Create `name` if needed and return its current length, which is the
    /// write offset for a reopened segment.
    pub fn open_segment(&mut self, name: &str) -> u32 {
        self.object
            .segments
            .entry(name.to_string())
            .or_default()
            .len() as u32
    }

    /// Current length of a segment, if it exists
    pub fn segment_len(&self, name: &str) -> Option<u32> {
        self.object.segments.get(name).map(|words| words.len() as u32)
    }

    /// Append a word to `segment` and return its offset
    pub fn push_word(&mut self, segment: &str, word: Word) -> u32 {
        let words = self.object.segments.entry(segment.to_string()).or_default();
        words.push(word & WORD_MASK);
        (words.len() - 1) as u32
    }

    /// Record a label. An existing definition is kept and returned.
    pub fn define_label(&mut self, name: &str, location: Location) -> Option<&Location> {
        use std::collections::btree_map::Entry;

        match self.object.labels.entry(name.to_string()) {
            Entry::Occupied(existing) => Some(existing.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(location);
                None
            }
        }
    }

    pub fn add_relocation(&mut self, relocation: Relocation) {
        self.object.relocations.push(relocation);
    }

    pub fn add_import(&mut self, import: Import) {
        self.object.imports.push(import);
    }

    pub fn finish(self) -> RelocatableObject {
        self.object
    }
}
