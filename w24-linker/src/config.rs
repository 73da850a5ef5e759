//! Memory configuration
//!
//! Declares where each segment lives in the address space:
//!
//! ```text
//! ; name    start            size
//! .PROG : Start = 0x000000, Size = 0x1000
//! .DATA : Start = 0x001000, Size = 0x0800
//! ```
//!
//! Keywords are case-insensitive, numbers are decimal or `0x` hex. Segments
//! must fit the address space and must not overlap.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use w24_spec::{Address, ADDRESS_SPACE};

/// Placement of one segment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub start: Address,
    pub size: u32,
}

impl Segment {
    /// One past the last address (may equal the address space size)
    pub fn end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.size)
    }

    fn overlaps(&self, other: &Segment) -> bool {
        self.size > 0
            && other.size > 0
            && u64::from(self.start) < other.end()
            && u64::from(other.start) < self.end()
    }
}

/// Segment name to placement map
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    segments: BTreeMap<String, Segment>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split(';').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let (name, start, size) = parse_segment_line(content, line)?;
            config.insert(&name, start, size)?;
        }
        Ok(config)
    }

    /// Add a segment. Names are upper-cased.
    pub fn insert(&mut self, name: &str, start: u64, size: u64) -> Result<(), ConfigError> {
        let name = name.to_ascii_uppercase();
        if self.segments.contains_key(&name) {
            return Err(ConfigError::DuplicateSegment { segment: name });
        }
        if start.saturating_add(size) > u64::from(ADDRESS_SPACE) {
            return Err(ConfigError::SegmentOutOfRange {
                segment: name,
                start,
                size,
            });
        }

        // In range, so both fit in u32
        let segment = Segment {
            start: start as Address,
            size: size as u32,
        };
        if let Some((other, _)) = self
            .segments
            .iter()
            .find(|(_, existing)| existing.overlaps(&segment))
        {
            return Err(ConfigError::SegmentOverlap {
                segment: name,
                other: other.clone(),
            });
        }

        self.segments.insert(name, segment);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_segment(mut self, name: &str, start: u64, size: u64) -> Result<Self, ConfigError> {
        self.insert(name, start, size)?;
        Ok(self)
    }

    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    pub fn base(&self, name: &str) -> Option<Address> {
        self.segment(name).map(|segment| segment.start)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Segment)> {
        self.segments.iter().map(|(name, segment)| (name.as_str(), segment))
    }
}

/// `.NAME : Start = n, Size = n`
fn parse_segment_line(content: &str, line: usize) -> Result<(String, u64, u64), ConfigError> {
    let invalid = || ConfigError::InvalidLine {
        line,
        text: content.to_string(),
    };

    let rest = content.strip_prefix('.').ok_or_else(invalid)?;
    let (name, fields) = rest.split_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid());
    }

    let (start, size) = fields.split_once(',').ok_or_else(invalid)?;
    let start = keyed_value(start, "START").ok_or_else(invalid)?;
    let size = keyed_value(size, "SIZE").ok_or_else(invalid)?;

    Ok((
        name.to_string(),
        parse_number(start, line)?,
        parse_number(size, line)?,
    ))
}

/// Value of `key = value`, with `key` matched case-insensitively
fn keyed_value<'a>(field: &'a str, key: &str) -> Option<&'a str> {
    let (found, value) = field.split_once('=')?;
    found
        .trim()
        .eq_ignore_ascii_case(key)
        .then(|| value.trim())
}

fn parse_number(text: &str, line: usize) -> Result<u64, ConfigError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidNumber {
        line,
        text: text.to_string(),
    })
}
