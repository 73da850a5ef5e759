//! Main assembler logic

use std::collections::BTreeMap;

use crate::encoder::{encode, Extension};
use crate::error::{AssemblerError, Result};
use crate::parser::{parse_line, Line, Operand};
use tracing::{debug, info};
use w24_spec::{
    InstructionSet, Location, ObjectBuilder, RegisterTable, RelocatableObject, Relocation,
};

/// Assembler settings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Segment used for code and labels that precede any `.SEGMENT` line.
    /// `None` makes such lines an error.
    pub default_segment: Option<String>,
}

impl AssemblerConfig {
    pub fn with_default_segment(name: impl Into<String>) -> Self {
        Self {
            default_segment: Some(name.into().to_ascii_uppercase()),
        }
    }
}

/// Translates assembly units into relocatable objects
#[derive(Clone, Debug)]
pub struct Assembler {
    isa: InstructionSet,
    registers: RegisterTable,
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(isa: InstructionSet, registers: RegisterTable) -> Self {
        Self::with_config(isa, registers, AssemblerConfig::default())
    }

    pub fn with_config(
        isa: InstructionSet,
        registers: RegisterTable,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            isa,
            registers,
            config,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble `source` into an object named `unit_name`.
    ///
    /// Nothing is produced unless every line assembles.
    pub fn compile(&self, source: &str, unit_name: &str) -> Result<RelocatableObject> {
        let mut unit = Unit::new(unit_name, &self.config);

        for (index, text) in source.lines().enumerate() {
            let line = index + 1;
            let Some(parsed) = parse_line(text, line, &self.registers)? else {
                continue;
            };

            match parsed {
                Line::Segment(name) => unit.switch_segment(name, line),
                Line::Label(name) => unit.define_label(name, line)?,
                Line::Import(import) => {
                    debug!(file = %import.file, line, "import");
                    unit.builder.add_import(import);
                }
                Line::Instruction { mnemonic, operands } => {
                    self.emit(&mut unit, &mnemonic, &operands, line)?
                }
            }
        }

        let object = unit.builder.finish();
        info!(
            unit = unit_name,
            segments = object.segments().len(),
            words = object.word_count(),
            labels = object.labels().len(),
            relocations = object.relocations().len(),
            "assembled"
        );
        Ok(object)
    }

    fn emit(&self, unit: &mut Unit, mnemonic: &str, operands: &[Operand], line: usize) -> Result<()> {
        let def = self
            .isa
            .get(mnemonic)
            .ok_or_else(|| AssemblerError::UnknownInstruction {
                line,
                mnemonic: mnemonic.to_string(),
            })?;
        let encoded = encode(mnemonic, def, operands, line)?;
        let segment = unit.segment(line, "Instruction")?;

        unit.builder.push_word(&segment, encoded.word);
        match encoded.extension {
            Some(Extension::Literal(value)) => {
                unit.builder.push_word(&segment, value);
            }
            Some(Extension::Symbol(symbol)) => {
                let offset = unit.builder.push_word(&segment, 0);
                unit.builder
                    .add_relocation(Relocation::absolute(segment, offset, symbol));
            }
            None => {}
        }
        Ok(())
    }
}

/// State of one compilation
struct Unit<'a> {
    builder: ObjectBuilder,
    active: Option<String>,
    label_lines: BTreeMap<String, usize>,
    config: &'a AssemblerConfig,
}

impl<'a> Unit<'a> {
    fn new(unit_name: &str, config: &'a AssemblerConfig) -> Self {
        Self {
            builder: ObjectBuilder::new(unit_name),
            active: None,
            label_lines: BTreeMap::new(),
            config,
        }
    }

    fn switch_segment(&mut self, name: String, line: usize) {
        let offset = self.builder.open_segment(&name);
        debug!(segment = %name, offset, line, "segment");
        self.active = Some(name);
    }

    /// Active segment, falling back to the configured default
    fn segment(&mut self, line: usize, what: &str) -> Result<String> {
        if let Some(active) = &self.active {
            return Ok(active.clone());
        }
        match self.config.default_segment.clone() {
            Some(default) => {
                self.switch_segment(default.clone(), line);
                Ok(default)
            }
            None => Err(AssemblerError::SegmentScope {
                line,
                what: what.to_string(),
            }),
        }
    }

    fn define_label(&mut self, name: String, line: usize) -> Result<()> {
        let segment = self.segment(line, &format!("Label {name}"))?;
        if let Some(&first_line) = self.label_lines.get(&name) {
            return Err(AssemblerError::DuplicateLabel {
                line,
                label: name,
                first_line,
            });
        }

        let offset = self.builder.segment_len(&segment).unwrap_or_default();
        self.builder
            .define_label(&name, Location::new(segment, offset));
        self.label_lines.insert(name, line);
        Ok(())
    }
}

/// Assemble with the standard tables and default settings
pub fn assemble(source: &str, unit_name: &str) -> Result<RelocatableObject> {
    Assembler::new(InstructionSet::standard(), RegisterTable::standard()).compile(source, unit_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use w24_spec::Opcode;

    fn with_default(source: &str) -> Result<RelocatableObject> {
        Assembler::with_config(
            InstructionSet::standard(),
            RegisterTable::standard(),
            AssemblerConfig::with_default_segment("code"),
        )
        .compile(source, "unit.asm")
    }

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test
            .CODE
            nop
            halt
        "#;

        let object = assemble(source, "simple.asm").unwrap();
        assert_eq!(
            object.segment("CODE").unwrap(),
            &[Opcode::Nop.to_u32(), Opcode::Halt.to_u32()]
        );
        assert_eq!(object.filename(), "simple.asm");
    }

    #[test]
    fn test_default_segment() {
        let object = with_default("LDI R0, #5\nADD R0, R1\nHALT").unwrap();
        assert_eq!(object.segments().len(), 1);
        assert_eq!(object.segment("CODE").unwrap().len(), 4);
        assert!(object.relocations().is_empty());
    }

    #[test]
    fn test_no_segment_fails() {
        assert!(matches!(
            assemble("HALT", "x.asm"),
            Err(AssemblerError::SegmentScope { line: 1, .. })
        ));
        assert!(matches!(
            assemble("\nSTART:", "x.asm"),
            Err(AssemblerError::SegmentScope { line: 2, .. })
        ));
    }

    #[test]
    fn test_symbol_becomes_relocation() {
        let object = assemble(".CODE\nJP LOOP\nLOOP:\nHALT", "b.asm").unwrap();
        assert_eq!(object.relocations(), &[Relocation::absolute("CODE", 1, "LOOP")]);
        assert_eq!(object.label("LOOP"), Some(&Location::new("CODE", 2)));
        assert_eq!(object.segment("CODE").unwrap()[1], 0);
    }

    #[test]
    fn test_reopened_segment_appends() {
        let source = ".CODE\nNOP\n.DATA\nA:\nNOP\n.CODE\nB:\nHALT";
        let object = assemble(source, "x.asm").unwrap();
        assert_eq!(object.segment("CODE").unwrap().len(), 2);
        assert_eq!(object.label("A"), Some(&Location::new("DATA", 0)));
        assert_eq!(object.label("B"), Some(&Location::new("CODE", 1)));
    }

    #[test]
    fn test_duplicate_label() {
        let err = assemble(".CODE\nX:\nNOP\nX:", "x.asm").unwrap_err();
        assert!(matches!(
            err,
            AssemblerError::DuplicateLabel { line: 4, first_line: 2, .. }
        ));
    }

    #[test]
    fn test_unknown_instruction() {
        assert!(matches!(
            assemble(".CODE\nFOO R0", "x.asm"),
            Err(AssemblerError::UnknownInstruction { line: 2, .. })
        ));
    }

    #[test]
    fn test_imports_recorded() {
        let object = assemble("!IMPORT math.asm\n!IMPORT io AS con", "x.asm").unwrap();
        assert_eq!(object.imports().len(), 2);
        assert_eq!(object.imports()[1].namespace(), "CON");
        assert!(object.segments().is_empty());
    }
}
