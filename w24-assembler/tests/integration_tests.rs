//! Integration tests for the W24 assembler
//!
//! Tests the complete assembly workflow including:
//! - Segment handling and label placement
//! - Operand forms for every mnemonic family
//! - Relocation emission for symbolic references
//! - Deterministic output

use proptest::prelude::*;
use w24_assembler::{assemble, Assembler, AssemblerConfig};
use w24_spec::encoding::{dst_field, src_field};
use w24_spec::register::{ACC, PC, REA};
use w24_spec::{InstructionSet, Location, Opcode, RegisterTable, RelocatableObject, Relocation};

fn with_default_segment(source: &str) -> RelocatableObject {
    Assembler::with_config(
        InstructionSet::standard(),
        RegisterTable::standard(),
        AssemblerConfig::with_default_segment("CODE"),
    )
    .compile(source, "unit.asm")
    .unwrap()
}

fn code(object: &RelocatableObject) -> Vec<u32> {
    object.segment("CODE").unwrap().to_vec()
}

// ============================================================================
// Basic Assembly Tests
// ============================================================================

#[test]
fn test_assemble_empty_program() {
    let object = assemble("", "empty.asm").unwrap();
    assert!(object.segments().is_empty());
    assert!(object.labels().is_empty());
}

#[test]
fn test_assemble_comments_only() {
    let source = r#"
        ; This is a comment
        ; Another comment
    "#;
    let object = assemble(source, "comments.asm").unwrap();
    assert_eq!(object.word_count(), 0);
}

#[test]
fn test_load_add_halt_in_default_segment() {
    let object = with_default_segment("LDI R0, #5\nADD R0, R1\nHALT");

    assert_eq!(
        code(&object),
        vec![
            Opcode::LdiImmediate.to_u32() | dst_field(0),
            5,
            Opcode::Add.to_u32() | dst_field(0) | src_field(1),
            Opcode::Halt.to_u32(),
        ]
    );
    assert!(object.relocations().is_empty());
}

#[test]
fn test_jump_to_label_emits_relocation() {
    let source = r#"
        .CODE
        JP LOOP
        :LOOP
        HALT
    "#;
    let object = assemble(source, "loop.asm").unwrap();

    assert_eq!(code(&object), vec![Opcode::Jp.to_u32(), 0, Opcode::Halt.to_u32()]);
    assert_eq!(object.relocations(), &[Relocation::absolute("CODE", 1, "LOOP")]);
    assert_eq!(object.label("LOOP"), Some(&Location::new("CODE", 2)));
}

// ============================================================================
// Operand Form Tests
// ============================================================================

#[test]
fn test_all_register_pair_instructions() {
    let source = r#"
        .CODE
        MOV REA, REB
        ADD ACC, REA
        SUB ACC, REA
        MUL ACC, REA
        DIV ACC, REA
        SHL ACC, REA
        AND ACC, REA
        OR  ACC, REA
        XOR ACC, REA
    "#;
    let words = code(&assemble(source, "alu.asm").unwrap());
    assert_eq!(words.len(), 9);
    assert_eq!(words[0], Opcode::Mov.to_u32() | src_field(1) | dst_field(REA));

    let alu = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Shl,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
    ];
    for (word, opcode) in words[1..].iter().zip(alu) {
        assert_eq!(*word, opcode.to_u32() | src_field(REA) | dst_field(ACC));
    }
}

#[test]
fn test_load_forms() {
    let source = r#"
        .CODE
        LDI REB, [0x1000]
        LDI REB, [REA]
        LDI REB, REA
        LDI REB, #0b101
    "#;
    let words = code(&assemble(source, "ldi.asm").unwrap());
    assert_eq!(
        words,
        vec![
            Opcode::LdiDirect.to_u32() | dst_field(1),
            0x1000,
            Opcode::LdiIndirect.to_u32() | src_field(REA) | dst_field(1),
            Opcode::LdiIndirect.to_u32() | src_field(REA) | dst_field(1),
            Opcode::LdiImmediate.to_u32() | dst_field(1),
            5,
        ]
    );
}

#[test]
fn test_store_forms() {
    let source = r#"
        .CODE
        STR [0xFF0000], ACC
        STR [REA], ACC
        STR [RESULT], ACC
    "#;
    let object = assemble(source, "str.asm").unwrap();
    assert_eq!(
        code(&object),
        vec![
            Opcode::StrDirect.to_u32() | src_field(ACC),
            0xFF0000,
            Opcode::StrIndirect.to_u32() | src_field(ACC) | dst_field(REA),
            Opcode::StrDirect.to_u32() | src_field(ACC),
            0,
        ]
    );
    assert_eq!(object.relocations(), &[Relocation::absolute("CODE", 4, "RESULT")]);
}

#[test]
fn test_jump_forms() {
    let source = r#"
        .CODE
        JP #0x40
        JPZ [0x41]
        JPC PC
        CALL MATH.SQUARE
        RTS
    "#;
    let object = assemble(source, "jumps.asm").unwrap();
    assert_eq!(
        code(&object),
        vec![
            Opcode::Jp.to_u32(),
            0x40,
            Opcode::Jpz.to_u32(),
            0x41,
            Opcode::JpcIndirect.to_u32() | src_field(PC),
            Opcode::Call.to_u32(),
            0,
            Opcode::Rts.to_u32(),
        ]
    );
    assert_eq!(
        object.relocations(),
        &[Relocation::absolute("CODE", 6, "MATH.SQUARE")]
    );
}

#[test]
fn test_load_symbol_address() {
    let object = assemble(".CODE\nLDI REA, TABLE\nLDI REB, [TABLE]", "t.asm").unwrap();
    assert_eq!(
        object.relocations(),
        &[
            Relocation::absolute("CODE", 1, "TABLE"),
            Relocation::absolute("CODE", 3, "TABLE"),
        ]
    );
    assert_eq!(code(&object)[2], Opcode::LdiDirect.to_u32() | dst_field(1));
}

#[test]
fn test_expansion_ports() {
    let words = code(&assemble(".CODE\nMOV EP0, EP15", "ports.asm").unwrap());
    assert_eq!(words, vec![Opcode::Mov.to_u32() | src_field(31) | dst_field(16)]);
}

#[test]
fn test_negative_immediate_is_twos_complement() {
    let words = code(&with_default_segment("LDI R0, #-8388608"));
    assert_eq!(words[1], 0x80_0000);
}

// ============================================================================
// Segment and Label Tests
// ============================================================================

#[test]
fn test_interleaved_segments() {
    let source = r#"
        .CODE
        START:
        LDI REA, [COUNTER]
        .DATA
        COUNTER:
        NOP
        .CODE
        JP START
    "#;
    let object = assemble(source, "inter.asm").unwrap();
    assert_eq!(object.segment("CODE").unwrap().len(), 4);
    assert_eq!(object.segment("DATA").unwrap().len(), 1);
    assert_eq!(object.label("START"), Some(&Location::new("CODE", 0)));
    assert_eq!(object.label("COUNTER"), Some(&Location::new("DATA", 0)));
    assert_eq!(
        object.relocations(),
        &[
            Relocation::absolute("CODE", 1, "COUNTER"),
            Relocation::absolute("CODE", 3, "START"),
        ]
    );
}

#[test]
fn test_label_at_segment_end() {
    let object = assemble(".CODE\nHALT\nEND:", "end.asm").unwrap();
    assert_eq!(object.label("END"), Some(&Location::new("CODE", 1)));
    object.validate().unwrap();
}

#[test]
fn test_case_insensitive() {
    let lower = assemble(".code\nloop:\nldi rea, #1\njp loop", "a.asm").unwrap();
    let upper = assemble(".CODE\nLOOP:\nLDI REA, #1\nJP LOOP", "a.asm").unwrap();
    assert_eq!(lower, upper);
}

#[test]
fn test_imports_are_not_opened() {
    let object = assemble(
        "!IMPORT does/not/exist.asm\n!IMPORT other AS O\n.CODE\nCALL O.RUN",
        "main.asm",
    )
    .unwrap();
    assert_eq!(object.imports().len(), 2);
    assert_eq!(object.imports()[0].namespace(), "EXIST");
}

// ============================================================================
// Object Interchange Tests
// ============================================================================

#[test]
fn test_object_json_round_trip() {
    let source = r#"
        !IMPORT math.asm AS M
        .CODE
        MAIN:
        CALL M.SQUARE
        STR [RESULT], ACC
        HALT
        .DATA
        RESULT:
        NOP
    "#;
    let object = assemble(source, "main.asm").unwrap();
    let json = object.to_json().unwrap();
    assert_eq!(RelocatableObject::from_json(&json).unwrap(), object);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_assembly_is_deterministic(values in prop::collection::vec(-1000i64..1000, 1..20)) {
        let source: String = std::iter::once(".CODE".to_string())
            .chain(values.iter().map(|v| format!("LDI REA, #{v}\nADD ACC, REA")))
            .collect::<Vec<_>>()
            .join("\n");

        let first = assemble(&source, "p.asm").unwrap();
        let second = assemble(&source, "p.asm").unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.word_count(), values.len() * 3);
    }

    #[test]
    fn prop_immediate_fits_word(value in -(1i64 << 23)..(1i64 << 24)) {
        let object = assemble(&format!(".CODE\nLDI R1, #{value}"), "p.asm").unwrap();
        let words = object.segment("CODE").unwrap();
        prop_assert_eq!(words[1], (value as u32) & 0xFF_FFFF);
    }
}
