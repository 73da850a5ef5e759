//! End-to-end tests for the W24 toolchain
//!
//! These tests verify the complete workflow:
//! 1. Assemble source units into relocatable objects
//! 2. Link the objects against a memory configuration
//! 3. Inspect the resulting memory image and its text form

use std::fs;
use std::path::PathBuf;

use w24_assembler::{assemble, Assembler, AssemblerConfig};
use w24_linker::{
    LinkError, LinkOptions, Linker, MemoryConfig, MemoryImage, MemoryObjectStore, IMAGE_HEADER,
};
use w24_spec::encoding::{dst_field, encode_word};
use w24_spec::register::{ACC, REA, REB};
use w24_spec::{InstructionSet, Opcode, RegisterTable, RelocatableObject};

const CONFIG: &str = r#"
    ; main program and libraries
    .CODE  : Start = 0x000000, Size = 0x1000
    .MATH  : Start = 0x001000, Size = 0x0100
    .IO    : Start = 0x001100, Size = 0x0100
    .DATA  : Start = 0x800000, Size = 0x1000
"#;

const MAIN: &str = r#"
    !IMPORT lib/math.asm
    !IMPORT io.asm AS CON

    .CODE
    START:
        LDI REA, [COUNT]
        LDI REB, #1
        CALL MATH.INCREMENT
        STR [COUNT], ACC
        CALL CON.PUT
        HALT

    .DATA
    COUNT:
        NOP
"#;

const MATH: &str = r#"
    .MATH
    INCREMENT:
        MOV ACC, REA
        ADD ACC, REB
        RTS
"#;

const IO: &str = r#"
    .IO
    PUT:
        MOV EP0, ACC
        RTS
"#;

fn program() -> MemoryObjectStore {
    MemoryObjectStore::new()
        .with("main.obj", assemble(MAIN, "main.asm").unwrap())
        .with("lib/math.obj", assemble(MATH, "lib/math.asm").unwrap())
        .with("io.obj", assemble(IO, "io.asm").unwrap())
}

fn link(store: MemoryObjectStore) -> Result<MemoryImage, LinkError> {
    let config = MemoryConfig::parse(CONFIG).unwrap();
    Linker::with_store(config, LinkOptions::default(), store).link("main.obj")
}

// ============================================================================
// Assemble -> Link
// ============================================================================

#[test]
fn test_multi_unit_program() {
    let image = link(program()).unwrap();

    // LDI REA, [COUNT]
    assert_eq!(image.get(0), Opcode::LdiDirect.to_u32() | dst_field(REA));
    assert_eq!(image.get(1), 0x800000);
    // LDI REB, #1
    assert_eq!(image.get(2), Opcode::LdiImmediate.to_u32() | dst_field(REB));
    assert_eq!(image.get(3), 1);
    // CALL MATH.INCREMENT
    assert_eq!(image.get(4), Opcode::Call.to_u32());
    assert_eq!(image.get(5), 0x1000);
    // STR [COUNT], ACC
    assert_eq!(image.get(6), encode_word(Opcode::StrDirect.to_u32(), ACC, 0));
    assert_eq!(image.get(7), 0x800000);
    // CALL CON.PUT
    assert_eq!(image.get(8), Opcode::Call.to_u32());
    assert_eq!(image.get(9), 0x1100);
    assert_eq!(image.get(10), Opcode::Halt.to_u32());

    // Library bodies at their segment bases
    assert_eq!(image.get(0x1000), encode_word(Opcode::Mov.to_u32(), REA, ACC));
    assert_eq!(image.get(0x1001), encode_word(Opcode::Add.to_u32(), REB, ACC));
    assert_eq!(image.get(0x1002), Opcode::Rts.to_u32());
    assert_eq!(image.get(0x1100), encode_word(Opcode::Mov.to_u32(), ACC, 16));
    assert_eq!(image.get(0x1102), 0);

    // COUNT is a zero word, so DATA contributes nothing to the sparse image
    assert_eq!(image.get(0x800000), 0);
    assert_eq!(image.len(), 11 + 3 + 2);
}

#[test]
fn test_symbols_after_link() {
    let config = MemoryConfig::parse(CONFIG).unwrap();
    let mut linker = Linker::with_store(config, LinkOptions::default(), program());
    linker.link("main.obj").unwrap();

    let symbols = linker.symbols();
    assert_eq!(symbols.address("START"), Some(0));
    assert_eq!(symbols.address("MAIN.START"), Some(0));
    assert_eq!(symbols.address("MATH.INCREMENT"), Some(0x1000));
    assert_eq!(symbols.address("CON.PUT"), Some(0x1100));
    assert_eq!(symbols.address("COUNT"), Some(0x800000));

    // Imports load before their importer
    let order: Vec<_> = linker.objects().iter().map(|o| o.namespace.as_str()).collect();
    assert_eq!(order, ["MATH", "CON", "MAIN"]);
}

#[test]
fn test_link_is_deterministic() {
    let first = link(program()).unwrap();
    let second = link(program()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.digest(), second.digest());
}

#[test]
fn test_missing_library_fails_link() {
    let store = MemoryObjectStore::new()
        .with("main.obj", assemble(MAIN, "main.asm").unwrap())
        .with("io.obj", assemble(IO, "io.asm").unwrap());

    match link(store) {
        Err(LinkError::MissingImport { file, .. }) => assert_eq!(file, "lib/math.asm"),
        other => panic!("expected MissingImport, got {other:?}"),
    }
}

#[test]
fn test_default_segment_program() {
    let assembler = Assembler::with_config(
        InstructionSet::standard(),
        RegisterTable::standard(),
        AssemblerConfig::with_default_segment("code"),
    );
    let object = assembler
        .compile("LDI ACC, #-1\nLOOP:\nJP LOOP", "loop.asm")
        .unwrap();

    let config = MemoryConfig::parse(CONFIG).unwrap();
    let store = MemoryObjectStore::new().with("loop.obj", object);
    let image = Linker::with_store(config, LinkOptions::default(), store)
        .link("loop.obj")
        .unwrap();

    assert_eq!(image.get(1), 0xFF_FFFF);
    assert_eq!(image.get(2), Opcode::Jp.to_u32());
    assert_eq!(image.get(3), 2);
}

// ============================================================================
// Image Text Form
// ============================================================================

#[test]
fn test_image_text_output() {
    let image = link(program()).unwrap();
    let mut out = Vec::new();
    image.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(IMAGE_HEADER));
    let first = lines.next().unwrap();
    assert_eq!(first.len(), 4 * 6 + 3);
    assert!(first.starts_with(&format!("{:06X} 800000 ", image.get(0))));
    // 2^24 words at four per line
    assert_eq!(text.lines().count(), 1 + (1 << 22));
}

// ============================================================================
// Filesystem Workflow
// ============================================================================

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("w24-e2e-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("lib")).unwrap();
    dir
}

#[test]
fn test_objects_on_disk() {
    let dir = workspace("disk");
    for (path, source) in [("main.asm", MAIN), ("lib/math.asm", MATH), ("io.asm", IO)] {
        let object = assemble(source, path).unwrap();
        object
            .save(dir.join(path).with_extension("obj"))
            .unwrap();
    }

    let reloaded = RelocatableObject::load(dir.join("lib/math.obj")).unwrap();
    assert_eq!(reloaded.filename(), "lib/math.asm");

    let config = MemoryConfig::parse(CONFIG).unwrap();
    let mut linker = Linker::new(config, LinkOptions::default());
    let from_disk = linker.link(dir.join("main.obj")).unwrap();
    assert_eq!(from_disk, link(program()).unwrap());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_search_dir_on_disk() {
    let dir = workspace("search");
    let vendor = dir.join("vendor");
    fs::create_dir_all(&vendor).unwrap();

    assemble("!IMPORT util\n.CODE\nJP UTIL.RUN", "main.asm")
        .unwrap()
        .save(dir.join("main.obj"))
        .unwrap();
    assemble(".MATH\nRUN:\nHALT", "util.asm")
        .unwrap()
        .save(vendor.join("util.obj"))
        .unwrap();

    let config = MemoryConfig::parse(CONFIG).unwrap();
    let mut plain = Linker::new(config.clone(), LinkOptions::default());
    assert!(matches!(
        plain.link(dir.join("main.obj")),
        Err(LinkError::MissingImport { .. })
    ));

    let options = LinkOptions {
        search_dirs: vec![vendor],
        ..LinkOptions::default()
    };
    let image = Linker::new(config, options).link(dir.join("main.obj")).unwrap();
    assert_eq!(image.get(1), 0x1000);
    assert_eq!(image.get(0x1000), Opcode::Halt.to_u32());

    fs::remove_dir_all(&dir).unwrap();
}
