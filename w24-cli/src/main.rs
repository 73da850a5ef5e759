use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use w24_assembler::{Assembler, AssemblerConfig};
use w24_linker::{LinkOptions, Linker, MemoryConfig, SymbolPolicy};
use w24_microcode::{BinaryRomWriter, Microcode, MicrocodeGenerator, RomWriter};
use w24_spec::{InstructionSet, RegisterTable};

mod output;

use output::{object_output, write_atomically};

#[derive(Parser, Debug)]
#[command(author, version, about = "W24 assembler, linker and microcode generator")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble one source file into a relocatable object written to `<OUTPUT>.obj`
    Asm {
        input: PathBuf,
        output: PathBuf,
        /// Segment for code that precedes any segment directive
        #[arg(long, value_name = "NAME")]
        default_segment: Option<String>,
    },
    /// Link a main object and its imports into a memory image
    Link {
        main: PathBuf,
        config: PathBuf,
        output: PathBuf,
        /// Fail on bare names defined by more than one object
        #[arg(long)]
        strict: bool,
        /// Extra directory searched for imports (repeatable)
        #[arg(short = 'I', long = "search-dir", value_name = "DIR")]
        search_dirs: Vec<PathBuf>,
    },
    /// Generate the microcode control-store ROM
    Microcode { output: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Opts::parse().command {
        Command::Asm {
            input,
            output,
            default_segment,
        } => assemble(&input, &output, default_segment),
        Command::Link {
            main,
            config,
            output,
            strict,
            search_dirs,
        } => {
            let policy = if strict {
                SymbolPolicy::Strict
            } else {
                SymbolPolicy::LastLoadedWins
            };
            let options = LinkOptions {
                policy,
                search_dirs,
            };
            link(&main, &config, &output, options)
        }
        Command::Microcode { output } => microcode(&output),
    }
}

fn assemble(input: &Path, output: &Path, default_segment: Option<String>) -> Result<()> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let config = default_segment
        .map(AssemblerConfig::with_default_segment)
        .unwrap_or_default();
    let assembler =
        Assembler::with_config(InstructionSet::standard(), RegisterTable::standard(), config);

    let unit_name = input.display().to_string();
    let object = assembler
        .compile(&source, &unit_name)
        .with_context(|| format!("assembling {} failed", input.display()))?;
    let json = object.to_json()?;

    let path = object_output(output);
    write_atomically(&path, |out| Ok(out.write_all(json.as_bytes())?))?;
    info!(output = %path.display(), words = object.word_count(), "object written");
    Ok(())
}

fn link(main: &Path, config: &Path, output: &Path, options: LinkOptions) -> Result<()> {
    let config = MemoryConfig::load(config)
        .with_context(|| format!("cannot load memory config {}", config.display()))?;
    let mut linker = Linker::new(config, options);

    let image = match linker.link(main) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("Available symbols:");
            for (symbol, address) in linker.symbols().iter() {
                eprintln!("  {symbol}: 0x{address:06X}");
            }
            return Err(err).with_context(|| format!("linking {} failed", main.display()));
        }
    };

    write_atomically(output, |out| Ok(image.write_to(out)?))?;

    println!("Linked image generated: {}", output.display());
    println!(
        "Memory image size: {} words ({} bytes)",
        image.len(),
        image.len() * 3
    );
    println!("Segments placed:");
    for (name, segment) in linker.config().iter() {
        println!(
            "  {name}: 0x{:06X} - 0x{:06X} ({} words)",
            segment.start,
            segment.end().saturating_sub(1),
            segment.size
        );
    }
    println!("Resolved labels: {}", linker.symbols().len());
    for (symbol, address) in linker.symbols().iter() {
        println!("  {symbol}: 0x{address:06X}");
    }
    info!(digest = %image.digest(), "image written");
    Ok(())
}

fn microcode(output: &Path) -> Result<()> {
    let generator = MicrocodeGenerator::new(Microcode::standard());
    let rom = generator.generate().context("microcode generation failed")?;

    write_atomically(output, |out| Ok(BinaryRomWriter::new(out).write_rom(&rom)?))?;

    println!("Generated {} microcode words.", rom.len());
    println!("Opcodes:");
    for (name, opcode) in generator.table().opcodes() {
        println!("  {name}: 0x{opcode:02X}");
    }
    info!(output = %output.display(), digest = %rom.digest(), "ROM written");
    Ok(())
}
