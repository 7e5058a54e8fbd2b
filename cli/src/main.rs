//! `rv32im-ckt`: compiles a bounded RV32IM instruction stream into a
//! combinational AND/XOR gate circuit, and inspects the resulting gate-list
//! file.

mod report;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mimalloc::MiMalloc;
use rv32im_circuit::GateKind;
use rv32im_compiler::{CompilerConfig, MemoryTierKind};
use rv32im_fmt::{read_flat, read_layered, write_flat, write_layered};
use rv32im_loader::ProgramImage;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "rv32im-ckt")]
#[command(about = "RV32IM-to-gate-circuit compiler and gate-list inspector", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv). Overrides RUST_LOG when present.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all logging below warnings.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum GateListFormat {
    Flat,
    Layered,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MemoryTierArg {
    Ultra,
    Simple,
    Secure,
    /// Picks `Ultra` if the requested memory fits its 8-word capacity,
    /// `Simple` otherwise — spec's "constrained constructor".
    Auto,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a raw little-endian instruction word stream to a gate circuit.
    Compile {
        /// Raw instruction stream: one 32-bit little-endian word per
        /// instruction, no ELF headers.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Gate-list output file (defaults to input with the format's
        /// extension).
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Gate-list text layout.
        #[arg(short, long, value_enum, default_value_t = GateListFormat::Flat)]
        format: GateListFormat,

        /// Bytes of addressable data memory the program requires.
        #[arg(long, default_value_t = 0)]
        memory_bytes: usize,

        /// Which memory tier backs loads and stores.
        #[arg(long, value_enum, default_value_t = MemoryTierArg::Simple)]
        memory_tier: MemoryTierArg,

        /// Worker thread count for the Parallel Driver (1..=16).
        #[arg(long, default_value_t = 8)]
        threads: usize,

        /// Maximum instructions considered per dependency-batch-formation
        /// pass.
        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,

        /// Disables the Parallel Driver; every instruction lowers
        /// sequentially.
        #[arg(long)]
        no_parallel: bool,

        /// Disables the LUI+ADDI / AUIPC+ADDI fusion peephole.
        #[arg(long)]
        no_fusion: bool,

        /// Disables structural gate deduplication.
        #[arg(long)]
        no_dedup: bool,

        /// Disables whole-kernel pattern caching.
        #[arg(long)]
        no_cache: bool,
    },

    /// Print the boundary and gate statistics of a compiled gate-list file.
    Info {
        /// Gate-list file to inspect.
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Which text layout the file was written in.
        #[arg(short, long, value_enum, default_value_t = GateListFormat::Flat)]
        format: GateListFormat,

        /// Also print the AND/XOR gate-kind breakdown.
        #[arg(short, long)]
        detailed: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Compile {
            input,
            output,
            format,
            memory_bytes,
            memory_tier,
            threads,
            batch_size,
            no_parallel,
            no_fusion,
            no_dedup,
            no_cache,
        } => run_compile(CompileArgs {
            input,
            output,
            format,
            memory_bytes,
            memory_tier,
            threads,
            batch_size,
            no_parallel,
            no_fusion,
            no_dedup,
            no_cache,
        }),
        Commands::Info { file, format, detailed } => run_info(&file, format, detailed),
    }
}

fn install_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).without_time().init();
}

struct CompileArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    format: GateListFormat,
    memory_bytes: usize,
    memory_tier: MemoryTierArg,
    threads: usize,
    batch_size: usize,
    no_parallel: bool,
    no_fusion: bool,
    no_dedup: bool,
    no_cache: bool,
}

fn run_compile(args: CompileArgs) -> Result<()> {
    let bytes = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let image = ProgramImage::from_raw_code(&bytes).with_context(|| format!("{} is not a whole number of 32-bit words", args.input.display()))?;

    let memory_tier = match args.memory_tier {
        MemoryTierArg::Ultra => MemoryTierKind::Ultra,
        MemoryTierArg::Simple => MemoryTierKind::Simple,
        MemoryTierArg::Secure => MemoryTierKind::Secure,
        MemoryTierArg::Auto => MemoryTierKind::constrained_for(args.memory_bytes),
    };

    let config = CompilerConfig {
        enable_parallel: !args.no_parallel,
        enable_fusion: !args.no_fusion,
        enable_deduplication: !args.no_dedup,
        enable_caching: !args.no_cache,
        num_threads: args.threads,
        batch_size: args.batch_size,
        memory_tier,
        ..CompilerConfig::default()
    };

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    bar.set_message(format!("compiling {} instructions", image.instructions.len()));
    bar.enable_steady_tick(std::time::Duration::from_millis(120));

    let started = Instant::now();
    let compiled = rv32im_compiler::compile(&image.instructions, args.memory_bytes, config);
    bar.finish_and_clear();

    let compiled = match compiled {
        Ok(program) => program,
        Err(err) => {
            report::print_compile_failure(&err);
            bail!("compilation failed: {err}");
        }
    };

    tracing::info!(
        gates = compiled.circuit.num_gates(),
        wires = compiled.circuit.num_wires(),
        elapsed_ms = started.elapsed().as_millis(),
        "compiled circuit"
    );

    let output = args.output.unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension(match args.format {
            GateListFormat::Flat => "ckt",
            GateListFormat::Layered => "lckt",
        });
        path
    });
    let out = BufWriter::new(File::create(&output).with_context(|| format!("creating {}", output.display()))?);
    match args.format {
        GateListFormat::Flat => write_flat(&compiled.circuit, out)?,
        GateListFormat::Layered => write_layered(&compiled.circuit, out)?,
    }

    println!("compiled {} instructions into {} gates", image.instructions.len(), compiled.circuit.num_gates());
    println!("inputs: {} bits, outputs: {} bits", compiled.circuit.num_inputs(), compiled.circuit.num_outputs());
    if !compiled.markers.is_empty() {
        println!("{} ECALL/EBREAK marker(s) recorded", compiled.markers.len());
    }
    println!("wrote {}", output.display());
    Ok(())
}

fn run_info(file: &PathBuf, format: GateListFormat, detailed: bool) -> Result<()> {
    let input = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let parsed = match format {
        GateListFormat::Flat => read_flat(input)?,
        GateListFormat::Layered => read_layered(input)?,
    };

    println!("inputs:  {}", parsed.num_inputs);
    println!("outputs: {}", parsed.num_outputs);
    println!("gates:   {}", parsed.gates.len());

    if detailed {
        let and_count = parsed.gates.iter().filter(|g| g.kind == GateKind::And).count();
        let xor_count = parsed.gates.len() - and_count;
        println!("AND gates: {and_count}");
        println!("XOR gates: {xor_count}");
    }

    Ok(())
}
