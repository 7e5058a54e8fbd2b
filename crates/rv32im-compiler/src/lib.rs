//! Compiles a bounded RV32IM instruction stream into a combinational
//! AND/XOR gate circuit: decode, fusion peephole, dependency-batched
//! lowering, and the state codec at the circuit's input/output boundary.

pub mod config;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod fusion;
pub mod lowerer;
pub mod memory_backend;
pub mod parallel;
pub mod state;

use rv32im_circuit::{Circuit, WireLayout, NUM_REGS, WORD_BITS};
use rv32im_kernels::Emitter;

pub use config::{CompilerConfig, MemoryTierKind};
pub use decoder::Instruction;
pub use error::CompileError;
pub use lowerer::{Lowerer, SyscallMarker};
pub use state::{MachineState, RegisterFile};

use memory_backend::MemoryBackend;

/// A finished circuit plus everything needed to read `MachineState` off its
/// boundary: the layout that placed the inputs, and any ECALL/EBREAK
/// markers the program hit along the way.
#[derive(Debug)]
pub struct CompiledProgram {
    pub circuit: Circuit,
    pub layout: WireLayout,
    pub markers: Vec<SyscallMarker>,
}

/// Lowers `instructions` against a machine with `requested_memory_bytes` of
/// addressable memory, using `config`'s memory tier, fusion, and Parallel
/// Driver settings.
///
/// The selected memory tier has a fixed capacity (§4.4); `requested_memory_bytes`
/// must fit within it or compilation fails with
/// [`CompileError::MemoryConstraintExceeded`] before any gate is emitted.
pub fn compile(instructions: &[u32], requested_memory_bytes: usize, config: CompilerConfig) -> Result<CompiledProgram, CompileError> {
    let config = config.validated();

    if instructions.len() > config.max_instructions {
        return Err(CompileError::OutOfMemory {
            actual: instructions.len(),
            limit: config.max_instructions,
        });
    }

    let tier_capacity = config.memory_tier.capacity_bytes();
    if requested_memory_bytes > tier_capacity {
        return Err(CompileError::MemoryConstraintExceeded {
            word_index: 0,
            reason: format!(
                "program requests {requested_memory_bytes} bytes of memory, exceeding the {:?} tier's {tier_capacity}-byte capacity",
                config.memory_tier
            ),
        });
    }

    let layout = WireLayout::new(tier_capacity);
    let num_outputs = WORD_BITS + NUM_REGS * WORD_BITS + memory_output_width(&config);
    let mut circuit = Circuit::new(layout.num_inputs(), num_outputs)?;

    let markers;
    {
        let mut e = Emitter::new(&mut circuit, config.enable_deduplication, config.enable_caching);
        let memory = MemoryBackend::new(config.memory_tier, &mut e, &layout);
        let regs = RegisterFile::new(&layout);
        let mut lowerer = Lowerer::new(e, regs, Some(memory), config.clone());

        run_pipeline(&mut lowerer, instructions, &config)?;
        finalize_outputs(&mut lowerer);
        markers = lowerer.markers().to_vec();
    }

    Ok(CompiledProgram { circuit, layout, markers })
}

fn memory_output_width(config: &CompilerConfig) -> usize {
    match config.memory_tier {
        // A Merkle root digest, not the raw memory image — see `MemoryBackend::output_bits`.
        MemoryTierKind::Secure => 256,
        MemoryTierKind::Ultra | MemoryTierKind::Simple => config.memory_tier.capacity_bytes() * 8,
    }
}

/// Decodes every instruction word, then runs the fusion peephole (§4.5) over
/// the decoded stream before handing whatever it didn't consume to the
/// Parallel Driver (§4.6).
fn run_pipeline(lowerer: &mut Lowerer<'_>, instructions: &[u32], config: &CompilerConfig) -> Result<(), CompileError> {
    let decoded: Vec<Instruction> = instructions
        .iter()
        .enumerate()
        .map(|(word_index, &word)| {
            decoder::decode(word).map_err(|err| CompileError::UnsupportedOpcode {
                word_index,
                encoding: word,
                reason: err.to_string(),
            })
        })
        .collect::<Result<_, _>>()?;

    let mut remaining: Vec<(usize, Instruction)> = Vec::with_capacity(decoded.len());
    let mut i = 0;
    while i < decoded.len() {
        if config.enable_fusion && i + 1 < decoded.len() {
            if fusion::try_fuse(lowerer, i, decoded[i], decoded[i + 1])? {
                i += 2;
                continue;
            }
        }
        remaining.push((i, decoded[i]));
        i += 1;
    }

    parallel::compile_batches(lowerer, &remaining, config)
}

/// Binds the circuit's outputs to the final PC, register, and memory wire
/// maps, in that order — matching [`MachineState::decode_outputs`]'s
/// expected layout.
fn finalize_outputs(lowerer: &mut Lowerer<'_>) {
    let pc = lowerer.regs().pc();
    let regs: Vec<_> = (0..NUM_REGS as u8).map(|r| lowerer.regs().reg(r)).collect();
    let memory_bits = lowerer.memory().map(MemoryBackend::output_bits).unwrap_or_default();

    let circuit = lowerer.emitter_mut().circuit_mut();
    for wire in pc {
        circuit.push_output(wire);
    }
    for reg in &regs {
        for wire in reg {
            circuit.push_output(*wire);
        }
    }
    for wire in memory_bits {
        circuit.push_output(wire);
    }
}
