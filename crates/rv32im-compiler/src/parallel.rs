//! The Parallel Driver (§4.6): partitions a flat instruction list into
//! dependency-free batches and, within a batch large enough to bother,
//! lowers it across worker threads before merging their gates back onto
//! the shared circuit in a fixed, deterministic order.
//!
//! Only register-to-register instructions with no memory access, no branch
//! or jump, and no live PC read ever land in a multi-instruction batch:
//! memory ops, branches/jumps, and AUIPC (the one ALU-family instruction
//! that reads the PC) always force a singleton batch, so a worker's job
//! reduces to a pure function of the registers it reads — no cross-worker
//! PC bookkeeping is needed.

use rayon::prelude::*;
use rv32im_circuit::{Circuit, WireId};
use rv32im_kernels::Emitter;

use crate::config::CompilerConfig;
use crate::decoder::Instruction;
use crate::error::CompileError;
use crate::lowerer::{alu_op, const_word, mul_div_op, shift_op, Lowerer};

/// Lowers `program` (decoded instructions paired with their word index) in
/// full, applying the dependency-batching and worker split described in
/// spec.md §4.6.
pub fn compile_batches(
    lowerer: &mut Lowerer<'_>,
    program: &[(usize, Instruction)],
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    for window in program.chunks(config.batch_size.max(1)) {
        for batch in form_batches(window) {
            lower_batch(lowerer, &batch, config)?;
        }
    }
    Ok(())
}

/// Whether an instruction can only ever be lowered alone: anything that
/// touches memory, redirects control flow, or reads the live PC value.
fn forces_singleton(instr: &Instruction) -> bool {
    matches!(
        instr,
        Instruction::Load { .. }
            | Instruction::Store { .. }
            | Instruction::Branch { .. }
            | Instruction::Jal { .. }
            | Instruction::Jalr { .. }
            | Instruction::Auipc { .. }
            | Instruction::Ecall
            | Instruction::Ebreak
    )
}

/// `(writes_rd, reads)` for the register-dependency side of §4.6's
/// dependency rule (the PC is deliberately excluded — see the module docs).
fn reg_effects(instr: &Instruction) -> (Option<u8>, Vec<u8>) {
    match *instr {
        Instruction::Lui { rd, .. } => (Some(rd), vec![]),
        Instruction::OpImm { rd, rs1, .. } => (Some(rd), vec![rs1]),
        Instruction::ShiftImm { rd, rs1, .. } => (Some(rd), vec![rs1]),
        Instruction::Op { rd, rs1, rs2, .. } => (Some(rd), vec![rs1, rs2]),
        Instruction::Shift { rd, rs1, rs2, .. } => (Some(rd), vec![rs1, rs2]),
        Instruction::MulDiv { rd, rs1, rs2, .. } => (Some(rd), vec![rs1, rs2]),
        _ => (None, vec![]),
    }
}

fn depends(a: &Instruction, b: &Instruction) -> bool {
    if forces_singleton(a) || forces_singleton(b) {
        return true;
    }
    let (a_writes, a_reads) = reg_effects(a);
    let (b_writes, b_reads) = reg_effects(b);
    let touches = |w: Option<u8>, reads: &[u8], other_w: Option<u8>| {
        // RAW/WAR: one side's write is the other's read.
        if let Some(w) = w {
            if w != 0 && reads.contains(&w) {
                return true;
            }
        }
        // WAW: both write the same register.
        matches!((w, other_w), (Some(x), Some(y)) if x != 0 && x == y)
    };
    touches(a_writes, &b_reads, b_writes) || touches(b_writes, &a_reads, a_writes)
}

/// Greedy leveling (§4.6): scans the unassigned tail, admitting any
/// instruction that conflicts with nothing already in the batch and
/// nothing skipped earlier in this pass, preserving RISC-V program order
/// within a dependency chain.
fn form_batches(window: &[(usize, Instruction)]) -> Vec<Vec<(usize, Instruction)>> {
    let mut remaining: Vec<usize> = (0..window.len()).collect();
    let mut batches = Vec::new();

    while !remaining.is_empty() {
        let mut admitted: Vec<usize> = Vec::new();
        let mut skipped: Vec<usize> = Vec::new();

        for &idx in &remaining {
            let conflicts_admitted = admitted.iter().any(|&a| depends(&window[a].1, &window[idx].1));
            let conflicts_skipped = skipped.iter().any(|&s| depends(&window[s].1, &window[idx].1));
            if conflicts_admitted || conflicts_skipped {
                skipped.push(idx);
            } else {
                admitted.push(idx);
            }
        }

        batches.push(admitted.iter().map(|&i| window[i].clone()).collect());
        remaining = skipped;
    }

    batches
}

fn lower_batch(lowerer: &mut Lowerer<'_>, batch: &[(usize, Instruction)], config: &CompilerConfig) -> Result<(), CompileError> {
    if batch.is_empty() {
        return Ok(());
    }
    if !config.enable_parallel || config.num_threads <= 1 || batch.len() == 1 {
        for &(word_index, instr) in batch {
            lowerer.lower(word_index, 0, instr)?;
        }
        return Ok(());
    }

    let chunk_size = batch.len().div_ceil(config.num_threads).max(1);
    let chunks: Vec<&[(usize, Instruction)]> = batch.chunks(chunk_size).collect();

    let reg_snapshot: [[WireId; 32]; 32] = std::array::from_fn(|r| lowerer.regs().reg(r as u8));
    let results: Vec<WorkerResult> = chunks
        .par_iter()
        .map(|chunk| lower_chunk(chunk, &reg_snapshot, config))
        .collect();

    for result in results {
        merge_worker(lowerer, result);
    }
    lowerer.advance_pc_by(batch.len() as u32);
    Ok(())
}

/// One worker's output: a self-contained local circuit using its own wire
/// numbering (wires 0/1 are the universal constants; wires `2..num_inputs`
/// are pass-through slots for `external_wires`; everything at or above
/// `num_inputs` was freshly allocated by this worker and needs a fresh
/// global wire at merge time), plus the register writes it produced, still
/// in that local numbering.
struct WorkerResult {
    local_circuit: Circuit,
    external_wires: Vec<WireId>,
    writes: Vec<(u8, [WireId; 32])>,
}

fn lower_chunk(chunk: &[(usize, Instruction)], reg_snapshot: &[[WireId; 32]; 32], config: &CompilerConfig) -> WorkerResult {
    let mut external_regs: Vec<u8> = Vec::new();
    for (_, instr) in chunk {
        let (_, reads) = reg_effects(instr);
        for r in reads {
            if r != 0 && !external_regs.contains(&r) {
                external_regs.push(r);
            }
        }
    }
    external_regs.sort_unstable();

    let num_inputs = 2 + external_regs.len() * 32;
    let mut local_circuit = Circuit::new(num_inputs.max(2), 0).expect("worker-local circuit never exceeds the boundary cap");
    let external_wires: Vec<WireId> = external_regs.iter().flat_map(|&r| reg_snapshot[r as usize]).collect();

    let local_value_of = |reg: u8| -> [WireId; 32] {
        if reg == 0 {
            return [WireId::FALSE; 32];
        }
        let slot = external_regs.iter().position(|&r| r == reg).expect("read register was collected above");
        std::array::from_fn(|b| WireId::from((2 + slot * 32 + b) as u32))
    };

    let mut writes = Vec::new();
    {
        let mut e = Emitter::new(&mut local_circuit, config.enable_deduplication, config.enable_caching);
        for (_, instr) in chunk {
            let value = match *instr {
                Instruction::Lui { imm, .. } => const_word(imm as u32),
                Instruction::OpImm { kind, rs1, imm, .. } => alu_op(&mut e, kind, &local_value_of(rs1), &const_word(imm as u32)),
                Instruction::ShiftImm { kind, rs1, shamt, .. } => {
                    let amount: [WireId; 5] = std::array::from_fn(|b| WireId::constant((shamt >> b) & 1 == 1));
                    shift_op(&mut e, kind, &local_value_of(rs1), &amount)
                }
                Instruction::Op { kind, rs1, rs2, .. } => alu_op(&mut e, kind, &local_value_of(rs1), &local_value_of(rs2)),
                Instruction::Shift { kind, rs1, rs2, .. } => {
                    let b = local_value_of(rs2);
                    let amount: [WireId; 5] = std::array::from_fn(|i| b[i]);
                    shift_op(&mut e, kind, &local_value_of(rs1), &amount)
                }
                Instruction::MulDiv { kind, rs1, rs2, .. } => mul_div_op(&mut e, kind, &local_value_of(rs1), &local_value_of(rs2)),
                _ => unreachable!("forces_singleton excludes this instruction from multi-instruction batches"),
            };
            let (rd, _) = reg_effects(instr);
            if let Some(rd) = rd {
                if rd != 0 {
                    writes.push((rd, value));
                }
            }
        }
    }

    WorkerResult { local_circuit, external_wires, writes }
}

fn merge_worker(lowerer: &mut Lowerer<'_>, result: WorkerResult) {
    let num_inputs = result.local_circuit.num_inputs() as u32;
    let num_new = result.local_circuit.num_wires() - num_inputs;
    let fresh = lowerer.emitter_mut().circuit_mut().allocate_wires(num_new as usize);

    let remap = |local: WireId| -> WireId {
        let raw = u32::from(local);
        if raw == 0 {
            WireId::FALSE
        } else if raw == 1 {
            WireId::TRUE
        } else if raw < num_inputs {
            result.external_wires[(raw - 2) as usize]
        } else {
            fresh[(raw - num_inputs) as usize]
        }
    };

    for gate in result.local_circuit.gates() {
        let left = remap(gate.left());
        let right = remap(gate.right());
        let output = remap(gate.output());
        lowerer.emitter_mut().circuit_mut().add_gate(left, right, output, gate.kind());
    }

    for (rd, local_value) in result.writes {
        let global_value: [WireId; 32] = std::array::from_fn(|b| remap(local_value[b]));
        lowerer.regs_mut().set_reg(rd, global_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::AluOp;
    use crate::memory_backend::MemoryBackend;
    use crate::state::RegisterFile;
    use rv32im_circuit::WireLayout;

    fn evaluate(circuit: &Circuit) -> Vec<bool> {
        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        values
    }

    fn word_of(values: &[bool], wires: &[WireId; 32]) -> u32 {
        let mut out = 0u32;
        for (i, &w) in wires.iter().enumerate() {
            if values[u32::from(w) as usize] {
                out |= 1 << i;
            }
        }
        out
    }

    fn setup(memory_bytes: usize) -> (Circuit, WireLayout) {
        let layout = WireLayout::new(memory_bytes);
        let circuit = Circuit::new(layout.num_inputs(), 32).unwrap();
        (circuit, layout)
    }

    #[test]
    fn independent_instructions_batch_together() {
        let prog = vec![
            (0, Instruction::OpImm { kind: AluOp::Add, rd: 1, rs1: 0, imm: 1 }),
            (1, Instruction::OpImm { kind: AluOp::Add, rd: 2, rs1: 0, imm: 2 }),
            (2, Instruction::OpImm { kind: AluOp::Add, rd: 3, rs1: 0, imm: 3 }),
        ];
        let batches = form_batches(&prog);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }

    #[test]
    fn a_raw_chain_splits_into_separate_batches() {
        let prog = vec![
            (0, Instruction::OpImm { kind: AluOp::Add, rd: 1, rs1: 0, imm: 1 }),
            (1, Instruction::OpImm { kind: AluOp::Add, rd: 2, rs1: 1, imm: 1 }),
        ];
        let batches = form_batches(&prog);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn a_memory_instruction_is_always_its_own_batch() {
        let prog = vec![
            (0, Instruction::OpImm { kind: AluOp::Add, rd: 1, rs1: 0, imm: 1 }),
            (1, Instruction::Load { kind: crate::decoder::LoadKind::Word, rd: 2, rs1: 0, imm: 0 }),
            (2, Instruction::OpImm { kind: AluOp::Add, rd: 3, rs1: 0, imm: 3 }),
        ];
        let batches = form_batches(&prog);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 3);
        assert!(batches.iter().any(|b| b.len() == 1 && matches!(b[0].1, Instruction::Load { .. })));
    }

    #[test]
    fn parallel_batch_lowering_matches_sequential_results() {
        let prog = vec![
            (0, Instruction::OpImm { kind: AluOp::Add, rd: 1, rs1: 0, imm: 10 }),
            (1, Instruction::OpImm { kind: AluOp::Add, rd: 2, rs1: 0, imm: 20 }),
            (2, Instruction::OpImm { kind: AluOp::Add, rd: 3, rs1: 0, imm: 30 }),
            (3, Instruction::OpImm { kind: AluOp::Add, rd: 4, rs1: 0, imm: 40 }),
        ];

        let (mut circuit, layout) = setup(32);
        let e = Emitter::new(&mut circuit, true, true);
        let regs = RegisterFile::new(&layout);
        let mut lowerer = Lowerer::new(e, regs, None::<MemoryBackend>, CompilerConfig { num_threads: 4, enable_parallel: true, ..CompilerConfig::default() });

        compile_batches(&mut lowerer, &prog, &CompilerConfig { num_threads: 4, enable_parallel: true, ..CompilerConfig::default() }).unwrap();

        let values = evaluate(lowerer.emitter().circuit());
        assert_eq!(word_of(&values, &lowerer.regs().reg(1)), 10);
        assert_eq!(word_of(&values, &lowerer.regs().reg(2)), 20);
        assert_eq!(word_of(&values, &lowerer.regs().reg(3)), 30);
        assert_eq!(word_of(&values, &lowerer.regs().reg(4)), 40);
        assert_eq!(word_of(&values, &lowerer.regs().pc()), 16);
    }
}
