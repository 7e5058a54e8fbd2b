//! Gate-level circuit evaluation: the ground truth every compiled program
//! is checked against in difftest comparisons.

use rv32im_circuit::{Circuit, WireId};
use rv32im_compiler::{CompiledProgram, MachineState};

/// Evaluates every gate in `circuit` against `inputs` (one bit per input
/// wire, in wire-id order, as produced by [`MachineState::encode_inputs`]),
/// returning the full wire-value table. No kernel shortcuts, no caching —
/// just `GateKind::eval` walked in the circuit's own emission order, which
/// is already a valid evaluation order since every gate's inputs are
/// defined before the gate itself is appended.
pub fn simulate(circuit: &Circuit, inputs: &[bool]) -> Vec<bool> {
    let mut values = vec![false; circuit.num_wires() as usize];
    values[..inputs.len()].copy_from_slice(inputs);
    for gate in circuit.gates() {
        let l = values[u32::from(gate.left()) as usize];
        let r = values[u32::from(gate.right()) as usize];
        values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
    }
    values
}

/// Runs a compiled program against `input` end to end: encodes the
/// boundary, simulates every gate, and decodes the result back into a
/// [`MachineState`] the same way a real caller would.
pub fn run_program(program: &CompiledProgram, input: &MachineState) -> MachineState {
    let inputs = input.encode_inputs(&program.layout);
    let values = simulate(&program.circuit, &inputs);

    let outputs = program.circuit.output_wires();
    let pc_out: [WireId; 32] = std::array::from_fn(|b| outputs[b]);
    let reg_out: [[WireId; 32]; 32] = std::array::from_fn(|r| std::array::from_fn(|b| outputs[32 + r * 32 + b]));
    let mem_start = 32 + 32 * 32;
    let mem_bytes = (outputs.len() - mem_start) / 8;
    let memory_out: Vec<[WireId; 8]> = (0..mem_bytes)
        .map(|byte_idx| std::array::from_fn(|b| outputs[mem_start + byte_idx * 8 + b]))
        .collect();

    MachineState::decode_outputs(&values, &pc_out, &reg_out, &memory_out)
}
