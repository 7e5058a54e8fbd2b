//! Layered gate-list format (§6.2): the same header, then gates grouped by
//! longest-input-path layer — input wires sit at layer 0, and a gate's
//! layer is `1 + max(layer_of(left), layer_of(right))`. Intended for
//! downstream consumers that want to process a circuit level by level (each
//! layer's gates are mutually independent and can run concurrently).

use std::io::{BufRead, Write};

use rv32im_circuit::Circuit;

use crate::error::FmtError;
use crate::flat::read_header;
use crate::parsed::{self, ParsedCircuit, ParsedGate};

/// Computes each gate's layer, input wires implicitly at layer 0.
///
/// `circuit.gates()` is already topologically ordered (every gate's inputs
/// are defined by an earlier gate or an input wire), so one linear pass with
/// a per-wire layer table suffices — no separate graph walk is needed.
fn layer_of_gates(circuit: &Circuit) -> Vec<u32> {
    let mut wire_layer = vec![0u32; circuit.num_wires() as usize];
    let mut gate_layer = Vec::with_capacity(circuit.num_gates());
    for gate in circuit.gates() {
        let l = 1 + wire_layer[usize::from(gate.left())].max(wire_layer[usize::from(gate.right())]);
        wire_layer[usize::from(gate.output())] = l;
        gate_layer.push(l);
    }
    gate_layer
}

/// Writes `circuit` to `out` in layered format.
pub fn write_layered(circuit: &Circuit, mut out: impl Write) -> Result<(), FmtError> {
    tracing::debug!(gates = circuit.num_gates(), "writing layered gate list");
    writeln!(out, "# rv32im-ckt layered gate list")?;
    writeln!(out, "CIRCUIT_INPUTS {}", circuit.num_inputs())?;
    writeln!(out, "CIRCUIT_OUTPUTS {}", circuit.num_outputs())?;
    writeln!(out, "CIRCUIT_GATES {}", circuit.num_gates())?;
    write!(out, "OUTPUTS")?;
    for wire in circuit.output_wires() {
        write!(out, " {}", u32::from(*wire))?;
    }
    writeln!(out)?;

    let gate_layer = layer_of_gates(circuit);
    let max_layer = gate_layer.iter().copied().max().unwrap_or(0);

    for layer_id in 1..=max_layer {
        let indices: Vec<usize> = gate_layer.iter().enumerate().filter(|&(_, &l)| l == layer_id).map(|(i, _)| i).collect();
        writeln!(out, "layer {layer_id} {}", indices.len())?;
        for idx in indices {
            let gate = circuit.gate(idx);
            let kind_code = if matches!(gate.kind(), rv32im_circuit::GateKind::And) { 0 } else { 1 };
            writeln!(out, "{} {} {} {kind_code}", u32::from(gate.left()), u32::from(gate.right()), u32::from(gate.output()))?;
        }
    }
    Ok(())
}

/// Reads a layered gate-list file back into a [`ParsedCircuit`]. Gates are
/// collected in file order (layer by layer) — [`ParsedCircuit::into_circuit`]
/// sorts by output wire id before replay, which recovers the original
/// emission order regardless of how the layers interleaved it.
pub fn read_layered(input: impl BufRead) -> Result<ParsedCircuit, FmtError> {
    let (num_inputs, num_outputs, outputs, _declared_gates, lines) = read_header(input)?;

    let mut gates = Vec::new();
    let mut lines = lines.into_iter();
    while let Some((line_no, line)) = lines.next() {
        let mut tokens = line.split_ascii_whitespace();
        if tokens.next() != Some("layer") {
            return Err(FmtError::Malformed { line: line_no, reason: "expected a `layer <id> <count>` line".to_string() });
        }
        let _layer_id = tokens.next();
        let count: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| FmtError::Malformed { line: line_no, reason: "expected a gate count after the layer id".to_string() })?;

        for _ in 0..count {
            let (gate_line_no, gate_line) = lines.next().ok_or_else(|| FmtError::Malformed {
                line: line_no,
                reason: "layer header promised more gates than the file contains".to_string(),
            })?;
            let mut gate_tokens = gate_line.split_ascii_whitespace();
            let left = gate_tokens.next().ok_or_else(|| FmtError::Malformed { line: gate_line_no, reason: "missing left operand".to_string() })?;
            let right = gate_tokens
                .next()
                .ok_or_else(|| FmtError::Malformed { line: gate_line_no, reason: "missing right operand".to_string() })?;
            let output = gate_tokens
                .next()
                .ok_or_else(|| FmtError::Malformed { line: gate_line_no, reason: "missing output wire".to_string() })?;
            let kind_code = gate_tokens
                .next()
                .ok_or_else(|| FmtError::Malformed { line: gate_line_no, reason: "missing kind code".to_string() })?;
            let kind = match kind_code {
                "0" => rv32im_circuit::GateKind::And,
                "1" => rv32im_circuit::GateKind::Xor,
                other => return Err(FmtError::Malformed { line: gate_line_no, reason: format!("expected kind code 0 or 1, got {other:?}") }),
            };
            gates.push(ParsedGate {
                left: parsed::parse_wire(gate_line_no, left)?,
                right: parsed::parse_wire(gate_line_no, right)?,
                output: parsed::parse_wire(gate_line_no, output)?,
                kind,
            });
        }
    }

    Ok(ParsedCircuit { num_inputs, num_outputs, gates, outputs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::{GateKind, WireId};

    fn multi_layer_circuit() -> Circuit {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let a = WireId::from(2);
        let b = WireId::from(3);
        let x = circuit.emit_gate(a, b, GateKind::Xor); // layer 1
        let y = circuit.emit_gate(a, b, GateKind::And); // layer 1
        let z = circuit.emit_gate(x, y, GateKind::Xor); // layer 2
        circuit.push_output(z);
        circuit
    }

    #[test]
    fn layered_round_trips_to_the_same_gate_set() {
        let original = multi_layer_circuit();
        let mut buf = Vec::new();
        write_layered(&original, &mut buf).unwrap();

        let parsed = read_layered(buf.as_slice()).unwrap();
        let rebuilt = parsed.into_circuit().unwrap();

        assert_eq!(original.gates(), rebuilt.gates());
        assert_eq!(original.output_wires(), rebuilt.output_wires());
    }

    #[test]
    fn independent_gates_share_a_layer() {
        let circuit = multi_layer_circuit();
        let layers = layer_of_gates(&circuit);
        assert_eq!(layers, vec![1, 1, 2]);
    }
}
