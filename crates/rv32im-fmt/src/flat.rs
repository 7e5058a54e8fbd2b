//! Flat gate-list format (§6.2): one gate per line, in emission order.
//!
//! ```text
//! # comment lines begin with '#'
//! CIRCUIT_INPUTS <num_inputs>
//! CIRCUIT_OUTPUTS <num_outputs>
//! CIRCUIT_GATES <num_gates>
//! OUTPUTS <output wire id>*
//! <left> <right> <output> <AND|XOR>
//! ...
//! ```
//!
//! The `OUTPUTS` line is this crate's own addition: the format sketch names
//! an output *count* but not which wires carry them, and a fold-to-constant
//! output (one that's just wire 0 or 1) can't be recovered from gate count
//! alone. See `DESIGN.md`.

use std::io::{BufRead, Write};

use rv32im_circuit::Circuit;

use crate::error::FmtError;
use crate::parsed::{self, ParsedCircuit, ParsedGate};

/// Writes `circuit` to `out` in flat format, gates in their original
/// emission order.
pub fn write_flat(circuit: &Circuit, mut out: impl Write) -> Result<(), FmtError> {
    tracing::debug!(gates = circuit.num_gates(), "writing flat gate list");
    writeln!(out, "# rv32im-ckt flat gate list")?;
    writeln!(out, "CIRCUIT_INPUTS {}", circuit.num_inputs())?;
    writeln!(out, "CIRCUIT_OUTPUTS {}", circuit.num_outputs())?;
    writeln!(out, "CIRCUIT_GATES {}", circuit.num_gates())?;
    write!(out, "OUTPUTS")?;
    for wire in circuit.output_wires() {
        write!(out, " {}", u32::from(*wire))?;
    }
    writeln!(out)?;
    for gate in circuit.gates() {
        writeln!(
            out,
            "{} {} {} {}",
            u32::from(gate.left()),
            u32::from(gate.right()),
            u32::from(gate.output()),
            parsed::kind_name(gate.kind())
        )?;
    }
    Ok(())
}

/// Reads a flat gate-list file back into a [`ParsedCircuit`].
pub fn read_flat(input: impl BufRead) -> Result<ParsedCircuit, FmtError> {
    let (num_inputs, num_outputs, outputs, declared_gates, body) = read_header(input)?;
    let mut gates = Vec::with_capacity(body.len());
    for (line_no, line) in body {
        let mut tokens = line.split_ascii_whitespace();
        let left = tokens.next().ok_or_else(|| header_error(line_no, "gate line missing its left operand"))?;
        let right = tokens.next().ok_or_else(|| header_error(line_no, "gate line missing its right operand"))?;
        let output = tokens.next().ok_or_else(|| header_error(line_no, "gate line missing its output wire"))?;
        let kind = tokens.next().ok_or_else(|| header_error(line_no, "gate line missing its AND/XOR kind"))?;
        gates.push(ParsedGate {
            left: parsed::parse_wire(line_no, left)?,
            right: parsed::parse_wire(line_no, right)?,
            output: parsed::parse_wire(line_no, output)?,
            kind: parsed::parse_kind(line_no, kind)?,
        });
    }

    if declared_gates != gates.len() {
        return Err(header_error(0, &format!("CIRCUIT_GATES declared {declared_gates} but the file holds {} gate lines", gates.len())));
    }

    Ok(ParsedCircuit { num_inputs, num_outputs, gates, outputs })
}

/// Parses the `CIRCUIT_INPUTS`/`CIRCUIT_OUTPUTS`/`CIRCUIT_GATES`/`OUTPUTS`
/// header block shared by both formats, returning the remaining non-header,
/// non-comment lines (numbered) for the caller to interpret as either bare
/// gate lines (flat) or `layer` blocks (layered).
pub(crate) fn read_header(input: impl BufRead) -> Result<(usize, usize, Vec<rv32im_circuit::WireId>, usize, Vec<(usize, String)>), FmtError> {
    let mut num_inputs = None;
    let mut num_outputs = None;
    let mut num_gates = None;
    let mut outputs = Vec::new();
    let mut body = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_ascii_whitespace();
        match tokens.next() {
            Some("CIRCUIT_INPUTS") => num_inputs = Some(parse_count(line_no, tokens.next())?),
            Some("CIRCUIT_OUTPUTS") => num_outputs = Some(parse_count(line_no, tokens.next())?),
            Some("CIRCUIT_GATES") => num_gates = Some(parse_count(line_no, tokens.next())?),
            Some("OUTPUTS") => {
                for token in tokens {
                    outputs.push(parsed::parse_wire(line_no, token)?);
                }
            }
            _ => body.push((line_no, line.to_string())),
        }
    }

    let num_inputs = num_inputs.ok_or_else(|| header_error(0, "missing CIRCUIT_INPUTS header"))?;
    let num_outputs = num_outputs.ok_or_else(|| header_error(0, "missing CIRCUIT_OUTPUTS header"))?;
    let num_gates = num_gates.ok_or_else(|| header_error(0, "missing CIRCUIT_GATES header"))?;

    Ok((num_inputs, num_outputs, outputs, num_gates, body))
}

fn parse_count(line: usize, token: Option<&str>) -> Result<usize, FmtError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| header_error(line, "expected an unsigned integer"))
}

pub(crate) fn header_error(line: usize, reason: &str) -> FmtError {
    FmtError::Malformed { line, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::{GateKind, WireId};

    fn sample_circuit() -> Circuit {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let a = WireId::from(2);
        let b = WireId::from(3);
        let x = circuit.emit_gate(a, b, GateKind::Xor);
        let y = circuit.emit_gate(a, x, GateKind::And);
        circuit.push_output(y);
        circuit
    }

    #[test]
    fn flat_round_trips_through_text() {
        let original = sample_circuit();
        let mut buf = Vec::new();
        write_flat(&original, &mut buf).unwrap();

        let parsed = read_flat(buf.as_slice()).unwrap();
        let rebuilt = parsed.into_circuit().unwrap();

        assert_eq!(original.gates(), rebuilt.gates());
        assert_eq!(original.output_wires(), rebuilt.output_wires());
    }

    #[test]
    fn a_gate_count_mismatch_is_rejected() {
        let text = "CIRCUIT_INPUTS 4\nCIRCUIT_OUTPUTS 1\nCIRCUIT_GATES 2\nOUTPUTS 5\n2 3 4 XOR\n";
        let err = read_flat(text.as_bytes()).unwrap_err();
        assert!(matches!(err, FmtError::Malformed { .. }));
    }
}
