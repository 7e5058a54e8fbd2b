//! The format-agnostic result of reading a gate-list file back in: enough to
//! replay the gates into a fresh [`rv32im_circuit::Circuit`] without needing
//! to know which of the two on-disk shapes produced it.

use rv32im_circuit::{Circuit, GateKind, WireId};

use crate::error::FmtError;

/// One gate as read off disk: its kind plus the three wire ids a line names.
#[derive(Debug, Clone, Copy)]
pub struct ParsedGate {
    pub left: WireId,
    pub right: WireId,
    pub output: WireId,
    pub kind: GateKind,
}

/// A circuit read back from either format, gates always in ascending
/// `output` order regardless of how the file stored them — the layered
/// format groups gates by layer, not by wire id, so the reader sorts before
/// replay to satisfy the arena's "most recently allocated wire" invariant.
#[derive(Debug)]
pub struct ParsedCircuit {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub gates: Vec<ParsedGate>,
    pub outputs: Vec<WireId>,
}

impl ParsedCircuit {
    /// Replays the parsed gates into a fresh arena, in ascending output
    /// order. Caller-visible failures (a gate output that isn't the next
    /// fresh wire, an input read before definition) surface as the arena's
    /// own debug assertions rather than a second validation pass here — a
    /// malformed file is a programmer bug in whatever wrote it, not
    /// something this crate tries to recover from.
    pub fn into_circuit(mut self) -> Result<Circuit, FmtError> {
        self.gates.sort_by_key(|g| u32::from(g.output));
        let mut circuit = Circuit::new(self.num_inputs, self.num_outputs)?;
        for gate in &self.gates {
            let allocated = circuit.allocate_wire();
            if allocated != gate.output {
                return Err(FmtError::Malformed {
                    line: 0,
                    reason: format!("gate output {} is not the next fresh wire (expected {allocated})", gate.output),
                });
            }
            circuit.add_gate(gate.left, gate.right, gate.output, gate.kind);
        }
        for wire in self.outputs {
            circuit.push_output(wire);
        }
        Ok(circuit)
    }
}

pub(crate) fn parse_wire(line: usize, token: &str) -> Result<WireId, FmtError> {
    token
        .parse::<u32>()
        .map(WireId::from)
        .map_err(|_| FmtError::Malformed { line, reason: format!("expected a wire id, got {token:?}") })
}

pub(crate) fn parse_kind(line: usize, token: &str) -> Result<GateKind, FmtError> {
    match token {
        "AND" => Ok(GateKind::And),
        "XOR" => Ok(GateKind::Xor),
        other => Err(FmtError::Malformed { line, reason: format!("expected AND or XOR, got {other:?}") }),
    }
}

pub(crate) fn kind_name(kind: GateKind) -> &'static str {
    match kind {
        GateKind::And => "AND",
        GateKind::Xor => "XOR",
    }
}
