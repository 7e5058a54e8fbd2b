//! The circuit arena: wire allocation and the append-only gate list.

use crate::error::CircuitError;
use crate::gate::{Gate, GateKind};
use crate::wire::WireId;

/// The platform cap on a circuit's input or output boundary width, in bits
/// (10 MiB).
pub const MAX_BOUNDARY_BITS: u64 = 10 * 1024 * 1024 * 8;

/// An append-only boolean circuit: a sequence of two-input gates over a fixed
/// input/output boundary.
///
/// Wires 0 and 1 are always reserved as input bits carrying the constants
/// `false` and `true`; every other gate's inputs must already be defined
/// before the gate referencing them is appended (invariant I1), and every
/// gate defines exactly one fresh wire (invariant I2).
#[derive(Debug)]
pub struct Circuit {
    gates: Vec<Gate>,
    next_wire_id: u32,
    num_inputs: usize,
    num_outputs: usize,
    outputs: Vec<WireId>,
    #[cfg(debug_assertions)]
    defined_outputs: nohash_hasher::IntSet<WireId>,
}

impl Circuit {
    /// Creates a new arena with `num_inputs` input bits (including the two
    /// reserved constant wires) and room for `num_outputs` output bits.
    ///
    /// Fails if either boundary exceeds [`MAX_BOUNDARY_BITS`].
    pub fn new(num_inputs: usize, num_outputs: usize) -> Result<Self, CircuitError> {
        assert!(
            num_inputs >= 2,
            "circuit must reserve wires 0 and 1 for the boolean constants"
        );
        Self::check_boundary(num_inputs as u64)?;
        Self::check_boundary(num_outputs as u64)?;

        tracing::trace!(num_inputs, num_outputs, "new circuit arena");
        Ok(Self {
            gates: Vec::new(),
            next_wire_id: num_inputs as u32,
            num_inputs,
            num_outputs,
            outputs: Vec::with_capacity(num_outputs),
            #[cfg(debug_assertions)]
            defined_outputs: nohash_hasher::IntSet::default(),
        })
    }

    fn check_boundary(bits: u64) -> Result<(), CircuitError> {
        if bits > MAX_BOUNDARY_BITS {
            return Err(CircuitError::CircuitTooLarge {
                requested_bits: bits,
                max_bits: MAX_BOUNDARY_BITS,
            });
        }
        Ok(())
    }

    /// The exact number of input bits this circuit was constructed with.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// The exact number of output bits this circuit was constructed with.
    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// The number of gates appended so far.
    #[inline]
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Borrows the gate at `idx`.
    #[inline]
    pub fn gate(&self, idx: usize) -> &Gate {
        &self.gates[idx]
    }

    /// Borrows the full gate list, in emission order.
    #[inline]
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// The total number of wires allocated, including the two reserved
    /// constants and every input bit.
    #[inline]
    pub fn num_wires(&self) -> u32 {
        self.next_wire_id
    }

    /// Allocates a fresh wire id without defining it.
    ///
    /// Used by callers that need the output id before they can construct the
    /// gate that defines it (e.g. forward references within a kernel); the
    /// common path is [`Circuit::emit_gate`], which allocates and appends in
    /// one step.
    #[inline]
    pub fn allocate_wire(&mut self) -> WireId {
        let id = WireId::from(self.next_wire_id);
        self.next_wire_id += 1;
        id
    }

    /// Allocates `n` consecutive fresh wire ids.
    pub fn allocate_wires(&mut self, n: usize) -> Vec<WireId> {
        (0..n).map(|_| self.allocate_wire()).collect()
    }

    /// Appends a gate with an already-allocated `output` wire.
    ///
    /// `output` must equal `next_wire_id - 1` at the moment of the call,
    /// i.e. it must be the most recently allocated, as-yet-undefined wire
    /// (invariant I2). Both `left` and `right` must already be defined
    /// (invariant I1).
    pub fn add_gate(&mut self, left: WireId, right: WireId, output: WireId, kind: GateKind) {
        debug_assert!(
            u32::from(left) < self.next_wire_id,
            "gate input {left} read before definition"
        );
        debug_assert!(
            u32::from(right) < self.next_wire_id,
            "gate input {right} read before definition"
        );
        debug_assert_eq!(
            u32::from(output),
            self.next_wire_id - 1,
            "gate output must be the most recently allocated wire"
        );
        debug_assert!(
            u32::from(output) as usize >= self.num_inputs,
            "gate must not redefine an input wire"
        );
        #[cfg(debug_assertions)]
        debug_assert!(
            self.defined_outputs.insert(output),
            "wire {output} defined by more than one gate"
        );

        self.gates.push(Gate::new(left, right, output, kind));
    }

    /// Allocates a fresh wire and appends the gate that defines it in one
    /// step. This is the path every kernel should use.
    #[inline]
    pub fn emit_gate(&mut self, left: WireId, right: WireId, kind: GateKind) -> WireId {
        let output = self.allocate_wire();
        self.add_gate(left, right, output, kind);
        output
    }

    /// Marks `wire` as one of the circuit's output bits, in order.
    pub fn push_output(&mut self, wire: WireId) {
        self.outputs.push(wire);
    }

    /// The wires marked as circuit outputs, in order.
    #[inline]
    pub fn output_wires(&self) -> &[WireId] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserves_constant_wires() {
        let c = Circuit::new(2, 1).unwrap();
        assert_eq!(c.num_wires(), 2);
        assert_eq!(u32::from(WireId::FALSE), 0);
        assert_eq!(u32::from(WireId::TRUE), 1);
    }

    #[test]
    fn emit_gate_allocates_and_appends() {
        let mut c = Circuit::new(2, 1).unwrap();
        let w = c.emit_gate(WireId::FALSE, WireId::TRUE, GateKind::Xor);
        assert_eq!(c.num_gates(), 1);
        assert_eq!(w, WireId::from(2));
        assert_eq!(c.gate(0).output(), w);
    }

    #[test]
    fn rejects_oversized_boundary() {
        let err = Circuit::new(2, (MAX_BOUNDARY_BITS + 1) as usize).unwrap_err();
        assert!(matches!(err, CircuitError::CircuitTooLarge { .. }));
    }

    #[test]
    #[should_panic(expected = "defined by more than one gate")]
    fn debug_build_catches_double_definition() {
        let mut c = Circuit::new(2, 1).unwrap();
        let out = c.allocate_wire();
        c.add_gate(WireId::FALSE, WireId::TRUE, out, GateKind::Xor);
        c.add_gate(WireId::FALSE, WireId::TRUE, out, GateKind::And);
    }
}
