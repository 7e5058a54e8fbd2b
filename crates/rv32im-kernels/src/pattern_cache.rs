//! Memoization over common multi-gate shapes (e.g. "a 32-bit adder whose 64
//! input wires match a prior call").

use std::collections::HashMap;

use rv32im_circuit::WireId;

use crate::fnv::FnvBuildHasher;

/// Caches the output wires of a named multi-gate shape, keyed by the exact
/// tuple of input wires it was built from.
pub struct PatternCache {
    table: HashMap<(&'static str, Vec<WireId>), Vec<WireId>, FnvBuildHasher>,
}

impl PatternCache {
    pub(crate) fn new() -> Self {
        Self {
            table: HashMap::default(),
        }
    }

    /// Looks up a cached shape's outputs, if any.
    pub(crate) fn get<const N: usize>(&self, shape: &'static str, inputs: &[WireId]) -> Option<[WireId; N]> {
        let hit = self.table.get(&(shape, inputs.to_vec()))?;
        debug_assert_eq!(hit.len(), N);
        let mut out = [WireId::FALSE; N];
        out.copy_from_slice(hit);
        Some(out)
    }

    /// Records a shape's outputs under `shape` and `inputs`.
    pub(crate) fn insert(&mut self, shape: &'static str, inputs: &[WireId], outputs: &[WireId]) {
        self.table
            .insert((shape, inputs.to_vec()), outputs.to_vec());
    }
}
