//! The `Secure` tier: a binary Merkle tree over `2^LEVELS` 32-bit leaves,
//! authenticated with the [`super::keccak`] SHA3-256 circuit.
//!
//! Unlike [`super::ultra`] and [`super::simple`], whose address is a live
//! wire array evaluated however the register file resolves at runtime, this
//! tier only supports **compile-time-constant** addresses. A symbolic
//! (register-indexed) address into a `2^20`-leaf tree would need the
//! sibling hash at each of the 20 levels to depend on every leaf under that
//! sibling subtree, which can only be expressed affordably in a
//! combinational circuit by taking the Merkle proof as an auxiliary,
//! externally-supplied witness input — a wire-layout extension this crate
//! doesn't implement. Fixing the address at compile time instead lets the
//! path be resolved directly against the Rust-level tree state, so each
//! access costs exactly `LEVELS` SHA3-256 applications (~3.9M gates at
//! `LEVELS = 20`) rather than re-verifying a witness. See the design notes
//! on the Secure tier's scope.
use rv32im_circuit::WireId;

use super::keccak::{sha3_256, Digest};
use super::MemoryTier;
use crate::emitter::Emitter;

/// The production tree depth named by the memory subsystem: `2^20` leaves.
pub const PRODUCTION_LEVELS: usize = 20;

/// A Merkle-authenticated memory of `2^LEVELS` 32-bit words.
pub struct SecureMemory<const LEVELS: usize> {
    leaves: Vec<[WireId; 32]>,
    /// `levels[0]` holds the `2^LEVELS` leaf digests; `levels[k]` holds the
    /// `2^(LEVELS-k)` digests one layer up; `levels[LEVELS]` is the
    /// single-element root layer.
    levels: Vec<Vec<Digest>>,
}

impl<const LEVELS: usize> SecureMemory<LEVELS> {
    /// Builds the tree from `initial` leaves, hashing every level bottom-up.
    /// This is a one-time setup cost, not part of any single access.
    pub fn new(e: &mut Emitter<'_>, initial: Vec<[WireId; 32]>) -> Self {
        assert_eq!(initial.len(), 1 << LEVELS, "must supply exactly 2^LEVELS leaves");
        tracing::debug!(levels = LEVELS, leaves = initial.len(), "building secure memory tree");

        let leaf_digests: Vec<Digest> = initial.iter().map(|word| sha3_256(e, word)).collect();
        let mut levels = vec![leaf_digests];
        for level in 0..LEVELS {
            let prev = &levels[level];
            let next: Vec<Digest> = prev
                .chunks_exact(2)
                .map(|pair| node_hash(e, &pair[0], &pair[1]))
                .collect();
            levels.push(next);
        }

        Self { leaves: initial, levels }
    }

    /// Reads (and optionally writes) the word at the compile-time-constant
    /// `address`. Panics if `address` isn't made up of the two reserved
    /// constant wires end to end (see the module docs).
    pub fn access(
        &mut self,
        e: &mut Emitter<'_>,
        address: &[WireId; 32],
        write_data: &[WireId; 32],
        write_enable: WireId,
    ) -> [WireId; 32] {
        let index = concrete_address::<LEVELS>(address);
        tracing::trace!(index, levels = LEVELS, "secure memory access: walking authenticated path");
        let old_value = self.leaves[index];

        let new_value: [WireId; 32] = std::array::from_fn(|b| e.mux(write_enable, old_value[b], write_data[b]));
        self.leaves[index] = new_value;

        self.levels[0][index] = sha3_256(e, &new_value);
        let mut node = index;
        for level in 0..LEVELS {
            let parent = node / 2;
            let sibling = node ^ 1;
            let (left, right) = if node % 2 == 0 {
                (self.levels[level][node], self.levels[level][sibling])
            } else {
                (self.levels[level][sibling], self.levels[level][node])
            };
            self.levels[level + 1][parent] = node_hash(e, &left, &right);
            node = parent;
        }

        old_value
    }

    /// The current Merkle root, for a caller that wants to bind memory
    /// state into the circuit's output boundary.
    pub fn root(&self) -> Digest {
        self.levels[LEVELS][0]
    }
}

impl<const LEVELS: usize> MemoryTier for SecureMemory<LEVELS> {
    fn access(
        &mut self,
        e: &mut Emitter<'_>,
        address: &[WireId; 32],
        write_data: &[WireId; 32],
        write_enable: WireId,
    ) -> [WireId; 32] {
        SecureMemory::access(self, e, address, write_data, write_enable)
    }
}

fn node_hash(e: &mut Emitter<'_>, left: &Digest, right: &Digest) -> Digest {
    let combined: [WireId; 512] = std::array::from_fn(|i| if i < 256 { left[i] } else { right[i - 256] });
    sha3_256(e, &combined)
}

fn concrete_address<const LEVELS: usize>(address: &[WireId; 32]) -> usize {
    let mut index = 0usize;
    for (bit, &wire) in address.iter().enumerate().take(LEVELS) {
        let value = if wire == WireId::TRUE {
            true
        } else if wire == WireId::FALSE {
            false
        } else {
            panic!("SecureMemory requires a compile-time-constant address; bit {bit} is a symbolic wire");
        };
        if value {
            index |= 1 << bit;
        }
    }
    for (bit, &wire) in address.iter().enumerate().skip(LEVELS) {
        assert_eq!(wire, WireId::FALSE, "address bit {bit} exceeds the tree's {LEVELS}-bit domain");
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv32im_circuit::Circuit;

    const TEST_LEVELS: usize = 3; // 8-leaf tree, small enough to evaluate directly.

    fn const_word(value: u32) -> [WireId; 32] {
        std::array::from_fn(|b| WireId::constant((value >> b) & 1 == 1))
    }

    fn const_address(index: usize) -> [WireId; 32] {
        std::array::from_fn(|b| WireId::constant((index >> b) & 1 == 1))
    }

    fn eval32(circuit: &Circuit, out: &[WireId; 32]) -> u32 {
        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        let mut result = 0u32;
        for (i, &w) in out.iter().enumerate() {
            if values[u32::from(w) as usize] {
                result |= 1 << i;
            }
        }
        result
    }

    #[test]
    fn reads_back_seeded_leaf() {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let leaves: Vec<[WireId; 32]> = (0..1 << TEST_LEVELS).map(|i| const_word(i as u32 * 10)).collect();
        let mut mem = SecureMemory::<TEST_LEVELS>::new(&mut e, leaves);
        let addr = const_address(3);
        let out = mem.access(&mut e, &addr, &[WireId::FALSE; 32], WireId::FALSE);
        assert_eq!(eval32(&circuit, &out), 30);
    }

    #[test]
    fn write_then_read_updates_leaf_and_root() {
        let mut circuit = Circuit::new(2, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let leaves: Vec<[WireId; 32]> = (0..1 << TEST_LEVELS).map(|_| const_word(0)).collect();
        let mut mem = SecureMemory::<TEST_LEVELS>::new(&mut e, leaves);
        let root_before = mem.root();

        let addr = const_address(5);
        let new_value = const_word(0xABCD_EF01);
        mem.access(&mut e, &addr, &new_value, WireId::TRUE);
        let out = mem.access(&mut e, &addr, &[WireId::FALSE; 32], WireId::FALSE);
        assert_eq!(eval32(&circuit, &out), 0xABCD_EF01);

        let root_after = mem.root();
        let bits_before: Vec<bool> = root_before.iter().map(|&w| values_of(&circuit, w)).collect();
        let bits_after: Vec<bool> = root_after.iter().map(|&w| values_of(&circuit, w)).collect();
        assert_ne!(bits_before, bits_after, "writing a leaf must change the root");
    }

    fn values_of(circuit: &Circuit, w: WireId) -> bool {
        let mut values = vec![false; circuit.num_wires() as usize];
        values[1] = true;
        for gate in circuit.gates() {
            let l = values[u32::from(gate.left()) as usize];
            let r = values[u32::from(gate.right()) as usize];
            values[u32::from(gate.output()) as usize] = gate.kind().eval(l, r);
        }
        values[u32::from(w) as usize]
    }

    #[test]
    #[should_panic(expected = "compile-time-constant")]
    fn symbolic_address_is_rejected() {
        let mut circuit = Circuit::new(4, 32).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let leaves: Vec<[WireId; 32]> = (0..1 << TEST_LEVELS).map(|_| const_word(0)).collect();
        let mut mem = SecureMemory::<TEST_LEVELS>::new(&mut e, leaves);
        let mut addr = const_address(0);
        addr[0] = WireId::from(2); // a symbolic, non-constant wire
        mem.access(&mut e, &addr, &[WireId::FALSE; 32], WireId::FALSE);
    }
}
