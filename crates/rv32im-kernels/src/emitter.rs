//! Structural deduplication and pattern caching over a [`Circuit`].
//!
//! Kernels never touch a [`Circuit`] directly: they go through an
//! [`Emitter`], which normalizes commutative inputs, collapses identical
//! gates, and memoizes whole multi-gate shapes (e.g. "a 32-bit adder over
//! these exact 64 input wires") via the [`crate::pattern_cache::PatternCache`].

use ahash::HashMap;
use rv32im_circuit::{Circuit, GateKind, WireId};

use crate::pattern_cache::PatternCache;

/// Wraps a [`Circuit`] with the gate deduplicator and pattern cache.
///
/// Both caches are per-instance (see the design notes on global mutable
/// caches): they live exactly as long as the `Emitter`, which in turn lives
/// exactly as long as the compiler session that owns the circuit.
pub struct Emitter<'c> {
    circuit: &'c mut Circuit,
    dedup: Option<HashMap<(WireId, WireId, u8), WireId>>,
    pattern_cache: Option<PatternCache>,
}

impl<'c> Emitter<'c> {
    /// Wraps `circuit`, enabling or disabling each cache per the compiler's
    /// configuration.
    pub fn new(circuit: &'c mut Circuit, enable_deduplication: bool, enable_caching: bool) -> Self {
        Self {
            circuit,
            dedup: enable_deduplication.then(HashMap::default),
            pattern_cache: enable_caching.then(PatternCache::new),
        }
    }

    /// The wrapped circuit, for read-only inspection.
    #[inline]
    pub fn circuit(&self) -> &Circuit {
        self.circuit
    }

    /// The wrapped circuit, mutably, for callers that need access below the
    /// emitter (e.g. marking outputs).
    #[inline]
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        self.circuit
    }

    /// Whether the pattern cache is enabled for this emitter.
    #[inline]
    pub fn caching_enabled(&self) -> bool {
        self.pattern_cache.is_some()
    }

    /// Requests a two-input gate, deduplicating against prior gates of the
    /// same normalized shape.
    ///
    /// Both AND and XOR are commutative, so inputs are sorted before the
    /// dedup table is consulted; this alone collapses `gate(a,b)` and
    /// `gate(b,a)` onto one gate.
    pub fn gate(&mut self, left: WireId, right: WireId, kind: GateKind) -> WireId {
        let (left, right) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };

        if let Some(folded) = fold_constant(left, right, kind) {
            return folded;
        }

        if let Some(table) = &self.dedup {
            let key = (left, right, kind.code());
            if let Some(&existing) = table.get(&key) {
                return existing;
            }
        }

        let out = self.circuit.emit_gate(left, right, kind);

        if let Some(table) = &mut self.dedup {
            table.insert((left, right, kind.code()), out);
        }

        out
    }

    /// `left AND right`.
    #[inline]
    pub fn and(&mut self, left: WireId, right: WireId) -> WireId {
        self.gate(left, right, GateKind::And)
    }

    /// `left XOR right`.
    #[inline]
    pub fn xor(&mut self, left: WireId, right: WireId) -> WireId {
        self.gate(left, right, GateKind::Xor)
    }

    /// `NOT a`, as `a XOR true`. Zero gates if `a` is already a constant.
    #[inline]
    pub fn not(&mut self, a: WireId) -> WireId {
        self.xor(a, WireId::TRUE)
    }

    /// `left OR right`, via `(a XOR b) XOR (a AND b)` (3 gates, or fewer
    /// after deduplication against a sibling XOR/AND already in the
    /// circuit).
    pub fn or(&mut self, left: WireId, right: WireId) -> WireId {
        let x = self.xor(left, right);
        let a = self.and(left, right);
        self.xor(x, a)
    }

    /// `sel ? on_true : on_false`, as `(NOT sel AND on_false) XOR (sel AND
    /// on_true)` (4 gates).
    pub fn mux(&mut self, sel: WireId, on_false: WireId, on_true: WireId) -> WireId {
        if on_false == on_true {
            return on_false;
        }
        let not_sel = self.not(sel);
        let low = self.and(not_sel, on_false);
        let high = self.and(sel, on_true);
        self.xor(low, high)
    }

    /// Runs `f` to compute a multi-gate shape, but first checks (and, on a
    /// miss, records) the pattern cache keyed by `shape` and `inputs`.
    pub fn cached<const N: usize>(
        &mut self,
        shape: &'static str,
        inputs: &[WireId],
        f: impl FnOnce(&mut Self) -> [WireId; N],
    ) -> [WireId; N] {
        if self.pattern_cache.is_some()
            && let Some(hit) = self
                .pattern_cache
                .as_ref()
                .unwrap()
                .get::<N>(shape, inputs)
        {
            return hit;
        }

        let out = f(self);

        if let Some(cache) = &mut self.pattern_cache {
            cache.insert(shape, inputs, &out);
        }

        out
    }
}

/// Folds a gate whose (normalized, so possibly-constant) `left` operand is
/// one of the two reserved constant wires, avoiding emitting a gate at all.
/// Mirrors the zero-gate constant wiring the lowerer relies on for LUI and
/// immediate sign-extension.
fn fold_constant(left: WireId, right: WireId, kind: GateKind) -> Option<WireId> {
    if left != WireId::FALSE && left != WireId::TRUE {
        return None;
    }
    let left_is_true = left == WireId::TRUE;
    match kind {
        GateKind::And => Some(if left_is_true { right } else { WireId::FALSE }),
        GateKind::Xor => {
            if !left_is_true {
                Some(right)
            } else if right == WireId::TRUE {
                Some(WireId::FALSE)
            } else if right == WireId::FALSE {
                Some(WireId::TRUE)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_collapses_identical_gates() {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let a = WireId::from(2);
        let b = WireId::from(3);
        let w1 = e.and(a, b);
        let w2 = e.and(b, a); // commuted, should collapse
        let w3 = e.and(a, b); // identical, should collapse
        assert_eq!(w1, w2);
        assert_eq!(w1, w3);
        assert_eq!(circuit.num_gates(), 1);
    }

    #[test]
    fn dedup_disabled_emits_every_gate() {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let mut e = Emitter::new(&mut circuit, false, false);
        let a = WireId::from(2);
        let b = WireId::from(3);
        e.and(a, b);
        e.and(a, b);
        assert_eq!(circuit.num_gates(), 2);
    }

    #[test]
    fn constant_folding_avoids_gates() {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let a = WireId::from(2);
        assert_eq!(e.and(WireId::TRUE, a), a);
        assert_eq!(e.and(WireId::FALSE, a), WireId::FALSE);
        assert_eq!(e.xor(WireId::FALSE, a), a);
        assert_eq!(circuit.num_gates(), 0);
    }

    #[test]
    fn mux_selects_correct_branch() {
        let mut circuit = Circuit::new(4, 1).unwrap();
        let mut e = Emitter::new(&mut circuit, true, true);
        let a = WireId::from(2);
        let b = WireId::from(3);
        let m = e.mux(WireId::FALSE, a, b);
        assert_eq!(m, a, "sel=false should pick on_false with zero gates");
    }
}
