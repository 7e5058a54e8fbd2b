//! Ripple-carry and sparse Kogge-Stone adders.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

/// Adds two `N`-bit operands with a carry-in, bit by bit.
///
/// 7 gates per bit (224 gates for `N = 32`): this is the lowerer's default
/// adder — fewer gates matter more than depth for this use case.
pub fn ripple_carry_add<const N: usize>(
    e: &mut Emitter<'_>,
    a: &[WireId; N],
    b: &[WireId; N],
    carry_in: WireId,
) -> ([WireId; N], WireId) {
    let mut sum = [WireId::FALSE; N];
    let mut carry = carry_in;
    for i in 0..N {
        let p = e.xor(a[i], b[i]);
        sum[i] = e.xor(p, carry);
        let g = e.and(a[i], b[i]);
        let pc = e.and(p, carry);
        carry = e.or(g, pc);
    }
    (sum, carry)
}

/// Local propagate/generate pair for one bit.
#[derive(Clone, Copy)]
struct PropGen {
    p: WireId,
    g: WireId,
}

fn combine(e: &mut Emitter<'_>, hi: PropGen, lo: PropGen) -> PropGen {
    // (p_h & p_l, g_h | (p_h & g_l))
    let p = e.and(hi.p, lo.p);
    let p_gl = e.and(hi.p, lo.g);
    let g = e.or(hi.g, p_gl);
    PropGen { p, g }
}

/// Adds two `N`-bit operands with a carry-in using a block-sparse
/// Kogge-Stone parallel-prefix adder: 4-bit blocks compute their sum by
/// local ripple assuming both a zero and a one carry-in, block-level
/// generate/propagate pairs are combined in `log2(N/4)` prefix levels, and
/// each block's final sum is selected by a single mux once its real
/// carry-in is known. Used where adder depth matters more than gate count
/// (e.g. the multiplier's final carry-propagate stage).
pub fn sparse_kogge_stone_add<const N: usize>(
    e: &mut Emitter<'_>,
    a: &[WireId; N],
    b: &[WireId; N],
    carry_in: WireId,
) -> ([WireId; N], WireId) {
    const BLOCK: usize = 4;
    assert_eq!(N % BLOCK, 0, "sparse adder requires a block-of-4 multiple width");
    let num_blocks = N / BLOCK;

    // Per-block sums/generate-propagate assuming a carry-in of 0 and of 1.
    let mut sum_cin0 = vec![[WireId::FALSE; BLOCK]; num_blocks];
    let mut sum_cin1 = vec![[WireId::FALSE; BLOCK]; num_blocks];
    let mut block_pg = vec![
        PropGen {
            p: WireId::FALSE,
            g: WireId::FALSE
        };
        num_blocks
    ];

    for blk in 0..num_blocks {
        let base = blk * BLOCK;
        let mut a_blk = [WireId::FALSE; BLOCK];
        let mut b_blk = [WireId::FALSE; BLOCK];
        a_blk.copy_from_slice(&a[base..base + BLOCK]);
        b_blk.copy_from_slice(&b[base..base + BLOCK]);

        let (s0, _) = ripple_carry_add(e, &a_blk, &b_blk, WireId::FALSE);
        let (s1, _) = ripple_carry_add(e, &a_blk, &b_blk, WireId::TRUE);
        sum_cin0[blk] = s0;
        sum_cin1[blk] = s1;

        // Block generate/propagate via the AOI formula over the 4 bit-level
        // pairs, MSB to LSB.
        let pg: Vec<PropGen> = (0..BLOCK)
            .map(|i| PropGen {
                p: e.xor(a_blk[i], b_blk[i]),
                g: e.and(a_blk[i], b_blk[i]),
            })
            .collect();
        let mut acc = pg[BLOCK - 1];
        for i in (0..BLOCK - 1).rev() {
            acc = combine(e, acc, pg[i]);
        }
        block_pg[blk] = acc;
    }

    // Parallel-prefix across blocks to get each block's real carry-in.
    // Inject the overall carry_in as block -1's virtual generate signal by
    // folding it into block 0's prefix directly below.
    let mut prefix = block_pg.clone();
    let mut stride = 1;
    while stride < num_blocks {
        let snapshot = prefix.clone();
        for blk in stride..num_blocks {
            prefix[blk] = combine(e, snapshot[blk], snapshot[blk - stride]);
        }
        stride *= 2;
    }

    let mut carry_in_of_block = vec![WireId::FALSE; num_blocks];
    carry_in_of_block[0] = carry_in;
    for blk in 1..num_blocks {
        // carry out of blocks [0, blk) given the true carry_in.
        let g = prefix[blk - 1].g;
        let p_and_cin = e.and(prefix[blk - 1].p, carry_in);
        carry_in_of_block[blk] = e.or(g, p_and_cin);
    }

    let mut sum = [WireId::FALSE; N];
    for blk in 0..num_blocks {
        let base = blk * BLOCK;
        for i in 0..BLOCK {
            sum[base + i] = e.mux(carry_in_of_block[blk], sum_cin0[blk][i], sum_cin1[blk][i]);
        }
    }

    let final_g = prefix[num_blocks - 1].g;
    let final_p_and_cin = e.and(prefix[num_blocks - 1].p, carry_in);
    let carry_out = e.or(final_g, final_p_and_cin);

    (sum, carry_out)
}
