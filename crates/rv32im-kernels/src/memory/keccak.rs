//! A from-scratch Keccak-f[1600] permutation and SHA3-256 sponge, built
//! purely from AND/XOR gates, for the `Secure` memory tier's Merkle node
//! hashing.
//!
//! The state is 25 64-bit lanes, indexed `state[x + 5*y]` (`x`, `y` in
//! `0..5`), each lane LSB-first. `sha3_256` only ever hashes short,
//! byte-aligned, single-block messages (Merkle leaves and node pairs, both
//! well under the 1088-bit rate), so it implements the simplified
//! byte-aligned form of SHA3's `pad10*1` padding — append `0x06`, zero-fill,
//! OR `0x80` into the last rate byte — rather than the general bit-level
//! padding rule.

use rv32im_circuit::WireId;

use crate::emitter::Emitter;

const LANES: usize = 25;
const LANE_BITS: usize = 64;
/// SHA3-256 rate: 1088 bits = 17 lanes.
const RATE_LANES: usize = 17;
const RATE_BYTES: usize = RATE_LANES * LANE_BITS / 8;
const ROUNDS: usize = 24;

type Lane = [WireId; LANE_BITS];
type State = [Lane; LANES];

/// A SHA3-256 output.
pub type Digest = [WireId; 256];

const ROUND_CONSTANTS: [u64; ROUNDS] = [
    0x0000_0000_0000_0001,
    0x0000_0000_0000_8082,
    0x8000_0000_0000_808A,
    0x8000_0000_8000_8000,
    0x0000_0000_0000_808B,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8009,
    0x0000_0000_0000_008A,
    0x0000_0000_0000_0088,
    0x0000_0000_8000_8009,
    0x0000_0000_8000_000A,
    0x0000_0000_8000_808B,
    0x8000_0000_0000_008B,
    0x8000_0000_0000_8089,
    0x8000_0000_0000_8003,
    0x8000_0000_0000_8002,
    0x8000_0000_0000_0080,
    0x0000_0000_0000_800A,
    0x8000_0000_8000_000A,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8080,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8008,
];

/// Rotation offsets `r[x][y]`, the standard Keccak table.
const ROTATION: [[u32; 5]; 5] = [
    [0, 1, 62, 28, 27],
    [36, 44, 6, 55, 20],
    [3, 10, 43, 25, 39],
    [41, 45, 15, 21, 8],
    [18, 2, 61, 56, 14],
];

#[inline]
fn idx(x: usize, y: usize) -> usize {
    (x % 5) + 5 * (y % 5)
}

fn zero_lane() -> Lane {
    [WireId::FALSE; LANE_BITS]
}

fn xor_lane(e: &mut Emitter<'_>, a: &Lane, b: &Lane) -> Lane {
    std::array::from_fn(|i| e.xor(a[i], b[i]))
}

fn rotl(lane: &Lane, n: u32) -> Lane {
    let n = (n as usize) % LANE_BITS;
    std::array::from_fn(|i| lane[(i + LANE_BITS - n) % LANE_BITS])
}

fn constant_lane(value: u64) -> Lane {
    std::array::from_fn(|i| WireId::constant((value >> i) & 1 == 1))
}

fn theta(e: &mut Emitter<'_>, state: &State) -> State {
    let c: [Lane; 5] = std::array::from_fn(|x| {
        let mut acc = state[idx(x, 0)];
        for y in 1..5 {
            acc = xor_lane(e, &acc, &state[idx(x, y)]);
        }
        acc
    });

    let d: [Lane; 5] = std::array::from_fn(|x| {
        let left = c[(x + 4) % 5];
        let right = rotl(&c[(x + 1) % 5], 1);
        xor_lane(e, &left, &right)
    });

    std::array::from_fn(|i| {
        let x = i % 5;
        xor_lane(e, &state[i], &d[x])
    })
}

fn rho_pi(state: &State) -> State {
    let mut out = [zero_lane(); LANES];
    for x in 0..5 {
        for y in 0..5 {
            let rotated = rotl(&state[idx(x, y)], ROTATION[x][y]);
            let (new_x, new_y) = (y, (2 * x + 3 * y) % 5);
            out[idx(new_x, new_y)] = rotated;
        }
    }
    out
}

fn chi(e: &mut Emitter<'_>, state: &State) -> State {
    std::array::from_fn(|i| {
        let x = i % 5;
        let y = i / 5;
        let not_next: Lane = std::array::from_fn(|b| e.not(state[idx(x + 1, y)][b]));
        let and_next_next = {
            let after = state[idx(x + 2, y)];
            let mut lane = zero_lane();
            for b in 0..LANE_BITS {
                lane[b] = e.and(not_next[b], after[b]);
            }
            lane
        };
        xor_lane(e, &state[i], &and_next_next)
    })
}

fn iota(e: &mut Emitter<'_>, state: &State, round: usize) -> State {
    let mut out = *state;
    out[idx(0, 0)] = xor_lane(e, &state[idx(0, 0)], &constant_lane(ROUND_CONSTANTS[round]));
    out
}

/// Applies the full 24-round Keccak-f[1600] permutation to `state`.
pub fn keccak_f1600(e: &mut Emitter<'_>, state: &State) -> State {
    let mut current = *state;
    for round in 0..ROUNDS {
        current = theta(e, &current);
        current = rho_pi(&current);
        current = chi(e, &current);
        current = iota(e, &current, round);
    }
    current
}

/// Hashes `input_bits` (a byte-aligned message strictly shorter than the
/// 1088-bit rate) to 256 bits via a single-block SHA3-256 sponge
/// application: absorb the padded rate, permute, squeeze the first 256
/// bits.
pub fn sha3_256(e: &mut Emitter<'_>, input_bits: &[WireId]) -> Digest {
    assert!(input_bits.len() % 8 == 0, "message must be byte-aligned");
    let input_bytes = input_bits.len() / 8;
    assert!(input_bytes < RATE_BYTES, "message must fit in a single SHA3-256 block");

    let mut block = vec![WireId::FALSE; RATE_BYTES * 8];
    block[..input_bits.len()].copy_from_slice(input_bits);
    // Domain-separated pad10*1, byte-aligned form: 0x06 right after the
    // message, zero fill, then OR 0x80 into the last rate byte.
    block[input_bytes * 8] = WireId::TRUE; // 0x06 bit0
    block[input_bytes * 8 + 1] = WireId::FALSE;
    block[input_bytes * 8 + 2] = WireId::TRUE;
    for bit in (input_bytes * 8 + 3)..(RATE_BYTES * 8 - 1) {
        block[bit] = WireId::FALSE;
    }
    let last_bit = RATE_BYTES * 8 - 1;
    block[last_bit] = WireId::TRUE;

    let mut state = [zero_lane(); LANES];
    for lane_idx in 0..RATE_LANES {
        let lane_bits: Lane = std::array::from_fn(|b| block[lane_idx * LANE_BITS + b]);
        state[lane_idx] = xor_lane(e, &state[lane_idx], &lane_bits);
    }

    let permuted = keccak_f1600(e, &state);

    let mut out = [WireId::FALSE; 256];
    for lane_idx in 0..4 {
        for b in 0..LANE_BITS {
            out[lane_idx * LANE_BITS + b] = permuted[lane_idx][b];
        }
    }
    out
}
