//! Raw compression functions and the block compressor built on them.
//!
//! Three well-studied primitives rotate per block: reduced-round AES,
//! the SHA-256 compression function and a 7-round BLAKE3 compression. Each
//! maps a 32-byte chaining state and a 64-byte message chunk to a new state.
//! None of them needs to be collision-resistant on its own; iterated through
//! the chaining state they are mixing-sufficient, and the rotation keeps any
//! single-primitive hardware pipeline from covering the whole fill.

use aes::hazmat::cipher_round;
use aes::Block as AesBlock;

use crate::params::{BLOCK_SIZE, CHUNKS_PER_BLOCK, CHUNK_SIZE, STATE_SIZE, VERSION};

/// Fibonacci hashing constant, folded into the positional metadata chunk
const GOLDEN_RATIO: u64 = 0x9E3779B97F4A7C15;

/// Reduced-round AES: four `AESENC` rounds on each 16-byte half of the
/// state, with round keys drawn from the message chunk. The high half uses
/// the keys rotated by two so the halves diverge.
#[inline]
pub fn aes_mix(state: &[u8; STATE_SIZE], chunk: &[u8; CHUNK_SIZE]) -> [u8; STATE_SIZE] {
    let keys: [AesBlock; 4] = [
        AesBlock::clone_from_slice(&chunk[0..16]),
        AesBlock::clone_from_slice(&chunk[16..32]),
        AesBlock::clone_from_slice(&chunk[32..48]),
        AesBlock::clone_from_slice(&chunk[48..64]),
    ];

    let mut lo = AesBlock::clone_from_slice(&state[0..16]);
    let mut hi = AesBlock::clone_from_slice(&state[16..32]);

    cipher_round(&mut lo, &keys[0]);
    cipher_round(&mut lo, &keys[1]);
    cipher_round(&mut lo, &keys[2]);
    cipher_round(&mut lo, &keys[3]);

    cipher_round(&mut hi, &keys[2]);
    cipher_round(&mut hi, &keys[3]);
    cipher_round(&mut hi, &keys[0]);
    cipher_round(&mut hi, &keys[1]);

    let mut out = [0u8; STATE_SIZE];
    out[0..16].copy_from_slice(lo.as_slice());
    out[16..32].copy_from_slice(hi.as_slice());
    out
}

/// SHA-256 compression function over one 64-byte chunk.
#[inline]
pub fn sha256_mix(state: &[u8; STATE_SIZE], chunk: &[u8; CHUNK_SIZE]) -> [u8; STATE_SIZE] {
    let mut words = [0u32; 8];
    for (i, w) in words.iter_mut().enumerate() {
        *w = u32::from_be_bytes(state[i * 4..i * 4 + 4].try_into().unwrap());
    }

    let mut msg = [0u8; CHUNK_SIZE];
    msg.copy_from_slice(chunk);
    sha2::compress256(&mut words, &[msg.into()]);

    let mut out = [0u8; STATE_SIZE];
    for (i, w) in words.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&w.to_be_bytes());
    }
    out
}

/// BLAKE3 initialization vector
const IV: [u32; 8] = [
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

/// BLAKE3 message word schedule, one row per round
const MSG_SCHEDULE: [[usize; 16]; 7] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

/// BLAKE3 quarter-round
#[inline(always)]
fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, mx: u32, my: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(mx);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(my);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

/// 7-round BLAKE3 compression over one 64-byte chunk.
#[inline]
pub fn blake3_mix(state: &[u8; STATE_SIZE], chunk: &[u8; CHUNK_SIZE]) -> [u8; STATE_SIZE] {
    let mut h = [0u32; 8];
    for (i, w) in h.iter_mut().enumerate() {
        *w = u32::from_le_bytes(state[i * 4..i * 4 + 4].try_into().unwrap());
    }

    let mut m = [0u32; 16];
    for (i, w) in m.iter_mut().enumerate() {
        *w = u32::from_le_bytes(chunk[i * 4..i * 4 + 4].try_into().unwrap());
    }

    let mut v = [0u32; 16];
    v[0..8].copy_from_slice(&h);
    v[8..16].copy_from_slice(&IV);

    for s in &MSG_SCHEDULE {
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] = v[i] ^ v[i + 8];
    }

    let mut out = [0u8; STATE_SIZE];
    for (i, w) in h.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    out
}

#[inline(always)]
fn mix(primitive: usize, state: &[u8; STATE_SIZE], chunk: &[u8; CHUNK_SIZE]) -> [u8; STATE_SIZE] {
    match primitive {
        0 => aes_mix(state, chunk),
        1 => sha256_mix(state, chunk),
        _ => blake3_mix(state, chunk),
    }
}

/// Positional metadata chunk: seeds the chaining state so the same
/// predecessor pair compresses differently at every (pass, lane, index).
#[inline]
fn metadata_chunk(pass: u32, lane: u32, index: u64) -> [u8; CHUNK_SIZE] {
    let mut md = [0u8; CHUNK_SIZE];
    md[0..8].copy_from_slice(&(pass as u64).to_le_bytes());
    md[8..16].copy_from_slice(&(lane as u64).to_le_bytes());
    md[16..24].copy_from_slice(&index.to_le_bytes());
    md[24..32].copy_from_slice(&GOLDEN_RATIO.to_le_bytes());
    md[32..40].copy_from_slice(&(BLOCK_SIZE as u64).to_le_bytes());
    md[40] = VERSION;
    md
}

/// Produce one block from its two predecessors and its position.
///
/// The chaining state starts from the positional metadata, then absorbs the
/// predecessors chunk by chunk; every 32 bytes of output is a snapshot of
/// the chain, so the whole block depends on both predecessors in full.
pub fn compress_block(
    pred1: &[u8],
    pred2: &[u8],
    pass: u32,
    lane: u32,
    index: u64,
    out: &mut [u8; BLOCK_SIZE],
) {
    debug_assert_eq!(pred1.len(), BLOCK_SIZE);
    debug_assert_eq!(pred2.len(), BLOCK_SIZE);

    let mut state = blake3_mix(&[0u8; STATE_SIZE], &metadata_chunk(pass, lane, index));
    let primitive = ((pass as u64 + lane as u64 + index) % 3) as usize;

    for j in 0..CHUNKS_PER_BLOCK {
        let offset = j * CHUNK_SIZE;
        let c1: &[u8; CHUNK_SIZE] = pred1[offset..offset + CHUNK_SIZE].try_into().unwrap();
        state = mix(primitive, &state, c1);
        out[offset..offset + STATE_SIZE].copy_from_slice(&state);

        let c2: &[u8; CHUNK_SIZE] = pred2[offset..offset + CHUNK_SIZE].try_into().unwrap();
        state = mix(primitive, &state, c2);
        out[offset + STATE_SIZE..offset + CHUNK_SIZE].copy_from_slice(&state);
    }
}
