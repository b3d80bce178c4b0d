//! Seed and digest expansion.
//!
//! Both ends of the pipeline use the same extendable-output construction: a
//! BLAKE3 hasher over a domain string and a length-prefixed encoding of its
//! inputs, read out through the XOF. The XOF gives the counter-based
//! expansion needed for outputs wider than the 32-byte compression width.

use crate::params::{Params, BLOCK_SIZE, SEED_BLOCKS_PER_LANE, VERSION};

const SEED_DOMAIN: &[u8] = b"ashmaize.seed.v1";
const DIGEST_DOMAIN: &[u8] = b"ashmaize.out.v1";

/// Fold the cost parameters into a hasher. Any parameter change changes the
/// stream, so digests produced under different costs never collide by
/// construction.
fn absorb_params(hasher: &mut blake3::Hasher, params: &Params) {
    hasher.update(&[VERSION]);
    hasher.update(&params.memory_cost_blocks.to_le_bytes());
    hasher.update(&params.time_cost.to_le_bytes());
    hasher.update(&params.lanes.to_le_bytes());
    hasher.update(&params.digest_length.to_le_bytes());
}

/// Expand `secret` and `salt` into the initial pseudorandom stream: exactly
/// enough bytes to seed the first two blocks of every lane.
///
/// Pure function: identical inputs always yield an identical stream. The
/// length prefixes keep `("ab", "c")` and `("a", "bc")` apart.
pub fn expand_seed(secret: &[u8], salt: &[u8], params: &Params) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(SEED_DOMAIN);
    absorb_params(&mut hasher, params);
    hasher.update(&(secret.len() as u64).to_le_bytes());
    hasher.update(secret);
    hasher.update(&(salt.len() as u64).to_le_bytes());
    hasher.update(salt);

    let len = SEED_BLOCKS_PER_LANE as usize * params.lanes as usize * BLOCK_SIZE;
    let mut stream = vec![0u8; len];
    hasher.finalize_xof().fill(&mut stream);
    stream
}

/// Expand the finalizer accumulator to the requested digest length.
pub fn expand_digest(accumulator: &[u8], params: &Params) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);
    absorb_params(&mut hasher, params);
    hasher.update(accumulator);

    let mut digest = vec![0u8; params.digest_length as usize];
    hasher.finalize_xof().fill(&mut digest);
    digest
}
