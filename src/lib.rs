//! # Ashmaize
//!
//! A memory-hard, deterministic hash for password hashing, key derivation
//! and proof-of-work style applications. The cost of a hash is dominated by
//! pseudorandom traffic over a large scratch buffer (the "maze"), which is
//! what makes cheap time–memory tradeoffs on GPUs and ASICs unattractive.
//!
//! ## Algorithm shape
//!
//! - The scratch buffer holds `memory_cost_blocks` blocks of 1 KiB,
//!   partitioned into `lanes` equal segments.
//! - A BLAKE3 XOF over the secret, salt and parameters seeds the first two
//!   blocks of every lane.
//! - `time_cost` passes rewrite every block from exactly two predecessors:
//!   the previous block in the lane and a pseudorandomly addressed earlier
//!   block (any lane). Block compression rotates between reduced-round AES,
//!   the SHA-256 compression function and a 7-round BLAKE3 compression.
//! - The last block of every lane is folded together and expanded to the
//!   requested digest length.
//!
//! Lanes run in parallel within a pass (feature `parallel`, on by default);
//! the output is identical either way. The scratch buffer is zeroized on
//! every exit path.
//!
//! ## Example
//!
//! ```rust
//! use ashmaize::{hash, Params};
//!
//! let params = Params {
//!     memory_cost_blocks: 256, // 256 KiB
//!     time_cost: 2,
//!     lanes: 1,
//!     digest_length: 32,
//! };
//!
//! let digest = hash(b"correct horse battery staple", b"per-user salt", &params)?;
//! assert_eq!(digest.len(), 32);
//! # Ok::<(), ashmaize::Error>(())
//! ```
//!
//! This is not a general-purpose hash: input is single-shot, there is no
//! streaming interface and no MAC semantics.

mod engine;
mod error;
mod maze;
mod memory;
mod params;
mod primitives;
mod seed;

pub use engine::{hash, hash_batch, Ashmaize};
pub use error::Error;
pub use params::{Params, BLOCK_SIZE, MAX_DIGEST_LEN};

#[cfg(test)]
mod tests;
