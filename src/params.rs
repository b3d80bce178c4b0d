//! Cost parameters and fixed algorithm geometry.
//!
//! The tunable costs (`Params`) are chosen by the caller and validated before
//! any memory is touched. The fixed constants below define the shape of the
//! maze and are baked into the digest: changing any of them changes every
//! output.

use crate::error::Error;

/// Width of one scratch-buffer block in bytes (1 KiB)
pub const BLOCK_SIZE: usize = 1024;

/// Width of one compression chunk in bytes
pub const CHUNK_SIZE: usize = 64;

/// Chunks per block
pub const CHUNKS_PER_BLOCK: usize = BLOCK_SIZE / CHUNK_SIZE;

/// Width of the chaining state in bytes
pub const STATE_SIZE: usize = 32;

/// Synchronization segments per pass. Lanes only join up at segment
/// boundaries, so cross-lane references are restricted to data outside the
/// segment currently being written.
pub const SYNC_POINTS: u32 = 4;

/// Blocks of every lane filled directly from the expanded seed
pub const SEED_BLOCKS_PER_LANE: u32 = 2;

/// Minimum blocks per lane. Keeps at least two blocks in every segment and
/// comfortably exceeds the two seed blocks.
pub const MIN_BLOCKS_PER_LANE: u32 = 8;

/// Maximum digest length in bytes: counter-expansion limit for the 32-byte
/// compression width.
pub const MAX_DIGEST_LEN: u32 = 255 * STATE_SIZE as u32;

/// Algorithm version, bound into the seed
pub const VERSION: u8 = 1;

/// Cost parameters for one hash invocation.
///
/// Immutable once validated. All four values are mixed into the seed stream,
/// so two invocations with different parameters never share intermediate
/// state, let alone a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Total scratch-buffer size, counted in 1 KiB blocks
    pub memory_cost_blocks: u32,
    /// Number of passes over the whole buffer
    pub time_cost: u32,
    /// Independent segments processed in parallel within a pass
    pub lanes: u32,
    /// Requested digest length in bytes
    pub digest_length: u32,
}

impl Params {
    /// Interactive-use preset: 64 MiB, 3 passes, 4 lanes, 32-byte digest.
    pub fn recommended() -> Self {
        Self {
            memory_cost_blocks: 64 * 1024,
            time_cost: 3,
            lanes: 4,
            digest_length: 32,
        }
    }

    /// Check every constraint. Called before any allocation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.lanes == 0 {
            return Err(Error::InvalidParameter {
                field: "lanes",
                reason: "must be at least 1",
            });
        }
        if self.time_cost == 0 {
            return Err(Error::InvalidParameter {
                field: "time_cost",
                reason: "must be at least 1",
            });
        }
        if self.digest_length == 0 {
            return Err(Error::InvalidParameter {
                field: "digest_length",
                reason: "must be at least 1 byte",
            });
        }
        if self.digest_length > MAX_DIGEST_LEN {
            return Err(Error::InvalidParameter {
                field: "digest_length",
                reason: "exceeds the maximum of 8160 bytes",
            });
        }
        let min_blocks = self
            .lanes
            .checked_mul(MIN_BLOCKS_PER_LANE)
            .ok_or(Error::InvalidParameter {
                field: "lanes",
                reason: "lane count overflows the block count",
            })?;
        if self.memory_cost_blocks < min_blocks {
            return Err(Error::InvalidParameter {
                field: "memory_cost_blocks",
                reason: "fewer than 8 blocks per lane",
            });
        }
        // Each lane must divide evenly into sync segments. Rounding down
        // silently would change the effective cost after the parameters were
        // already bound into the seed, so reject instead.
        if self.memory_cost_blocks % (self.lanes * SYNC_POINTS) != 0 {
            return Err(Error::InvalidParameter {
                field: "memory_cost_blocks",
                reason: "must be a multiple of lanes * 4",
            });
        }
        Ok(())
    }

    /// Blocks per lane. Only meaningful after `validate`.
    pub fn lane_length(&self) -> u32 {
        self.memory_cost_blocks / self.lanes
    }
}
