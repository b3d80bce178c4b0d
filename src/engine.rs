//! The mixing engine: seeds the scratch buffer, fills it over `time_cost`
//! passes and compresses the final state into the digest.
//!
//! A pass walks every lane in index order. Each pass is split into
//! `SYNC_POINTS` segments; within a segment the lanes run independently (in
//! parallel when the `parallel` feature is on) and join at the segment
//! boundary before anyone moves on. Predecessor selection (`maze`) only ever
//! points at data that is frozen for the duration of the segment, so the
//! workers need no per-block locking.

#[cfg(feature = "parallel")]
use rayon::scope;
use zeroize::Zeroize;

use crate::error::Error;
use crate::maze::{self, BlockPosition, Geometry};
use crate::memory::{ScratchBuffer, SharedBlocks};
use crate::params::{Params, BLOCK_SIZE, SEED_BLOCKS_PER_LANE, SYNC_POINTS};
use crate::primitives::compress_block;
use crate::seed;

/// Lifecycle of one hash invocation. `Failed` is terminal for the
/// invocation; a reused engine may start over from it because the buffer is
/// wiped on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Seeding,
    Filling { pass: u32 },
    Finalizing,
    Done,
    Failed,
}

impl EngineState {
    /// Move to `next`, rejecting any transition the state machine does not
    /// define. An illegal transition marks the engine failed.
    fn advance(&mut self, next: EngineState) -> Result<(), Error> {
        use EngineState::*;
        let legal = match (*self, next) {
            (Uninitialized, Seeding) | (Done, Seeding) | (Failed, Seeding) => true,
            (Seeding, Filling { pass }) => pass == 0,
            (Filling { pass }, Filling { pass: p }) => p == pass + 1,
            (Filling { .. }, Finalizing) => true,
            (Finalizing, Done) => true,
            _ => false,
        };
        if legal {
            *self = next;
            Ok(())
        } else {
            *self = Failed;
            Err(Error::Internal("illegal engine state transition"))
        }
    }
}

/// Reusable hashing engine.
///
/// Owns the scratch buffer for its parameters, so repeated calls avoid
/// re-allocating what can be a very large region. The buffer is wiped at the
/// end of every call regardless of outcome; nothing derived from one secret
/// is reachable while hashing the next.
pub struct Ashmaize {
    params: Params,
    geometry: Geometry,
    memory: ScratchBuffer,
    state: EngineState,
}

impl Ashmaize {
    /// Validate `params` and reserve the scratch buffer.
    pub fn new(params: Params) -> Result<Self, Error> {
        params.validate()?;
        let geometry = Geometry::from_params(&params);
        let memory = ScratchBuffer::allocate(params.memory_cost_blocks as usize)?;
        Ok(Self {
            params,
            geometry,
            memory,
            state: EngineState::Uninitialized,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Compute the digest of `secret` under `salt`.
    ///
    /// Returns exactly `params.digest_length` bytes, or an error with no
    /// partial output. The scratch buffer is wiped before this returns, on
    /// success and on failure alike.
    pub fn hash(&mut self, secret: &[u8], salt: &[u8]) -> Result<Vec<u8>, Error> {
        let result = self.run(secret, salt);
        self.memory.wipe();
        if result.is_err() {
            self.state = EngineState::Failed;
        }
        result
    }

    fn run(&mut self, secret: &[u8], salt: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_geometry()?;
        self.state.advance(EngineState::Seeding)?;
        self.seed_lanes(secret, salt);

        for pass in 0..self.params.time_cost {
            self.state.advance(EngineState::Filling { pass })?;
            self.fill_pass(pass);
        }

        self.state.advance(EngineState::Finalizing)?;
        let digest = self.finalize_digest();
        self.state.advance(EngineState::Done)?;

        debug_assert_eq!(digest.len(), self.params.digest_length as usize);
        Ok(digest)
    }

    /// Defensive consistency check between parameters, geometry and the
    /// allocation. Unreachable in correct builds.
    fn check_geometry(&self) -> Result<(), Error> {
        let geo = &self.geometry;
        if geo.lane_length != geo.segment_length * SYNC_POINTS
            || geo.block_count != geo.lanes * geo.lane_length
            || self.memory.block_count() != geo.block_count as usize
        {
            return Err(Error::Internal("geometry does not match allocation"));
        }
        Ok(())
    }

    /// Write the first two blocks of every lane straight from the expanded
    /// seed stream.
    fn seed_lanes(&mut self, secret: &[u8], salt: &[u8]) {
        let mut stream = seed::expand_seed(secret, salt, &self.params);
        for lane in 0..self.geometry.lanes {
            for b in 0..SEED_BLOCKS_PER_LANE {
                let src = (lane * SEED_BLOCKS_PER_LANE + b) as usize * BLOCK_SIZE;
                let index = self.geometry.global(lane, b);
                self.memory
                    .block_mut(index)
                    .copy_from_slice(&stream[src..src + BLOCK_SIZE]);
            }
        }
        // Secret-derived material; the copies in the buffer are wiped by
        // `hash`, so clear this one too.
        stream.zeroize();
    }

    #[cfg(feature = "parallel")]
    fn fill_pass(&mut self, pass: u32) {
        let geo = self.geometry;
        let shared = self.memory.shared();
        for segment in 0..SYNC_POINTS {
            if geo.lanes > 1 {
                // Fork-join per segment: the scope is the barrier.
                scope(|s| {
                    for lane in 0..geo.lanes {
                        s.spawn(move |_| fill_segment(shared, geo, pass, lane, segment));
                    }
                });
            } else {
                fill_segment(shared, geo, pass, 0, segment);
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn fill_pass(&mut self, pass: u32) {
        let geo = self.geometry;
        let shared = self.memory.shared();
        for segment in 0..SYNC_POINTS {
            for lane in 0..geo.lanes {
                fill_segment(shared, geo, pass, lane, segment);
            }
        }
    }

    /// XOR the last block of every lane into one accumulator and expand it
    /// to the requested digest length.
    fn finalize_digest(&self) -> Vec<u8> {
        let geo = &self.geometry;
        let mut accumulator = [0u8; BLOCK_SIZE];
        for lane in 0..geo.lanes {
            let last = self.memory.block(geo.global(lane, geo.lane_length - 1));
            for (acc, b) in accumulator.iter_mut().zip(last) {
                *acc ^= b;
            }
        }
        let digest = seed::expand_digest(&accumulator, &self.params);
        accumulator.zeroize();
        digest
    }

    #[cfg(test)]
    pub(crate) fn memory_bytes(&self) -> &[u8] {
        self.memory.as_bytes()
    }
}

/// Fill one (lane, segment) window of one pass.
///
/// Reads and writes go through the shared view; the predecessor mapping in
/// `maze` guarantees reads never touch a block any lane writes during this
/// segment, and writes stay inside this window.
fn fill_segment(mem: SharedBlocks, geo: Geometry, pass: u32, lane: u32, segment: u32) {
    let seg_start = segment * geo.segment_length;
    let seg_end = seg_start + geo.segment_length;
    // Pass 0 starts after the seeded blocks.
    let first = if pass == 0 {
        seg_start.max(SEED_BLOCKS_PER_LANE)
    } else {
        seg_start
    };

    let mut block = [0u8; BLOCK_SIZE];
    for local in first..seg_end {
        let pos = BlockPosition { pass, lane, local };
        let index = geo.global(lane, local);

        let p1 = maze::sequential_predecessor(&geo, &pos);
        let pred1 = unsafe { mem.block(p1) };

        let raw = maze::extract_raw(pred1, geo.position_counter(pass, lane, local));
        let p2 = maze::random_predecessor(&geo, &pos, raw);
        let pred2 = unsafe { mem.block(p2) };

        compress_block(pred1, pred2, pass, lane, index as u64, &mut block);
        unsafe { mem.write_block(index, &block) };
    }
}

/// Single-shot hash: validate, allocate, fill, finalize, wipe.
///
/// This is the primitive's entry point. For many hashes under the same
/// parameters, prefer [`Ashmaize`] or [`hash_batch`] to reuse the scratch
/// buffer.
pub fn hash(secret: &[u8], salt: &[u8], params: &Params) -> Result<Vec<u8>, Error> {
    let mut engine = Ashmaize::new(*params)?;
    engine.hash(secret, salt)
}

/// Hash several secrets under one salt and parameter set, reusing a single
/// scratch buffer across the batch.
pub fn hash_batch(secrets: &[&[u8]], salt: &[u8], params: &Params) -> Result<Vec<Vec<u8>>, Error> {
    let mut engine = Ashmaize::new(*params)?;
    secrets
        .iter()
        .map(|secret| engine.hash(secret, salt))
        .collect()
}
