//! Scratch buffer: one contiguous, block-addressable allocation.
//!
//! The buffer holds key-derived material for the whole computation, so it is
//! wiped with `zeroize` on every exit path. `wipe` is called explicitly at
//! the end of each hash invocation and `Drop` wipes again when the buffer is
//! released, so a panic or early return cannot leak contents through a
//! reusable engine.

use zeroize::Zeroize;

use crate::error::Error;
use crate::params::BLOCK_SIZE;

/// Exclusively owned scratch memory for one engine.
pub struct ScratchBuffer {
    bytes: Vec<u8>,
    block_count: usize,
}

impl ScratchBuffer {
    /// Reserve `block_count` blocks, surfacing exhaustion as
    /// `Error::Allocation` instead of aborting the process.
    pub fn allocate(block_count: usize) -> Result<Self, Error> {
        let len = block_count
            .checked_mul(BLOCK_SIZE)
            .ok_or(Error::Internal("scratch buffer size overflows usize"))?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len)?;
        bytes.resize(len, 0);
        Ok(Self { bytes, block_count })
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn block(&self, index: usize) -> &[u8] {
        &self.bytes[index * BLOCK_SIZE..(index + 1) * BLOCK_SIZE]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.bytes[index * BLOCK_SIZE..(index + 1) * BLOCK_SIZE]
    }

    /// Overwrite the entire buffer with zeros, keeping the allocation and
    /// its length intact so the engine can be reused. Zeroizing the `Vec`
    /// itself would truncate it to zero length.
    pub fn wipe(&mut self) {
        self.bytes.as_mut_slice().zeroize();
    }

    /// Raw shared view for the parallel segment fill.
    pub(crate) fn shared(&mut self) -> SharedBlocks {
        SharedBlocks {
            ptr: self.bytes.as_mut_ptr(),
            block_count: self.block_count,
        }
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        self.bytes.as_mut_slice().zeroize();
    }
}

/// Unsynchronized view of the scratch buffer handed to lane workers.
///
/// Soundness rests on the fill discipline, not on this type: during one
/// segment, a worker writes only blocks inside its own (lane, segment)
/// window, and every block it reads lies outside the windows any worker is
/// writing (see `maze`). Workers join at segment boundaries before the
/// windows move.
#[derive(Clone, Copy)]
pub(crate) struct SharedBlocks {
    ptr: *mut u8,
    block_count: usize,
}

unsafe impl Send for SharedBlocks {}
unsafe impl Sync for SharedBlocks {}

impl SharedBlocks {
    /// Read-only view of a block.
    ///
    /// # Safety
    /// `index` must be in bounds and the block must not be written by any
    /// worker for the lifetime of the returned slice.
    #[inline]
    pub unsafe fn block(&self, index: usize) -> &[u8] {
        debug_assert!(index < self.block_count);
        core::slice::from_raw_parts(self.ptr.add(index * BLOCK_SIZE), BLOCK_SIZE)
    }

    /// Overwrite a block.
    ///
    /// # Safety
    /// `index` must be in bounds and owned by the calling worker's current
    /// (lane, segment) window.
    #[inline]
    pub unsafe fn write_block(&self, index: usize, data: &[u8; BLOCK_SIZE]) {
        debug_assert!(index < self.block_count);
        core::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(index * BLOCK_SIZE), BLOCK_SIZE);
    }
}
