//! Error taxonomy for the hashing primitive.

use std::collections::TryReserveError;
use thiserror::Error;

/// Failure modes of a hash invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// A cost parameter violates its constraint. Raised before any
    /// allocation; fixing the named field makes the call succeed.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },

    /// The scratch buffer could not be reserved at the requested size.
    /// Raised before any computation begins.
    #[error("scratch buffer allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// An invariant that should hold in any correct build was violated.
    /// Fatal to the current call; the scratch buffer is still wiped.
    #[error("internal fault: {0}")]
    Internal(&'static str),
}
