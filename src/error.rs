//! Error types returned by the allocator.

use thiserror::Error;

/// Errors the allocator can detect and report to its caller.
///
/// Misuse such as releasing a payload twice is not detected, see
/// [`crate::MemAlloc::release`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No free block can hold the requested payload.
    #[error("out of memory: requested {requested} bytes, largest free block is {largest_free} bytes")]
    OutOfMemory {
        /// Number of payload bytes requested.
        requested: usize,
        /// Payload size of the largest free block at the time of the request.
        largest_free: usize,
    },

    /// The arena can't host a single block header.
    #[error("arena of {capacity} bytes is too small, a block header alone takes {header} bytes")]
    ArenaTooSmall {
        /// Requested arena capacity.
        capacity: usize,
        /// Size of one block header.
        header: usize,
    },
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
