//! # arenalloc - a first-fit / best-fit allocator over a private arena
//!
//! [`MemAlloc`] hands out regions of a single fixed-size byte buffer (the arena)
//! without ever asking the platform allocator for more memory. Every region is
//! preceded by a small header and all headers form a chain in address order
//! that covers the whole arena:
//!
//! ```text
//! +--------+---------+--------+---------+--------+----------------------+
//! | Header |  used   | Header |  used   | Header |         free         |
//! +--------+---------+--------+---------+--------+----------------------+
//!  ^                                                                    ^
//!  0                                                             capacity
//! ```
//!
//! * Allocation searches the chain with a [`Strategy`], splits the chosen
//!   block when the leftover is big enough to be a block on its own and marks
//!   it as used.
//! * Release marks the block as free and immediately merges every run of
//!   adjacent free blocks.
//! * [`MemAlloc::dump`] and [`MemAlloc::scan_leaks`] walk the chain without
//!   touching it.
//!
//! ```rust
//! use arenalloc::{MemAlloc, Strategy};
//!
//! let mut heap = MemAlloc::new();
//!
//! let a = heap.allocate(200, Strategy::FirstFit).unwrap();
//! heap.payload_mut(&a).fill(0xAB);
//!
//! let b = heap.allocate(300, Strategy::BestFit).unwrap();
//! heap.release(a);
//!
//! assert_eq!(heap.scan_leaks().leaks, vec![300]);
//! # heap.release(b);
//! ```
//!
//! The allocator is single-threaded: every operation takes `&mut self` and runs
//! to completion.

mod arena;
mod block;
mod chain;
mod error;
mod report;
mod strategy;
mod utils;

use tracing::{debug, trace, warn};

use crate::{arena::Arena, block::Header, chain::Chain};

pub use crate::{
    arena::DEFAULT_CAPACITY,
    block::HEADER_SIZE,
    chain::{BlockInfo, Blocks},
    error::{Error, Result},
    report::{BlockState, BlockSummary, HeapDump, LeakReport},
    strategy::Strategy,
};

/// Handle to an allocated region of the arena.
///
/// It can only be obtained from [`MemAlloc::allocate`] and it is consumed by
/// [`MemAlloc::release`], so whoever holds it owns the region.
#[derive(Debug, PartialEq, Eq)]
pub struct Payload {
    offset: usize,
}

impl Payload {
    /// Arena offset of the first byte of the region.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the header that governs this region.
    #[inline]
    fn header(&self) -> usize {
        self.offset - HEADER_SIZE
    }
}

/// The allocator: an arena plus the chain of blocks laid over it.
///
/// The chain is not built until the first call to [`MemAlloc::allocate`].
/// Until then the arena is just zeroed bytes and the diagnostics report no
/// blocks at all.
pub struct MemAlloc {
    arena: Arena,
    chain: Option<Chain>,
}

impl Default for MemAlloc {
    fn default() -> Self {
        Self::new()
    }
}

impl MemAlloc {
    /// Creates an allocator over an arena of [`DEFAULT_CAPACITY`] bytes.
    pub fn new() -> Self {
        Self {
            arena: Arena::default(),
            chain: None,
        }
    }

    /// Creates an allocator over an arena of `capacity` bytes.
    ///
    /// Fails with [`Error::ArenaTooSmall`] if the arena can't hold a header
    /// and at least one byte of payload.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let arena = Arena::with_capacity(capacity)?;

        Ok(Self { arena, chain: None })
    }

    /// Total size of the arena in bytes, headers included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Allocates `size` bytes using `strategy` to pick the block.
    ///
    /// A request of zero bytes is served like any other one. The contents of
    /// the returned region are whatever was left there before.
    ///
    /// On failure nothing is modified and [`Error::OutOfMemory`] is returned.
    /// There is no retry with the other strategy.
    pub fn allocate(&mut self, size: usize, strategy: Strategy) -> Result<Payload> {
        let chain = self.chain.get_or_insert_with(|| Chain::init(&mut self.arena));

        let Some(block) = strategy.find(chain.iter(&self.arena), size) else {
            let largest_free = largest_free(chain.iter(&self.arena));
            warn!(size, ?strategy, largest_free, "allocation failed");

            return Err(Error::OutOfMemory { requested: size, largest_free });
        };

        trace!(size, ?strategy, offset = block.offset, candidate = block.size, "block selected");

        chain.split(&mut self.arena, block.offset, size);
        Header::set_free(&mut self.arena, block.offset, false);

        Ok(Payload { offset: block.payload_offset() })
    }

    /// Returns the region behind `payload` to the allocator and merges every
    /// run of adjacent free blocks.
    ///
    /// Passing `None` does nothing.
    ///
    /// A handle that belongs to a different allocator is not detected: its
    /// offset is trusted and the chain of this allocator gets corrupted.
    pub fn release(&mut self, payload: impl Into<Option<Payload>>) {
        let Some(payload) = payload.into() else {
            return;
        };
        // Nothing was handed out yet.
        let Some(chain) = &self.chain else {
            return;
        };

        let at = payload.header();
        Header::set_free(&mut self.arena, at, true);

        let merges = chain.coalesce(&mut self.arena);

        debug!(offset = at, merges, "block released");
    }

    /// The region behind `payload`. Its length is the size of the block, which
    /// may be larger than what was requested if the block wasn't split.
    pub fn payload(&self, payload: &Payload) -> &[u8] {
        let size = Header::read(&self.arena, payload.header()).size;

        self.arena.slice(payload.offset..payload.offset + size)
    }

    /// Mutable access to the region behind `payload`, see [`MemAlloc::payload`].
    pub fn payload_mut(&mut self, payload: &Payload) -> &mut [u8] {
        let size = Header::read(&self.arena, payload.header()).size;

        self.arena.slice_mut(payload.offset..payload.offset + size)
    }

    /// Iterates through every block of the chain in address order.
    pub fn blocks(&self) -> Blocks<'_> {
        match &self.chain {
            Some(chain) => chain.iter(&self.arena),
            None => Blocks::empty(&self.arena),
        }
    }

    /// Size and state of every block, in address order.
    pub fn dump(&self) -> HeapDump {
        HeapDump::collect(self.blocks())
    }

    /// Sizes of every block still in use, in address order.
    pub fn scan_leaks(&self) -> LeakReport {
        LeakReport::collect(self.blocks())
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }

    /// Sum of the payload sizes of all free blocks.
    pub fn free_bytes(&self) -> usize {
        self.blocks().filter(|block| block.is_free).map(|block| block.size).sum()
    }

    /// Payload size of the largest free block.
    pub fn largest_free(&self) -> usize {
        largest_free(self.blocks())
    }
}

fn largest_free(blocks: impl Iterator<Item = BlockInfo>) -> usize {
    blocks
        .filter(|block| block.is_free)
        .map(|block| block.size)
        .max()
        .unwrap_or(0)
}
