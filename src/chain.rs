use std::iter::FusedIterator;

use tracing::debug;

use crate::{arena::Arena, block::{HEADER_SIZE, Header}};

/// Read-only view of a single block in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Arena offset of the block header.
    pub offset: usize,
    /// Usable payload size of the block.
    pub size: usize,
    /// Flag to tell whether the block is free or not.
    pub is_free: bool,
}

impl BlockInfo {
    /// Arena offset of the first payload byte.
    #[inline]
    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }
}

/// The address-ordered list of blocks that tiles the arena.
///
/// The chain doesn't own any memory of its own. All its nodes are [`Header`]s
/// written inside the arena and linked through their `next` offsets:
///
/// ```text
/// +------------------------------------------------------------------+
/// | +-------+         +-------+         +-------+                    |
/// | | Block | ------> | Block | ------> | Block | ------> None       |
/// | +-------+         +-------+         +-------+                    |
/// +------------------------------------------------------------------+
///   offset 0                                                capacity
/// ```
///
/// Every byte of the arena belongs to exactly one block (header + payload), so
/// the sum of `HEADER_SIZE + size` over the chain is always the arena capacity.
pub(crate) struct Chain {
    head: usize,
}

impl Chain {
    /// Builds a chain made of a single free block spanning the whole arena.
    pub fn init(arena: &mut Arena) -> Self {
        let size = arena.capacity() - HEADER_SIZE;

        Header { size, is_free: true, next: None }.write(arena, 0);

        debug!(capacity = arena.capacity(), size, "block chain initialized");

        Self { head: 0 }
    }

    /// Iterates through every block in address order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> Blocks<'a> {
        Blocks { arena, current: Some(self.head) }
    }

    /// Carves a block of exactly `size` bytes out of the block at `at`.
    ///
    /// The split only happens when the remainder can host a header plus at least
    /// one byte of payload, otherwise the whole block is left untouched and the
    /// caller gets it oversized.
    ///
    /// ```text
    /// Before:
    /// +--------+-------------------------------------------------+
    /// | Header |                 block.size                      |
    /// +--------+-------------------------------------------------+
    ///
    /// After:
    /// +--------+----------+--------+-----------------------------+
    /// | Header |   size   | Header | block.size - size - HEADER  |
    /// +--------+----------+--------+-----------------------------+
    /// ```
    ///
    /// Returns whether the block was split.
    pub fn split(&self, arena: &mut Arena, at: usize, size: usize) -> bool {
        let mut block = Header::read(arena, at);

        if block.size <= size + HEADER_SIZE {
            return false;
        }

        let remainder_at = at + HEADER_SIZE + size;
        let remainder = Header {
            size: block.size - size - HEADER_SIZE,
            is_free: true,
            next: block.next,
        };
        remainder.write(arena, remainder_at);

        block.size = size;
        block.next = Some(remainder_at);
        block.write(arena, at);

        debug!(offset = at, size, remainder_at, remainder = remainder.size, "block split");

        true
    }

    /// Merges every run of adjacent free blocks in a single pass.
    ///
    /// After a merge the same block is checked again against its new successor,
    /// so a run of any length collapses into its first block before the scan
    /// moves on.
    ///
    /// Returns the number of headers that were absorbed.
    pub fn coalesce(&self, arena: &mut Arena) -> usize {
        let mut merges = 0;
        let mut current_at = self.head;
        let mut current = Header::read(arena, current_at);

        while let Some(next_at) = current.next {
            let next = Header::read(arena, next_at);

            if current.is_free && next.is_free {
                current.size += HEADER_SIZE + next.size;
                current.next = next.next;
                current.write(arena, current_at);
                merges += 1;

                debug!(
                    offset = current_at,
                    absorbed = next_at,
                    size = current.size,
                    "free blocks merged"
                );
            } else {
                current_at = next_at;
                current = next;
            }
        }

        merges
    }
}

/// Iterator over the blocks of a [`Chain`], see [`Chain::iter`].
pub struct Blocks<'a> {
    arena: &'a Arena,
    current: Option<usize>,
}

impl<'a> Blocks<'a> {
    /// An iterator that yields nothing, for arenas without a chain yet.
    pub(crate) fn empty(arena: &'a Arena) -> Self {
        Self { arena, current: None }
    }
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.current?;
        let header = Header::read(self.arena, offset);
        self.current = header.next;

        Some(BlockInfo {
            offset,
            size: header.size,
            is_free: header.is_free,
        })
    }
}

impl FusedIterator for Blocks<'_> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a chain over an arena whose blocks have the given `(size, is_free)`
    /// layout. The sizes must tile `capacity` exactly.
    pub(crate) fn build(capacity: usize, layout: &[(usize, bool)]) -> (Arena, Chain) {
        let mut arena = Arena::with_capacity(capacity).unwrap();
        let mut at = 0;

        for (i, &(size, is_free)) in layout.iter().enumerate() {
            let next_at = at + HEADER_SIZE + size;
            let next = (i + 1 < layout.len()).then_some(next_at);
            Header { size, is_free, next }.write(&mut arena, at);
            at = next_at;
        }

        assert_eq!(at, capacity, "layout must tile the arena");

        (arena, Chain { head: 0 })
    }

    fn layout(chain: &Chain, arena: &Arena) -> Vec<(usize, bool)> {
        chain.iter(arena).map(|b| (b.size, b.is_free)).collect()
    }

    #[test]
    fn init_spans_the_whole_arena() {
        let mut arena = Arena::with_capacity(1024).unwrap();
        let chain = Chain::init(&mut arena);

        let blocks: Vec<_> = chain.iter(&arena).collect();

        assert_eq!(
            blocks,
            vec![BlockInfo { offset: 0, size: 1024 - HEADER_SIZE, is_free: true }]
        );
        assert_eq!(blocks[0].payload_offset(), HEADER_SIZE);
    }

    #[test]
    fn split_carves_exact_block_and_free_remainder() {
        let mut arena = Arena::with_capacity(1024).unwrap();
        let chain = Chain::init(&mut arena);

        assert!(chain.split(&mut arena, 0, 100));

        let blocks: Vec<_> = chain.iter(&arena).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].size, 100);
        assert_eq!(blocks[1].offset, HEADER_SIZE + 100);
        assert_eq!(blocks[1].size, 1024 - 100 - 2 * HEADER_SIZE);
        assert!(blocks[1].is_free);
    }

    #[test]
    fn split_keeps_the_old_successor() {
        let (mut arena, chain) = build(400, &[(200, true), (400 - 200 - 2 * HEADER_SIZE, false)]);

        assert!(chain.split(&mut arena, 0, 50));

        assert_eq!(
            layout(&chain, &arena),
            vec![(50, true), (200 - 50 - HEADER_SIZE, true), (400 - 200 - 2 * HEADER_SIZE, false)]
        );
    }

    #[test]
    fn split_needs_more_than_a_header_of_remainder() {
        let size = 100;

        // Remainder exactly one header: it would leave a zero sized block.
        let (mut arena, chain) = build(size + 2 * HEADER_SIZE, &[(size + HEADER_SIZE, true)]);
        assert!(!chain.split(&mut arena, 0, size));
        assert_eq!(layout(&chain, &arena), vec![(size + HEADER_SIZE, true)]);

        // One byte more and the split is worth it.
        let (mut arena, chain) =
            build(size + 2 * HEADER_SIZE + 1, &[(size + HEADER_SIZE + 1, true)]);
        assert!(chain.split(&mut arena, 0, size));
        assert_eq!(layout(&chain, &arena), vec![(size, true), (1, true)]);
    }

    #[test]
    fn exact_fit_never_splits() {
        let (mut arena, chain) = build(100 + HEADER_SIZE, &[(100, true)]);

        assert!(!chain.split(&mut arena, 0, 100));
        assert_eq!(layout(&chain, &arena), vec![(100, true)]);
    }

    #[test]
    fn coalesce_collapses_runs_in_one_pass() {
        let h = HEADER_SIZE;
        let (mut arena, chain) = build(
            6 * h + 100,
            &[(10, false), (10, true), (10, true), (10, true), (10, false), (50, true)],
        );

        let merges = chain.coalesce(&mut arena);

        assert_eq!(merges, 2);
        assert_eq!(
            layout(&chain, &arena),
            vec![(10, false), (30 + 2 * h, true), (10, false), (50, true)]
        );
    }

    #[test]
    fn coalesce_merges_everything_when_all_free() {
        let h = HEADER_SIZE;
        let (mut arena, chain) =
            build(4 * h + 40, &[(10, true), (10, true), (10, true), (10, true)]);

        assert_eq!(chain.coalesce(&mut arena), 3);
        assert_eq!(layout(&chain, &arena), vec![(40 + 3 * h, true)]);
    }

    #[test]
    fn coalesce_is_idempotent() {
        let h = HEADER_SIZE;
        let (mut arena, chain) = build(
            6 * h + 60,
            &[(10, true), (10, true), (10, false), (10, true), (10, false), (10, true)],
        );

        chain.coalesce(&mut arena);
        let once = layout(&chain, &arena);

        assert_eq!(chain.coalesce(&mut arena), 0);
        assert_eq!(layout(&chain, &arena), once);
    }
}
