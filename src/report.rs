//! Read-only reports built from a walk over the block chain.
//!
//! Neither report mutates the allocator. Both render the same text the heap
//! status and leak checks of a classic `malloc` tutorial print, through
//! [`std::fmt::Display`].

use std::fmt;

use crate::chain::BlockInfo;

/// State of a block as shown by a [`HeapDump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// The block can be handed out by the next allocation.
    Free,
    /// The block belongs to a caller until it is released.
    Allocated,
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Free => f.write_str("FREE"),
            BlockState::Allocated => f.write_str("ALLOCATED"),
        }
    }
}

/// One line of a [`HeapDump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary {
    /// Usable payload size of the block.
    pub size: usize,
    /// Whether the block is free or in use.
    pub state: BlockState,
}

impl From<BlockInfo> for BlockSummary {
    fn from(block: BlockInfo) -> Self {
        let state = if block.is_free { BlockState::Free } else { BlockState::Allocated };

        Self { size: block.size, state }
    }
}

/// Every block of the chain in address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeapDump {
    /// One entry per block, lowest address first.
    pub blocks: Vec<BlockSummary>,
}

impl HeapDump {
    pub(crate) fn collect(blocks: impl Iterator<Item = BlockInfo>) -> Self {
        Self { blocks: blocks.map(BlockSummary::from).collect() }
    }
}

impl fmt::Display for HeapDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Heap Status:")?;
        for block in &self.blocks {
            writeln!(f, "Block size: {} | {}", block.size, block.state)?;
        }
        Ok(())
    }
}

/// Sizes of the blocks still marked as used, in address order.
///
/// The allocator doesn't track who allocated a block, so a leak can only be
/// reported by its size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeakReport {
    /// Payload size of every block still in use, lowest address first.
    pub leaks: Vec<usize>,
}

impl LeakReport {
    pub(crate) fn collect(blocks: impl Iterator<Item = BlockInfo>) -> Self {
        let leaks = blocks
            .filter(|block| !block.is_free)
            .map(|block| block.size)
            .collect();

        Self { leaks }
    }

    /// Whether every block has been released.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaks.is_empty()
    }

    /// Total number of bytes still allocated.
    pub fn leaked_bytes(&self) -> usize {
        self.leaks.iter().sum()
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No memory leaks detected 🎉");
        }

        for size in &self.leaks {
            writeln!(f, "Memory leak detected: {size} bytes")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(offset: usize, size: usize, is_free: bool) -> BlockInfo {
        BlockInfo { offset, size, is_free }
    }

    #[test]
    fn heap_dump_text() {
        let dump = HeapDump::collect([block(0, 200, false), block(224, 1000, true)].into_iter());

        assert_eq!(
            dump.to_string(),
            "Heap Status:\nBlock size: 200 | ALLOCATED\nBlock size: 1000 | FREE\n"
        );
    }

    #[test]
    fn leak_report_only_lists_used_blocks() {
        let report = LeakReport::collect(
            [block(0, 64, true), block(88, 100, false), block(212, 8, false)].into_iter(),
        );

        assert_eq!(report.leaks, vec![100, 8]);
        assert_eq!(report.leaked_bytes(), 108);
        assert_eq!(
            report.to_string(),
            "Memory leak detected: 100 bytes\nMemory leak detected: 8 bytes\n"
        );
    }

    #[test]
    fn no_leaks() {
        let report = LeakReport::collect([block(0, 64, true)].into_iter());

        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No memory leaks detected 🎉\n");
    }
}
