use crate::chain::BlockInfo;

/// Policy used to pick the free block an allocation is carved from.
///
/// Both strategies only look at free blocks whose payload can hold the request.
///
/// ```text
///  request: 40 bytes
///
///  +----------+  +----------+  +----------+  +----------+
///  | free 100 |->| used  30 |->| free  45 |->| free  45 |
///  +----------+  +----------+  +----------+  +----------+
///       ^                           ^
///   FirstFit                     BestFit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// The first block on the chain, in address order, that is big enough.
    /// Cheap search, no attempt at a tight fit.
    #[default]
    FirstFit,
    /// The smallest block that is big enough. Always walks the whole chain.
    /// Among blocks of the same size the one with the lowest address wins.
    BestFit,
}

impl Strategy {
    /// Returns the block where `size` bytes should be allocated, or `None` if
    /// there is no free block that can fit them.
    pub fn find<I>(self, blocks: I, size: usize) -> Option<BlockInfo>
    where
        I: IntoIterator<Item = BlockInfo>,
    {
        let mut candidates = blocks
            .into_iter()
            .filter(|block| block.is_free && block.size >= size);

        match self {
            Strategy::FirstFit => candidates.next(),
            Strategy::BestFit => candidates.fold(None, |best, block| match best {
                Some(best) if best.size <= block.size => Some(best),
                _ => Some(block),
            }),
        }
    }
}
