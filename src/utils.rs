//! Helper functions that don't particularly belong to any concrete module of the allocator.


/// It aligns `to_be_aligned` using `aligment`, which must be a power of two.
///
/// This is used to lay out the fields of a block descriptor inside the arena so
/// that every header field starts on a word boundary relative to the header start.
pub const fn align(to_be_aligned: usize, aligment: usize) -> usize {
    (to_be_aligned + aligment - 1) & !(aligment - 1)
}
