use std::{mem, ops::Range};

use crate::{block::HEADER_SIZE, error::{Error, Result}};

/// Size of a machine word. Every header field is stored as a native-endian word
/// (or a single byte for the free flag).
pub(crate) const WORD: usize = mem::size_of::<usize>();

/// Default capacity of the arena: 1 MiB.
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// The raw storage every block lives in.
///
/// The arena is nothing more than a fixed-size byte buffer. It knows nothing
/// about blocks: the [`crate::block::Header`] encoding and the [`crate::chain::Chain`]
/// are overlaid on top of it by writing words at given offsets.
///
/// ```text
/// offset 0                                                    capacity
/// +--------+---------+--------+---------+--------+------------------+
/// | Header | payload | Header | payload | Header |     payload      |
/// +--------+---------+--------+---------+--------+------------------+
/// ```
///
/// The buffer is allocated once when the arena is created and it is never
/// resized.
pub(crate) struct Arena {
    bytes: Box<[u8]>,
}

const _: () = assert!(DEFAULT_CAPACITY > HEADER_SIZE);

impl Default for Arena {
    fn default() -> Self {
        Self {
            bytes: vec![0u8; DEFAULT_CAPACITY].into_boxed_slice(),
        }
    }
}

impl Arena {
    /// Creates a zeroed arena of `capacity` bytes.
    ///
    /// The capacity needs to be able to host at least one block header plus
    /// a byte of payload, otherwise no chain can ever be built on top of it.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity <= HEADER_SIZE {
            return Err(Error::ArenaTooSmall {
                capacity,
                header: HEADER_SIZE,
            });
        }

        Ok(Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn read_word(&self, at: usize) -> usize {
        let mut word = [0u8; WORD];
        word.copy_from_slice(&self.bytes[at..at + WORD]);
        usize::from_ne_bytes(word)
    }

    pub(crate) fn write_word(&mut self, at: usize, value: usize) {
        self.bytes[at..at + WORD].copy_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub(crate) fn read_byte(&self, at: usize) -> u8 {
        self.bytes[at]
    }

    #[inline]
    pub(crate) fn write_byte(&mut self, at: usize, value: u8) {
        self.bytes[at] = value;
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.bytes[range]
    }

    pub(crate) fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.bytes[range]
    }
}
