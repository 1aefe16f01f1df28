use crate::{arena::{Arena, WORD}, utils::align};

/// Offset of the `size` field inside a header.
const SIZE_FIELD: usize = 0;
/// Offset of the `is_free` flag inside a header.
const FREE_FIELD: usize = WORD;
/// Offset of the `next` link inside a header. The one byte flag before it is
/// padded up to a full word.
const NEXT_FIELD: usize = align(FREE_FIELD + 1, WORD);

/// Encoded value of a `next` link that points nowhere.
const NO_NEXT: usize = usize::MAX;

/// Overhead of a block in bytes: every block carries one header in front of
/// its payload.
pub const HEADER_SIZE: usize = NEXT_FIELD + WORD;

/// This is the metadata of a block. The header is stored inside the arena, right
/// before the payload it governs:
///
/// ```text
/// +---------------------+ <------+  offset
/// |        size         |        |
/// +---------------------+        |
/// |   is_free (1b) + pad|        | -> Header (HEADER_SIZE bytes)
/// +---------------------+        |
/// |        next         |        |
/// +---------------------+ <------+  offset + HEADER_SIZE
/// |       Payload       |        |
/// |         ...         |        | -> `size` bytes handed to the user
/// |         ...         |        |
/// +---------------------+ <------+
/// ```
///
/// `next` is the arena offset of the following header, so the headers form a
/// singly linked list in address order. See [`crate::chain::Chain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    /// Usable payload size of the block (header excluded).
    pub size: usize,
    /// Flag to tell whether the block is free or not.
    pub is_free: bool,
    /// Offset of the next header in the arena.
    pub next: Option<usize>,
}

impl Header {
    /// Decodes the header stored at `at`.
    pub fn read(arena: &Arena, at: usize) -> Self {
        let next = match arena.read_word(at + NEXT_FIELD) {
            NO_NEXT => None,
            offset => Some(offset),
        };

        Self {
            size: arena.read_word(at + SIZE_FIELD),
            is_free: arena.read_byte(at + FREE_FIELD) != 0,
            next,
        }
    }

    /// Encodes this header at `at`.
    pub fn write(&self, arena: &mut Arena, at: usize) {
        arena.write_word(at + SIZE_FIELD, self.size);
        arena.write_byte(at + FREE_FIELD, self.is_free as u8);
        arena.write_word(at + NEXT_FIELD, self.next.unwrap_or(NO_NEXT));
    }

    /// Only flips the free flag of the header stored at `at`.
    pub fn set_free(arena: &mut Arena, at: usize, is_free: bool) {
        arena.write_byte(at + FREE_FIELD, is_free as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_takes_three_words() {
        assert_eq!(HEADER_SIZE, 3 * WORD);
    }

    #[test]
    fn header_roundtrips_through_the_arena() {
        let mut arena = Arena::with_capacity(256).unwrap();

        let last = Header { size: 100, is_free: true, next: None };
        let linked = Header { size: 7, is_free: false, next: Some(131) };

        last.write(&mut arena, 0);
        linked.write(&mut arena, 100);

        assert_eq!(Header::read(&arena, 0), last);
        assert_eq!(Header::read(&arena, 100), linked);
    }

    #[test]
    fn set_free_leaves_other_fields_alone() {
        let mut arena = Arena::with_capacity(128).unwrap();
        Header { size: 40, is_free: false, next: Some(64) }.write(&mut arena, 0);

        Header::set_free(&mut arena, 0, true);

        assert_eq!(
            Header::read(&arena, 0),
            Header { size: 40, is_free: true, next: Some(64) }
        );
    }
}
