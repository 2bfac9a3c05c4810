//! Contains the declaration of [`OffsetsBuilder`]

use arrow_buffer::OffsetBuffer;

use crate::error::{CatchmentError, Result};

/// A wrapper type of [`Vec<i32>`] representing the invariants of Arrow's offsets.
/// It is guaranteed to (sound to assume that):
/// * every element is `>= 0`
/// * element at position `i` is >= than element at position `i-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetsBuilder(Vec<i32>);

impl Default for OffsetsBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetsBuilder {
    /// Returns an empty [`OffsetsBuilder`] (i.e. with a single element, the zero)
    #[inline]
    pub fn new() -> Self {
        Self(vec![0])
    }

    /// Returns a new [`OffsetsBuilder`] with a capacity, allocating at least `capacity + 1`
    /// entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut offsets = Vec::with_capacity(capacity + 1);
        offsets.push(0);
        Self(offsets)
    }

    /// The number of slots these offsets describe.
    #[inline]
    pub fn len_proxy(&self) -> usize {
        self.0.len() - 1
    }

    /// Returns the last offset of this container.
    #[inline]
    pub fn last(&self) -> i32 {
        // The vector always holds the initial zero
        self.0[self.0.len() - 1]
    }

    /// Pushes a new slot of `length` elements.
    ///
    /// # Errors
    ///
    /// Errors iff the new last offset would not fit in an `i32`.
    #[inline]
    pub fn try_push_usize(&mut self, length: usize) -> Result<()> {
        let length = i32::try_from(length).map_err(|_| CatchmentError::Overflow)?;
        let new_last = self
            .last()
            .checked_add(length)
            .ok_or(CatchmentError::Overflow)?;
        self.0.push(new_last);
        Ok(())
    }

    /// Pushes a slot with zero elements, as used for null or empty entries.
    #[inline]
    pub fn extend_empty(&mut self) {
        let last = self.last();
        self.0.push(last);
    }

    pub fn finish(self) -> OffsetBuffer<i32> {
        // Offsets are monotonically increasing and start at zero by construction
        unsafe { OffsetBuffer::new_unchecked(self.0.into()) }
    }
}
