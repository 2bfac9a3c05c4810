use arrow_array::OffsetSizeTrait;
use arrow_buffer::OffsetBuffer;

use crate::error::{CatchmentError, Result};

pub(crate) fn offsets_buffer_i64_to_i32(offsets: &OffsetBuffer<i64>) -> Result<OffsetBuffer<i32>> {
    i32::try_from(*offsets.last()).map_err(|_| CatchmentError::Overflow)?;

    let i32_offsets = offsets.iter().map(|x| *x as i32).collect::<Vec<_>>();
    Ok(unsafe { OffsetBuffer::new_unchecked(i32_offsets.into()) })
}

/// Offset helpers for walking nested list layouts
pub(crate) trait OffsetBufferUtils<O: OffsetSizeTrait> {
    /// Returns the length an array with these offsets would be.
    fn len_proxy(&self) -> usize;

    /// Returns a range (start, end) corresponding to the position `index`
    ///
    /// # Panic
    ///
    /// Panics iff `index >= self.len_proxy()`
    fn start_end(&self, index: usize) -> (usize, usize);

    /// Returns the last offset.
    fn last(&self) -> &O;
}

impl<O: OffsetSizeTrait> OffsetBufferUtils<O> for OffsetBuffer<O> {
    #[inline]
    fn len_proxy(&self) -> usize {
        self.len() - 1
    }

    #[inline]
    fn start_end(&self, index: usize) -> (usize, usize) {
        assert!(index < self.len_proxy());
        let start = self[index].as_usize();
        let end = self[index + 1].as_usize();
        (start, end)
    }

    #[inline]
    fn last(&self) -> &O {
        // An OffsetBuffer always holds at least one offset
        &self[self.len() - 1]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn i64_offsets_narrow_to_i32() {
        let offsets = OffsetBuffer::<i64>::new(vec![0, 3, 3, 7].into());
        let narrowed = offsets_buffer_i64_to_i32(&offsets).unwrap();
        assert_eq!(narrowed.as_ref(), &[0, 3, 3, 7]);
    }

    #[test]
    fn i64_offsets_past_i32_overflow() {
        let offsets = OffsetBuffer::<i64>::new(vec![0, i32::MAX as i64 + 1].into());
        assert!(matches!(
            offsets_buffer_i64_to_i32(&offsets),
            Err(CatchmentError::Overflow)
        ));
    }
}
