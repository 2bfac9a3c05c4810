use arrow_buffer::NullBuffer;

/// Row access shared by geometry arrays.
pub trait GeometryArrayTrait<'a> {
    type Scalar;

    /// Access the value at slot `i` as an Arrow scalar, not considering validity.
    fn value(&'a self, i: usize) -> Self::Scalar;

    /// Access the value at slot `i` as an Arrow scalar, considering validity.
    fn get(&'a self, i: usize) -> Option<Self::Scalar> {
        if self.is_null(i) {
            return None;
        }

        Some(self.value(i))
    }

    /// Returns the number of geometries in this array
    fn len(&self) -> usize;

    /// Returns true if the array is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access the array's null buffer.
    fn nulls(&self) -> Option<&NullBuffer>;

    /// Returns whether slot `i` is null.
    ///
    /// # Panic
    ///
    /// Panics iff `i >= self.len()`.
    #[inline]
    fn is_null(&self, i: usize) -> bool {
        self.nulls().map(|x| x.is_null(i)).unwrap_or(false)
    }

    /// Iterates over this array's scalar values, considering validity.
    fn iter(&'a self) -> impl ExactSizeIterator<Item = Option<Self::Scalar>> + 'a
    where
        Self: Sized + 'a,
    {
        (0..self.len()).map(move |i| self.get(i))
    }
}
