//! Bounded chunking of the combination stream.
//!
//! The full search space grows combinatorially with the matrix, so it is
//! never collected. [`Buffered`] pulls at most `capacity` items at a time
//! from the underlying iterator; only one chunk is resident at once.

/// Iterator adapter yielding `Vec`s of up to `capacity` items, in order.
pub struct Buffered<I: Iterator> {
    inner: I,
    capacity: usize,
}

impl<I: Iterator> Buffered<I> {
    /// A zero `capacity` is treated as 1.
    pub fn new(inner: I, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
        }
    }
}

impl<I: Iterator> Iterator for Buffered<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.capacity.min(1 << 16));
        chunk.extend(self.inner.by_ref().take(self.capacity));
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

/// Extension trait: `iter.buffered(len)`.
pub trait BufferedExt: Iterator + Sized {
    fn buffered(self, capacity: usize) -> Buffered<Self> {
        Buffered::new(self, capacity)
    }
}

impl<I: Iterator> BufferedExt for I {}

/// Size estimate for a buffered run, logged before dispatch so the user
/// can see how large the space is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferPlan {
    /// Total items, if it fits in a `u128`.
    pub total: Option<u128>,

    /// Items per chunk.
    pub buffer_len: usize,

    /// Number of chunks the run will take.
    pub chunks: Option<u128>,
}

impl BufferPlan {
    pub fn new(total: Option<u128>, buffer_len: usize) -> Self {
        let len = buffer_len.max(1) as u128;
        Self {
            total,
            buffer_len,
            chunks: total.map(|t| t.div_ceil(len)),
        }
    }

    /// Upper bound on combinations held in memory at once.
    pub fn peak_resident(&self) -> u128 {
        match self.total {
            Some(t) => t.min(self.buffer_len as u128),
            None => self.buffer_len as u128,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_chunk_sizes() {
        let chunks: Vec<Vec<u32>> = (0..10).buffered(4).collect();
        let expected = vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]];
        assert_eq!(chunks, expected);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let chunks: Vec<Vec<u32>> = (0..6).buffered(3).collect();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(std::iter::empty::<u8>().buffered(5).count(), 0);
    }

    #[test]
    fn test_pulls_lazily() {
        let pulled = Cell::new(0usize);
        let source = (0..1_000_000).inspect(|_| pulled.set(pulled.get() + 1));
        let mut chunks = source.buffered(8);
        let first = chunks.next().unwrap();
        assert_eq!(first.len(), 8);
        assert_eq!(pulled.get(), 8);
    }

    #[test]
    fn test_zero_capacity_yields_single_items() {
        let chunks: Vec<Vec<u32>> = (0..3).buffered(0).collect();
        assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_buffer_plan() {
        let plan = BufferPlan::new(Some(36), 10);
        assert_eq!(plan.chunks, Some(4));
        assert_eq!(plan.peak_resident(), 10);

        let small = BufferPlan::new(Some(3), 1000);
        assert_eq!(small.chunks, Some(1));
        assert_eq!(small.peak_resident(), 3);

        let huge = BufferPlan::new(None, 1000);
        assert_eq!(huge.chunks, None);
    }
}
