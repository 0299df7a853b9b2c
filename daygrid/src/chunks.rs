use std::ops::Range;

/// The partition of an array's leading axis into contiguous chunks.
///
/// Chunks are contiguous, non-overlapping, and cover the full axis length.
/// The cumulative index is kept alongside the lengths so that the chunk
/// holding a particular axis index can be found without walking the plan.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunks {
    lengths: Vec<usize>,
    /// Cumulative end offset of each chunk.
    index: Vec<usize>,
}

impl Chunks {
    pub fn from_lengths(lengths: Vec<usize>) -> Self {
        let mut index = Vec::with_capacity(lengths.len());
        let mut count = 0;
        for length in &lengths {
            assert!(*length > 0, "chunk lengths must be nonzero");
            count += length;
            index.push(count);
        }

        Self { lengths, index }
    }

    /// A single chunk covering the whole axis.
    ///
    pub fn single(len: usize) -> Self {
        Self::from_lengths(vec![len])
    }

    /// Chunks of `size`, with a shorter final chunk when `size` does not
    /// divide `len`.
    ///
    pub fn even(len: usize, size: usize) -> Self {
        assert!(size > 0, "chunk size must be nonzero");
        if len <= size {
            return Self::single(len);
        }

        let mut lengths = vec![size; len / size];
        if len % size > 0 {
            lengths.push(len % size);
        }

        Self::from_lengths(lengths)
    }

    /// Number of chunks in the plan.
    ///
    pub fn count(&self) -> usize {
        self.lengths.len()
    }

    /// Total length of the partitioned axis.
    ///
    pub fn total(&self) -> usize {
        self.index.last().copied().unwrap_or(0)
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn length(&self, chunk: usize) -> usize {
        self.lengths[chunk]
    }

    /// Start offset of a chunk along the axis.
    ///
    pub fn offset(&self, chunk: usize) -> usize {
        self.index[chunk] - self.lengths[chunk]
    }

    /// The axis index range covered by a chunk.
    ///
    pub fn range(&self, chunk: usize) -> Range<usize> {
        self.offset(chunk)..self.index[chunk]
    }

    /// Find the chunk containing a particular axis index.
    ///
    pub fn find_chunk(&self, index: usize) -> usize {
        assert!(index < self.total(), "index {index} beyond axis");
        match self.index.binary_search(&index) {
            Ok(chunk) => chunk + 1,
            Err(chunk) => chunk,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count()).map(|chunk| self.range(chunk))
    }
}
