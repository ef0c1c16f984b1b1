//! Fixed-capacity rolling history addressed by recency.
//!
//! The backing store is allocated once and never grows. Inserting at the front
//! only moves the head index, so the oldest slot is recycled as the newest one.

use super::error::{IndexError, SpectrogramError};

/// Ring buffer that always holds exactly `capacity` elements.
///
/// Logical index 0 is the most recently inserted element and `capacity - 1` the
/// oldest.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    slots: Box<[T]>,
    /// Physical slot holding logical index 0
    head: usize,
}

impl<T> RollingBuffer<T> {
    /// Builds a full buffer from `values`, ordered newest first.
    ///
    /// # Errors
    /// - If `values` is empty
    pub fn from_newest_first(values: Vec<T>) -> Result<Self, SpectrogramError> {
        if values.is_empty() {
            return Err(SpectrogramError::ZeroCapacity);
        }
        Ok(Self {
            slots: values.into_boxed_slice(),
            head: 0,
        })
    }

    /// Builds a full buffer of `capacity` elements produced by `fill`, which is
    /// called with the logical index of each element.
    pub fn filled_with<F>(capacity: usize, fill: F) -> Result<Self, SpectrogramError>
    where
        F: FnMut(usize) -> T,
    {
        Self::from_newest_first((0..capacity).map(fill).collect())
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live elements. Always equal to the capacity.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    fn physical(&self, index: usize) -> usize {
        (self.head + index) % self.slots.len()
    }

    /// Returns the element at logical `index` (0 = newest).
    ///
    /// # Errors
    /// - If `index` is not in `[0, capacity)`
    pub fn get(&self, index: usize) -> Result<&T, IndexError> {
        if index >= self.capacity() {
            return Err(IndexError {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(&self.slots[self.physical(index)])
    }

    /// Evicts the oldest element and stores `value` as the newest.
    pub fn insert_front(&mut self, value: T) {
        *self.rotate_alignment() = value;
    }

    /// Moves the head back one slot without touching any data.
    ///
    /// The formerly oldest slot becomes logical index 0 and is returned so the
    /// caller can overwrite it in place. Its old contents are still there until
    /// the caller does so.
    pub fn rotate_alignment(&mut self) -> &mut T {
        let capacity = self.slots.len();
        self.head = (self.head + capacity - 1) % capacity;
        &mut self.slots[self.head]
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        (0..self.slots.len()).map(move |i| &self.slots[self.physical(i)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(buffer: &RollingBuffer<i32>) -> Vec<i32> {
        buffer.iter().copied().collect()
    }

    #[test]
    fn test_insert_front_evicts_oldest() {
        let mut buffer = RollingBuffer::filled_with(4, |_| 0).unwrap();
        for value in 1..=5 {
            buffer.insert_front(value);
        }
        assert_eq!(contents(&buffer), vec![5, 4, 3, 2]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_newest_is_always_index_zero() {
        for capacity in 1..=9 {
            let mut buffer = RollingBuffer::filled_with(capacity, |_| -1).unwrap();
            for value in 0..(capacity as i32 * 3 + 2) {
                buffer.insert_front(value);
                assert_eq!(*buffer.get(0).unwrap(), value);
                assert_eq!(buffer.len(), capacity);
            }
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let buffer = RollingBuffer::filled_with(3, |i| i as i32).unwrap();
        assert_eq!(
            buffer.get(3),
            Err(IndexError {
                index: 3,
                capacity: 3
            })
        );
        assert!(buffer.get(usize::MAX).is_err());
        assert_eq!(*buffer.get(2).unwrap(), 2);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = RollingBuffer::<u8>::filled_with(0, |_| 0);
        assert!(matches!(result, Err(SpectrogramError::ZeroCapacity)));
    }

    #[test]
    fn test_rotate_alignment_matches_insert_front() {
        let mut inserted = RollingBuffer::from_newest_first(vec![10, 20, 30]).unwrap();
        let mut rotated = inserted.clone();

        for value in [1, 2, 3, 4, 5, 6, 7] {
            inserted.insert_front(value);
            let slot = rotated.rotate_alignment();
            *slot = value;
            assert_eq!(contents(&inserted), contents(&rotated));
        }
    }

    #[test]
    fn test_rotate_alignment_exposes_oldest_slot() {
        let mut buffer = RollingBuffer::from_newest_first(vec![vec![3u8], vec![2], vec![1]]).unwrap();
        let slot = buffer.rotate_alignment();
        assert_eq!(slot, &vec![1u8]);
        slot[0] = 9;
        assert_eq!(buffer.get(0).unwrap(), &vec![9u8]);
        assert_eq!(buffer.get(2).unwrap(), &vec![2u8]);
    }
}
