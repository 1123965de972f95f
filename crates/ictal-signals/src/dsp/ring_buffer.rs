//! Fixed-capacity ring buffer
//!
//! Backing storage is allocated once; pushing past capacity overwrites the
//! oldest slot in O(1). Iteration is always chronological (oldest first).

use ndarray::Array1;

/// Fixed-capacity circular buffer with O(1) push/evict.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    /// Index of the oldest element once the buffer has wrapped
    head: usize,
    capacity: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` elements (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Append a value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.data.len() < self.capacity {
            self.data.push(value);
            None
        } else {
            let evicted = std::mem::replace(&mut self.data[self.head], value);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Element `index` positions after the oldest one.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.data.len() {
            return None;
        }
        Some(self.data[(self.head + index) % self.capacity])
    }

    /// Most recently pushed element.
    pub fn latest(&self) -> Option<T> {
        self.data.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// Chronological iterator (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.data.len()).map(move |i| self.data[(self.head + i) % self.capacity])
    }

    /// Copy out the contents in chronological order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.head = 0;
    }
}

impl RingBuffer<f32> {
    /// Mean of the stored values (0.0 when empty).
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Chronological contents as an ndarray vector.
    pub fn to_array(&self) -> Array1<f32> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity() {
        let mut buf = RingBuffer::new(4);
        assert!(buf.push(1.0f32).is_none());
        assert!(buf.push(2.0).is_none());
        assert_eq!(buf.len(), 2);
        assert!(!buf.is_full());
        assert_eq!(buf.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut buf = RingBuffer::new(3);
        for v in 1..=3 {
            buf.push(v);
        }
        assert!(buf.is_full());
        assert_eq!(buf.push(4), Some(1));
        assert_eq!(buf.push(5), Some(2));
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_vec(), vec![3, 4, 5]);
        assert_eq!(buf.latest(), Some(5));
        assert_eq!(buf.get(0), Some(3));
        assert_eq!(buf.get(3), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buf = RingBuffer::new(5);
        for i in 0..1000 {
            buf.push(i);
            assert!(buf.len() <= 5);
        }
        assert_eq!(buf.to_vec(), vec![995, 996, 997, 998, 999]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut buf = RingBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.push(7u8);
        buf.push(8u8);
        assert_eq!(buf.to_vec(), vec![8]);
    }

    #[test]
    fn test_mean_and_clear() {
        let mut buf = RingBuffer::new(4);
        assert_eq!(buf.mean(), 0.0);
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0] {
            buf.push(v);
        }
        assert!((buf.mean() - 3.5).abs() < 1e-6);
        assert_eq!(buf.to_array().len(), 4);

        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.latest().is_none());
        buf.push(9.0);
        assert_eq!(buf.to_vec(), vec![9.0]);
    }
}
