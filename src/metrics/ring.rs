use std::collections::VecDeque;

/// Fixed-capacity history; pushing onto a full buffer evicts the oldest value.
#[derive(Clone, Debug)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_evicts_oldest() {
        let n = 5;
        let mut ring = RingBuffer::new(n);
        for i in 1..=n + 1 {
            ring.push(i);
        }
        assert_eq!(ring.len(), n);
        assert_eq!(ring.to_vec(), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn zero_capacity_still_holds_latest() {
        let mut ring = RingBuffer::new(0);
        ring.push(1.0);
        ring.push(2.0);
        assert_eq!(ring.to_vec(), vec![2.0]);
    }
}
