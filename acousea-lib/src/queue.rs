use crate::constants::RECEIVE_QUEUE_CAPACITY;
use bytes::Bytes;
use std::collections::VecDeque;
use tracing::warn;

/// Bounded FIFO of raw inbound frames.
///
/// When full, pushing evicts the oldest frame. Eviction is backpressure, not an error.
#[derive(Debug, Clone)]
pub struct ReceiveQueue {
    frames: VecDeque<Bytes>,
    capacity: usize,
    dropped: u64,
}

impl Default for ReceiveQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveQueue {
    pub fn new() -> Self {
        Self::with_capacity(RECEIVE_QUEUE_CAPACITY)
    }

    /// A queue holding at most `capacity` frames (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Enqueue `frame`, returning the frame evicted to make room, if any.
    pub fn push(&mut self, frame: Bytes) -> Option<Bytes> {
        let evicted = if self.frames.len() >= self.capacity {
            self.dropped += 1;
            let oldest = self.frames.pop_front();
            warn!(
                capacity = self.capacity,
                dropped = self.dropped,
                "Receive queue full, dropping oldest frame"
            );
            oldest
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    pub fn pop(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }

    /// Remove and return every buffered frame, oldest first.
    pub fn take_all(&mut self) -> Vec<Bytes> {
        self.frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = ReceiveQueue::new();
        queue.push(Bytes::from_static(b"a"));
        queue.push(Bytes::from_static(b"b"));
        assert_eq!(queue.pop().unwrap(), Bytes::from_static(b"a"));
        assert_eq!(queue.pop().unwrap(), Bytes::from_static(b"b"));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut queue = ReceiveQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(Bytes::from_static(b"a"));
        assert_eq!(queue.push(Bytes::from_static(b"b")), Some(Bytes::from_static(b"a")));
        assert_eq!(queue.len(), 1);
    }
}
