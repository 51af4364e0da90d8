use heapless::Deque;

use crate::config::FIFO_DEPTH_RANGE;

/// Backing capacity equals the largest depth the IP can be configured for.
pub const MAX_FIFO_DEPTH: usize = FIFO_DEPTH_RANGE.1 as usize;

/// Model of the synchronous FIFO between the filter chain and the PCM port.
///
/// Overflow and underflow are informational and sticky: they latch until
/// `clear()` and never corrupt stored words. A push against a full FIFO drops
/// the incoming word, not the buffered ones.
pub struct SyncFifo {
    depth: usize,
    data: Deque<i64, MAX_FIFO_DEPTH>,
    overflow: bool,
    underflow: bool,
}

impl SyncFifo {
    pub fn new(depth: usize) -> Self {
        assert!(depth >= 1 && depth <= MAX_FIFO_DEPTH);
        Self {
            depth,
            data: Deque::new(),
            overflow: false,
            underflow: false,
        }
    }

    pub fn push(&mut self, word: i64) -> bool {
        if self.data.len() >= self.depth {
            self.overflow = true;
            return false;
        }
        // Cannot fail: depth <= backing capacity
        self.data.push_back(word).ok();
        true
    }

    pub fn pop(&mut self) -> Option<i64> {
        self.data.pop_front()
    }

    pub fn front(&self) -> Option<i64> {
        self.data.front().copied()
    }

    /// Record a read attempt against an empty FIFO.
    pub fn read_empty(&mut self) {
        self.underflow = true;
    }

    pub fn clear(&mut self) {
        while self.data.pop_front().is_some() {}
        self.overflow = false;
        self.underflow = false;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.depth
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }

    pub fn underflow(&self) -> bool {
        self.underflow
    }
}
