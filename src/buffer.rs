//! # Bounded message buffer.
//!
//! Fixed-capacity FIFO decoupling arrival from batch draining.
//!
//! - [`MessageBuffer::offer`] never blocks; a full buffer hands the item back.
//! - [`MessageBuffer::drain_all`] is exclusive: concurrent drains serialize, so
//!   no element is processed twice.
//!
//! ```rust
//! use subvisor::MessageBuffer;
//!
//! let buf = MessageBuffer::with_capacity(2);
//! assert!(buf.offer(1).is_ok());
//! assert!(buf.offer(2).is_ok());
//! assert_eq!(buf.offer(3), Err(3));
//!
//! let mut seen = Vec::new();
//! assert_eq!(buf.drain_all(|m| seen.push(m)), 2);
//! assert_eq!(seen, vec![1, 2]);
//! assert!(buf.is_empty());
//! ```

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Default capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Fixed-capacity concurrent FIFO.
pub struct MessageBuffer<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
    drain: Mutex<()>,
}

impl<T> Default for MessageBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

impl<T> MessageBuffer<T> {
    /// Creates a buffer holding at most `capacity` items (clamped to at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            drain: Mutex::new(()),
        }
    }

    /// Enqueues `item`, or returns it when the buffer is full.
    pub fn offer(&self, item: T) -> Result<(), T> {
        let mut q = self.queue.lock();
        if q.len() >= self.capacity {
            return Err(item);
        }
        q.push_back(item);
        Ok(())
    }

    /// Pops and applies `consume` to every queued item in FIFO order until the
    /// buffer is empty. Returns the number of items consumed.
    ///
    /// Items offered while the drain runs are consumed by the same drain. The
    /// queue lock is released around each `consume` call.
    pub fn drain_all<F>(&self, mut consume: F) -> usize
    where
        F: FnMut(T),
    {
        let _exclusive = self.drain.lock();
        let mut n = 0;
        loop {
            let next = self.queue.lock().pop_front();
            match next {
                Some(item) => {
                    consume(item);
                    n += 1;
                }
                None => return n,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
