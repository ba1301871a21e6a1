//! Fixed-capacity block queue.
//!
//! A ring of pre-allocated [`MotionBlock`] slots shared between the planning
//! producer and the stepping consumer. The discipline is strict
//! single-producer/single-consumer: only the planner advances `head`, only
//! the pulse engine advances `tail`, and a slot is never mutated by both
//! sides. Ownership of a slot transfers to the engine at the `busy`
//! transition; the planner's recalculation passes skip busy blocks.

use super::block::MotionBlock;

/// Default number of slots in the block queue.
pub const BLOCK_QUEUE_SIZE: usize = 16;

/// Ring buffer of motion blocks.
///
/// One slot is always kept free, so a queue of `N` slots holds at most
/// `N - 1` planned blocks. `head == tail` means empty.
#[derive(Debug, Clone)]
pub struct BlockQueue<const N: usize = BLOCK_QUEUE_SIZE> {
    slots: [MotionBlock; N],
    /// Next free slot (write side).
    head: usize,
    /// Oldest unexecuted block (read side).
    tail: usize,
}

impl<const N: usize> BlockQueue<N> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            slots: [MotionBlock::EMPTY; N],
            head: 0,
            tail: 0,
        }
    }

    /// Maximum number of queued blocks.
    #[inline]
    pub const fn capacity() -> usize {
        N - 1
    }

    /// Number of queued (planned, not yet retired) blocks.
    #[inline]
    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    /// Whether the queue holds no blocks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Whether another block can be planned right now.
    #[inline]
    pub fn is_full(&self) -> bool {
        Self::next_index(self.head) == self.tail
    }

    /// Slot index following `index`, with wraparound.
    #[inline]
    pub fn next_index(index: usize) -> usize {
        (index + 1) % N
    }

    /// Slot index preceding `index`, with wraparound.
    #[inline]
    pub fn prev_index(index: usize) -> usize {
        (index + N - 1) % N
    }

    /// Write-side index: the slot the next planned block lands in.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Read-side index: the slot of the oldest unexecuted block.
    #[inline]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Read access to a slot, for inspection and tests.
    #[inline]
    pub fn block(&self, index: usize) -> &MotionBlock {
        &self.slots[index]
    }

    #[inline]
    pub(crate) fn block_mut(&mut self, index: usize) -> &mut MotionBlock {
        &mut self.slots[index]
    }

    /// Producer side: the slot the next block will be planned into, or
    /// `None` when the queue is full.
    pub(crate) fn free_slot(&mut self) -> Option<&mut MotionBlock> {
        if self.is_full() {
            None
        } else {
            let head = self.head;
            Some(&mut self.slots[head])
        }
    }

    /// Producer side: publish the block currently in the free slot.
    pub(crate) fn commit(&mut self) {
        debug_assert!(!self.is_full());
        self.head = Self::next_index(self.head);
    }

    /// Consumer side: take ownership of the oldest block.
    ///
    /// Marks the slot `busy` (freezing it against recalculation) and hands
    /// the engine its own copy. The slot is reclaimed by [`Self::retire`].
    pub fn activate(&mut self) -> Option<MotionBlock> {
        if self.is_empty() {
            return None;
        }
        let tail = self.tail;
        self.slots[tail].busy = true;
        Some(self.slots[tail])
    }

    /// Consumer side: reclaim the slot of the block activated last.
    pub fn retire(&mut self) {
        if self.is_empty() {
            return;
        }
        debug_assert!(self.slots[self.tail].busy);
        self.slots[self.tail] = MotionBlock::EMPTY;
        self.tail = Self::next_index(self.tail);
    }

    /// Discard every queued block, including a busy one. Used only by the
    /// abort path.
    pub fn flush(&mut self) {
        while self.tail != self.head {
            self.slots[self.tail] = MotionBlock::EMPTY;
            self.tail = Self::next_index(self.tail);
        }
    }
}

impl<const N: usize> Default for BlockQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
