use std::ops::RangeInclusive;

/// Tracks the next block a polling loop has yet to process.
///
/// The cursor only moves forward after a range has been handled, so a
/// failed poll is retried on the next tick instead of skipping blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCursor {
    next: u64,
}

impl BlockCursor {
    /// Starts at `block`, inclusive.
    pub fn starting_at(block: u64) -> Self {
        Self { next: block }
    }

    /// Starts right after the current `head`, so only new blocks are seen.
    pub fn after(head: u64) -> Self {
        Self {
            next: head.saturating_add(1),
        }
    }

    pub fn next_block(&self) -> u64 {
        self.next
    }

    /// Blocks that are ready given the current `head`, capped at `max_span`
    /// blocks. `None` if nothing new has been produced.
    pub fn pending_range(&self, head: u64, max_span: u64) -> Option<RangeInclusive<u64>> {
        if head < self.next || max_span == 0 {
            return None;
        }
        let last = head.min(self.next.saturating_add(max_span - 1));
        Some(self.next..=last)
    }

    /// Marks every block up to and including `last` as processed.
    pub fn advance_past(&mut self, last: u64) {
        self.next = self.next.max(last.saturating_add(1));
    }
}
