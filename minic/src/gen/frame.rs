use super::layout::word_align;

/// Stack slots below `$fp`. Slots are handed out downward and released
/// in LIFO order when a block exits, so sibling blocks share space.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    depth: usize,
    max: usize,
}

impl Frame {
    /// Reserve `size` bytes; returns the slot's offset from `$fp`.
    pub fn alloc(&mut self, size: usize) -> i32 {
        self.depth += word_align(size);
        self.max = self.max.max(self.depth);
        -(self.depth as i32)
    }

    pub fn mark(&self) -> usize {
        self.depth
    }

    pub fn release(&mut self, mark: usize) {
        self.depth = mark;
    }

    /// Bytes the prologue must reserve
    pub fn size(&self) -> usize {
        self.max
    }
}
