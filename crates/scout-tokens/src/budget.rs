use super::counter::TokenCounter;

/// Per-block and cumulative token limits for one delivery.
pub struct TokenBudget<'a> {
    counter: &'a TokenCounter,
    per_item: usize,
    total: usize,
}

impl<'a> TokenBudget<'a> {
    pub fn new(counter: &'a TokenCounter, per_item: usize, total: usize) -> Self {
        Self {
            counter,
            per_item,
            total,
        }
    }

    /// Tokens left from `total` after `used`.
    pub fn remaining(&self, used: usize) -> usize {
        self.total.saturating_sub(used)
    }

    /// The largest block that may be delivered given `used` tokens so far.
    pub fn allowance(&self, used: usize) -> usize {
        self.per_item.min(self.remaining(used))
    }

    /// Whether `text` fits both the per-item and cumulative limits.
    pub fn fits(&self, text: &str, used: usize) -> bool {
        self.counter.count_cached(text) <= self.allowance(used)
    }

    /// Truncate `text` to the current allowance.
    pub fn fit(&self, text: &str, used: usize) -> String {
        self.counter.truncate(text, self.allowance(used))
    }
}
