use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;

/// Token counter over the cl100k_base tokenizer, cached by content hash.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    /// Create a counter whose cache holds up to `cache_capacity` entries.
    pub fn new(cache_capacity: u64) -> Self {
        let bpe = tiktoken_rs::cl100k_base().expect("failed to load cl100k_base tokenizer");
        Self {
            bpe: Arc::new(bpe),
            cache: Cache::new(cache_capacity),
        }
    }

    /// Uncached count.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Count with blake3 content-hash caching.
    pub fn count_cached(&self, text: &str) -> usize {
        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        self.cache.get_with(hash, || self.count(text))
    }

    /// Longest prefix of `text` within `max_tokens`, cut on a token boundary.
    /// Returns `text` unchanged when it already fits.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }
        // A cut may split a multi-byte character, and a decoded prefix may
        // re-encode longer. Back off until both hold.
        let mut end = max_tokens;
        while end > 0 {
            if let Ok(prefix) = self.bpe.decode(tokens[..end].to_vec()) {
                if self.count(&prefix) <= max_tokens {
                    return prefix;
                }
            }
            end -= 1;
        }
        String::new()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(10_000)
    }
}
