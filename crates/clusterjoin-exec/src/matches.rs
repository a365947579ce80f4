//! Match bitsets for outer joins that span several clusters.
//!
//! A row of the preserved side may only be null-filled once every cluster of
//! the other side has been probed. The executor records partners here and
//! emits the unmatched rows afterwards.

/// Growable bitset over 0-based row indices.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    words: Vec<u64>,
    len: usize,
}

impl MatchSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes held by the bitset (for budget accounting).
    pub fn heap_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }

    pub fn mark(&mut self, idx: usize) {
        if idx >= self.len {
            self.len = idx + 1;
            self.words.resize(self.len.div_ceil(64), 0);
        }
        self.words[idx / 64] |= 1 << (idx % 64);
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx < self.len && self.words[idx / 64] & (1 << (idx % 64)) != 0
    }

    /// Mark `offset + i` for every `i` with `flags[i]` set.
    pub fn mark_flags(&mut self, offset: usize, flags: &[bool]) {
        for (i, _) in flags.iter().enumerate().filter(|(_, &hit)| hit) {
            self.mark(offset + i);
        }
    }

    /// Local indices `0..n` whose global index `offset + i` is unmarked.
    pub fn unmatched(&self, offset: usize, n: usize) -> Vec<usize> {
        (0..n).filter(|&i| !self.contains(offset + i)).collect()
    }
}
