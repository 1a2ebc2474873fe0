use super::state::TokenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NgramBlocker {
    size: usize,
}

impl NgramBlocker {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn is_enabled(&self) -> bool {
        self.size >= 2
    }

    /// True when the last `size - 1` tokens of `history` followed by
    /// `candidate` already appear as a contiguous run in `history`.
    pub fn is_blocked(&self, history: &[TokenId], candidate: TokenId) -> bool {
        let n = self.size;
        if !self.is_enabled() || history.len() < n - 1 {
            return false;
        }
        let prefix = &history[history.len() - (n - 1)..];
        history
            .windows(n)
            .any(|window| window[n - 1] == candidate && window[..n - 1] == *prefix)
    }
}
