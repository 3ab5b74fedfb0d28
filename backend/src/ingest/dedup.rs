use std::collections::HashSet;

/// Codes already accepted from the current file. Lives for one upload only.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self, code: &str) -> bool {
        self.seen.contains(code)
    }

    /// Returns `false` when the code was already present.
    pub fn add(&mut self, code: &str) -> bool {
        self.seen.insert(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_membership_case_sensitively() {
        let mut dedup = Deduplicator::new();
        assert!(!dedup.seen("abc"));
        assert!(dedup.add("abc"));
        assert!(dedup.seen("abc"));
        assert!(!dedup.seen("ABC"));
        assert!(!dedup.add("abc"));
        assert!(dedup.add("ABC"));
    }
}
